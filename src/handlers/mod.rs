//! Per-message handlers. Each is an `impl Endpoint` block so handlers reach
//! the endpoint's buffers directly; [`crate::endpoint::Endpoint::dispatch`]
//! picks which one runs.

pub mod audio;
pub mod config;
