//! # USB Voice Link
//!
//! Device-side endpoint of a USB serial link to a voice assistant host.
//! The host sends newline-delimited JSON-shaped control and audio messages;
//! the endpoint answers with status and acknowledgements, plays received
//! PCM on a speaker, and raises one-shot control events for the automation
//! running around it.
//!
//! ## Module Map:
//! - **endpoint**: the control loop and its public accessors
//! - **handlers**: per-message handling
//! - **protocol**: framing, classification, field extraction, outbound encoding
//! - **audio**: PCM, stream buffer, chunk reassembly, speaker and microphone seams
//! - **control**: one-shot events for external automation
//! - **scheduler**: boot re-announce, stale line and status timers
//! - **state**: device settings, host liveness, counters
//! - **transport** / **clock**: I/O and time seams
//! - **config** / **error**: ambient configuration and error types

pub mod audio;
pub mod clock;
pub mod config;
pub mod control;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod scheduler;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use endpoint::Endpoint;
