//! # Audio Module
//!
//! Everything between protocol messages and the speaker, plus the ring
//! the capture path fills for downstream consumers.
//!
//! ## Key Components:
//! - **PCM**: sample clamping and 16-bit little-endian encoding
//! - **Stream buffer**: bounded accumulation of one clip, flushed to the speaker
//! - **Reassembly**: out-of-order indexed chunks back into order
//! - **Sink**: the speaker seam
//! - **Injection**: recent microphone samples, shared with a capture thread
//!
//! ## Audio Format:
//! - **Sample Rate**: 16kHz
//! - **Bit Depth**: 16-bit PCM, little-endian
//! - **Channels**: Mono

pub mod injection;   // Injected microphone ring
pub mod pcm;         // Sample encoding and tone synthesis
pub mod reassembly;  // Indexed chunk reassembly
pub mod sink;        // Playback sink trait and file sink
pub mod stream;      // Stream buffer and paced flush
