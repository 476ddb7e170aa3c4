//! # Line Protocol
//!
//! Newline-delimited, JSON-shaped messages exchanged with the host over the
//! serial link.
//!
//! ## Key Components:
//! - **Framer**: bytes → lines, bounded at 512 bytes
//! - **Fields**: tolerant anchor-based field lookup for inbound lines
//! - **MessageKind**: first-match classification on the `type` discriminator
//! - **Response**: outbound JSON encoding

pub mod fields;     // Anchor-based field extraction
pub mod framer;     // Byte-to-line accumulation
pub mod response;   // Outbound message encoding

use tracing::info;

/// Recognized inbound message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Heartbeat,
    GetStatus,
    GetWakeWordOptions,
    Config,
    Disconnect,
    PlayTone,
    PlayAudioCompressed,
    PlayAudio,
    PlayAudioChunk,
    StartAudioStream,
    AudioDataChunk,
    FinishAudioStream,
}

/// Discriminator patterns in evaluation order. The first match wins, so this
/// order also decides malformed lines that carry more than one `type`.
const DISCRIMINATORS: &[(&str, MessageKind)] = &[
    ("\"type\":\"heartbeat\"", MessageKind::Heartbeat),
    ("\"type\":\"get_status\"", MessageKind::GetStatus),
    ("\"type\":\"get_wake_word_options\"", MessageKind::GetWakeWordOptions),
    ("\"type\":\"config\"", MessageKind::Config),
    ("\"type\":\"disconnect\"", MessageKind::Disconnect),
    ("\"type\":\"play_tone\"", MessageKind::PlayTone),
    ("\"type\":\"play_audio_compressed\"", MessageKind::PlayAudioCompressed),
    ("\"type\":\"play_audio\"", MessageKind::PlayAudio),
    ("\"type\":\"play_audio_chunk\"", MessageKind::PlayAudioChunk),
    ("\"type\":\"start_audio_stream\"", MessageKind::StartAudioStream),
    ("\"type\":\"audio_data_chunk\"", MessageKind::AudioDataChunk),
    ("\"type\":\"finish_audio_stream\"", MessageKind::FinishAudioStream),
];

impl MessageKind {
    /// Classify a line by substring search. Unknown types are not errors.
    pub fn classify(line: &str) -> Option<MessageKind> {
        let kind = DISCRIMINATORS
            .iter()
            .find(|(pattern, _)| line.contains(pattern))
            .map(|&(_, kind)| kind);

        if kind.is_none() {
            info!("Unknown message type: {}", line);
        }
        kind
    }
}
