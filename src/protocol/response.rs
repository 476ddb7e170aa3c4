//! # Outbound Messages
//!
//! Everything the device sends to the host. Each variant serializes to one
//! JSON object with `type` first and a `timestamp` (milliseconds since boot).
//!
//! ## Message Format:
//! ```json
//! {"type":"heartbeat_ack","timestamp":1234}
//! ```

use serde::Serialize;

/// Fixed fields of the status snapshot that this component does not own.
pub const STATUS_LED_BRIGHTNESS: f64 = 0.66;
pub const STATUS_VOLUME: f64 = 0.7;

/// Device → host messages.
///
/// ## Rust Concepts:
/// - **#[serde(tag = "type")]**: the variant name becomes the `type` field
/// - **rename_all = "snake_case"**: `HeartbeatAck` is sent as `heartbeat_ack`
/// - **Lifetimes**: status borrows the wake word strings instead of cloning them
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage<'a> {
    BootComplete { timestamp: u64 },
    HeartbeatAck { timestamp: u64 },
    ConfigReceived { timestamp: u64 },
    AudioPlayed { timestamp: u64 },
    BatchReceived { timestamp: u64 },
    AudioStreamComplete { timestamp: u64 },
    Status(StatusSnapshot<'a>),
    WakeWordOptions {
        options: &'a [String],
        timestamp: u64,
    },
}

/// Body of the `status` message.
///
/// Field order is the wire order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusSnapshot<'a> {
    pub timestamp: u64,
    pub wake_word_active: bool,
    pub microphone_muted: bool,
    pub voice_assistant_phase: i32,
    pub voice_assistant_running: bool,
    pub timer_active: bool,
    pub timer_ringing: bool,
    pub led_brightness: f64,
    pub volume: f64,
    pub wake_word: &'a str,
    pub wake_word_sensitivity: &'a str,
    pub wifi_connected: bool,
    pub api_connected: bool,
}

impl<'a> StatusSnapshot<'a> {
    pub fn new(timestamp: u64, voice_phase: i32, wake_word: &'a str, sensitivity: &'a str) -> Self {
        Self {
            timestamp,
            wake_word_active: false,
            microphone_muted: false,
            voice_assistant_phase: voice_phase,
            voice_assistant_running: true,
            timer_active: false,
            timer_ringing: false,
            led_brightness: STATUS_LED_BRIGHTNESS,
            volume: STATUS_VOLUME,
            wake_word,
            wake_word_sensitivity: sensitivity,
            wifi_connected: false,
            api_connected: false,
        }
    }
}

impl OutboundMessage<'_> {
    /// Encode as a single JSON line (without the trailing newline).
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
