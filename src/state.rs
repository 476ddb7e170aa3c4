//! # Device State
//!
//! Process-wide state that the protocol core mutates and external
//! collaborators (LED scripts, wake word engine, watchdogs) read.
//!
//! ## Ownership:
//! The control loop is the single logical thread that touches this state,
//! so it is held by value inside [`crate::endpoint::Endpoint`] instead of
//! behind `Arc<RwLock<_>>`. Anything that needs to read it does so through
//! the endpoint between ticks.
//!
//! ## Contents:
//! - **DeviceState**: wake word, sensitivity, voice assistant phase
//! - **Liveness**: when the host was last heard from
//! - **LinkMetrics**: counters for diagnostics

use crate::config::DeviceConfig;
use tracing::debug;

/// Voice assistant phases as the LED scripts number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Idle,
    Waiting,
    Listening,
    Thinking,
    Replying,
    Error,
}

impl VoicePhase {
    /// Map a wire name to a phase. Unknown names fall back to idle.
    pub fn from_name(name: &str) -> Self {
        match name {
            "idle" => VoicePhase::Idle,
            "waiting" => VoicePhase::Waiting,
            "listening" => VoicePhase::Listening,
            "thinking" => VoicePhase::Thinking,
            "replying" => VoicePhase::Replying,
            "error" => VoicePhase::Error,
            _ => VoicePhase::Idle,
        }
    }

    /// Numeric code reported in `voice_assistant_phase`.
    pub fn code(self) -> i32 {
        match self {
            VoicePhase::Idle => 1,
            VoicePhase::Waiting => 2,
            VoicePhase::Listening => 3,
            VoicePhase::Thinking => 4,
            VoicePhase::Replying => 5,
            VoicePhase::Error => 11,
        }
    }
}

/// Configuration the host can change at runtime.
///
/// The phase is kept as a raw code because external automation may set
/// codes that have no name on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub wake_word: String,
    pub sensitivity: String,
    pub voice_phase: i32,
}

impl DeviceState {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            wake_word: config.wake_word.clone(),
            sensitivity: config.sensitivity.clone(),
            voice_phase: VoicePhase::Idle.code(),
        }
    }
}

/// Tracks when the host last sent a recognized message.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    last_message_ms: Option<u64>,
}

impl Liveness {
    pub fn touch(&mut self, now_ms: u64) {
        self.last_message_ms = Some(now_ms);
    }

    /// Forget the host, so the watchdog sees it as gone right away.
    pub fn expire(&mut self) {
        debug!("Host liveness expired");
        self.last_message_ms = None;
    }

    pub fn last_message_ms(&self) -> Option<u64> {
        self.last_message_ms
    }

    pub fn is_alive(&self, now_ms: u64, timeout_ms: u64) -> bool {
        match self.last_message_ms {
            Some(at) => now_ms.saturating_sub(at) < timeout_ms,
            None => false,
        }
    }
}

/// Counters kept since boot.
///
/// ## Why these metrics matter:
/// - **lines_received / lines_unknown**: is the host speaking our protocol?
/// - **audio_bytes_dropped**: is the host sending clips larger than the stream buffer?
/// - **flushes / flushes_abandoned**: is the speaker keeping up?
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMetrics {
    pub lines_received: u64,
    pub lines_unknown: u64,
    pub audio_bytes_dropped: u64,
    pub flushes: u64,
    pub flushes_abandoned: u64,
    pub write_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_phase_names() {
        assert_eq!(VoicePhase::from_name("listening").code(), 3);
        assert_eq!(VoicePhase::from_name("error").code(), 11);
        assert_eq!(VoicePhase::from_name("bogus").code(), 1);
        assert_eq!(VoicePhase::from_name("Listening").code(), 1);
    }

    #[test]
    fn test_device_defaults() {
        let state = DeviceState::new(&AppConfig::default().device);
        assert_eq!(state.wake_word, "Okay Nabu");
        assert_eq!(state.sensitivity, "Moderately sensitive");
        assert_eq!(state.voice_phase, 1);
    }

    #[test]
    fn test_liveness_window() {
        let mut liveness = Liveness::default();
        assert!(!liveness.is_alive(0, 1000));
        liveness.touch(100);
        assert!(liveness.is_alive(1099, 1000));
        assert!(!liveness.is_alive(1100, 1000));
        liveness.expire();
        assert!(!liveness.is_alive(100, 1000));
    }
}
