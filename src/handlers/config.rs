use crate::control::ControlEvent;
use crate::endpoint::Endpoint;
use crate::protocol::fields::{Field, Message};
use crate::protocol::response::OutboundMessage;
use crate::state::VoicePhase;
use tracing::info;

impl Endpoint {
    /// Apply whichever settings a `config` message carries. Missing or
    /// malformed fields leave the current value alone. Always acknowledged.
    pub(crate) fn handle_config(&mut self, message: Message<'_>) {
        if message.flag("unmute") {
            info!("Host requested unmute");
            self.outbox.push(ControlEvent::Unmute);
        }

        if let Field::Present(volume) = message.float("volume") {
            info!("Host requested volume {:.2}", volume);
            self.outbox.push(ControlEvent::SetVolume(volume as f32));
        }

        if let Field::Present(wake_word) = message.string("wake_word") {
            info!("Wake word set to {}", wake_word);
            self.device.wake_word = wake_word.to_string();
        }

        if let Field::Present(sensitivity) = message.string("sensitivity") {
            info!("Wake word sensitivity set to {}", sensitivity);
            self.device.sensitivity = sensitivity.to_string();
        }

        if let Field::Present(phase) = message.string("voice_phase") {
            let code = VoicePhase::from_name(phase).code();
            info!("Voice phase {} ({})", phase, code);
            self.device.voice_phase = code;
        }

        self.send_simple(|timestamp| OutboundMessage::ConfigReceived { timestamp });
    }
}

#[cfg(test)]
mod tests {
    use crate::control::{ControlEvent, DEFAULT_REQUESTED_VOLUME};
    use crate::testing::Harness;

    #[test]
    fn test_config_is_always_acknowledged() {
        let mut h = Harness::new();
        assert_eq!(h.send(r#"{"type":"config"}"#), vec!["config_received"]);
        assert!(h.endpoint.drain_control_events().is_empty());
        assert_eq!(h.endpoint.current_wake_word(), "Okay Nabu");
    }

    #[test]
    fn test_unmute_is_consumed_once() {
        let mut h = Harness::new();
        h.send(r#"{"type":"config","unmute":true}"#);
        assert!(h.endpoint.take_unmute_request());
        assert!(!h.endpoint.take_unmute_request());
    }

    #[test]
    fn test_unmute_false_is_ignored() {
        let mut h = Harness::new();
        h.send(r#"{"type":"config","unmute":false}"#);
        assert!(!h.endpoint.take_unmute_request());
    }

    #[test]
    fn test_volume_request() {
        let mut h = Harness::new();
        assert_eq!(h.endpoint.requested_volume(), DEFAULT_REQUESTED_VOLUME);
        h.send(r#"{"type":"config","volume":0.4}"#);
        assert!(h.endpoint.take_volume_change_request());
        assert!(!h.endpoint.take_volume_change_request());
        assert_eq!(h.endpoint.requested_volume(), 0.4);
    }

    #[test]
    fn test_malformed_volume_is_skipped() {
        let mut h = Harness::new();
        assert_eq!(h.send(r#"{"type":"config","volume":loud}"#), vec!["config_received"]);
        assert!(!h.endpoint.take_volume_change_request());
        assert_eq!(h.endpoint.requested_volume(), DEFAULT_REQUESTED_VOLUME);
    }

    #[test]
    fn test_wake_word_and_sensitivity() {
        let mut h = Harness::new();
        h.send(r#"{"type":"config","wake_word":"Hey Jarvis","sensitivity":"Slightly sensitive"}"#);
        assert_eq!(h.endpoint.current_wake_word(), "Hey Jarvis");
        assert_eq!(h.endpoint.current_sensitivity(), "Slightly sensitive");
    }

    #[test]
    fn test_voice_phase_names() {
        let mut h = Harness::new();
        h.send(r#"{"type":"config","voice_phase":"listening"}"#);
        assert_eq!(h.endpoint.current_voice_phase(), 3);
        h.send(r#"{"type":"config","voice_phase":"bogus"}"#);
        assert_eq!(h.endpoint.current_voice_phase(), 1);
    }

    #[test]
    fn test_combined_config_raises_each_event_once() {
        let mut h = Harness::new();
        h.send(r#"{"type":"config","unmute":true,"volume":0.5}"#);
        h.send(r#"{"type":"config","unmute":true,"volume":0.6}"#);
        assert_eq!(
            h.endpoint.drain_control_events(),
            vec![ControlEvent::Unmute, ControlEvent::SetVolume(0.6)]
        );
    }
}
