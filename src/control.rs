//! # Control Outbox
//!
//! One-shot requests from the protocol core to external automation
//! (unmute, volume change, tone playback, "audio is ready").
//!
//! ## Semantics:
//! Each kind behaves like a flag: it is either pending or not. Raising a
//! kind that is already pending does not queue a second copy; a newer
//! volume replaces the pending one. Taking a kind clears it, so each raise
//! is observed exactly once by a single consumer.

use std::collections::VecDeque;
use tracing::debug;

/// Default requested volume before the host sends one.
pub const DEFAULT_REQUESTED_VOLUME: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Unmute,
    SetVolume(f32),
    PlayTone,
    AudioReady,
}

impl ControlEvent {
    fn same_kind(&self, other: &ControlEvent) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug)]
pub struct ControlOutbox {
    pending: VecDeque<ControlEvent>,
    requested_volume: f32,
}

impl Default for ControlOutbox {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            requested_volume: DEFAULT_REQUESTED_VOLUME,
        }
    }
}

impl ControlOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an event.
    pub fn push(&mut self, event: ControlEvent) {
        if let ControlEvent::SetVolume(volume) = event {
            self.requested_volume = volume;
        }

        match self.pending.iter_mut().find(|pending| pending.same_kind(&event)) {
            Some(pending) => *pending = event,
            None => self.pending.push_back(event),
        }
        debug!("Control event raised: {:?}", event);
    }

    /// Remove a pending event of the same kind as `probe`, if any.
    fn take_kind(&mut self, probe: ControlEvent) -> bool {
        match self.pending.iter().position(|pending| pending.same_kind(&probe)) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn take_unmute_request(&mut self) -> bool {
        self.take_kind(ControlEvent::Unmute)
    }

    pub fn take_volume_change_request(&mut self) -> bool {
        self.take_kind(ControlEvent::SetVolume(0.0))
    }

    pub fn take_tone_playback_request(&mut self) -> bool {
        self.take_kind(ControlEvent::PlayTone)
    }

    pub fn take_audio_ready(&mut self) -> bool {
        self.take_kind(ControlEvent::AudioReady)
    }

    /// Last volume the host asked for. Survives consumption of the request.
    pub fn requested_volume(&self) -> f32 {
        self.requested_volume
    }

    /// Every pending event in the order first raised.
    pub fn drain(&mut self) -> Vec<ControlEvent> {
        self.pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
