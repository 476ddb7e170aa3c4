//! # Audio Injection Buffer
//!
//! A short window of freshly captured microphone samples, pushed by an
//! external capture path and read back by whoever needs "the latest audio".
//!
//! ## Key Features:
//! - **Bounded**: never holds more than `capacity` samples (100 ms at 16 kHz by default)
//! - **Block eviction**: overflow drops the oldest samples in whole blocks
//!   (10 ms by default) instead of one sample at a time
//! - **Recency**: data counts as recent for a short window after the last injection
//! - **Thread safety**: the handle is `Clone`; producer and consumer may live on
//!   different threads, and each operation holds the lock for its whole update
//!
//! The microphone itself is not driven from here. [`MicrophoneCapture`] only
//! tracks whether capture was requested; reading samples directly from a
//! microphone is not supported and always yields nothing.

use crate::clock::Clock;
use crate::config::AudioConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

struct InjectionState {
    samples: VecDeque<i16>,
    last_injection_ms: Option<u64>,
}

/// Shared handle to the injection ring.
#[derive(Clone)]
pub struct InjectionBuffer {
    state: Arc<Mutex<InjectionState>>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    eviction_block: usize,
    recency_ms: u64,
}

impl InjectionBuffer {
    pub fn new(config: &AudioConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = config.injection_capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(InjectionState {
                samples: VecDeque::with_capacity(capacity),
                last_injection_ms: None,
            })),
            clock,
            capacity,
            eviction_block: config.injection_eviction_block.clamp(1, capacity),
            recency_ms: config.injection_recency_ms,
        }
    }

    fn lock(&self) -> MutexGuard<'_, InjectionState> {
        // A panicking producer cannot leave the ring half-updated in a way that
        // breaks the size bound, so the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().samples.is_empty()
    }

    /// Append freshly captured samples, evicting the oldest blocks as needed.
    ///
    /// ## Overflow:
    /// While the new samples do not fit, drop `eviction_block` samples (or
    /// whatever is left) from the front. A single injection larger than the
    /// whole ring keeps only its newest `capacity` samples.
    pub fn inject(&self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }

        let incoming = if samples.len() > self.capacity {
            warn!(
                "Injected {} samples exceeds capacity {}, keeping the newest",
                samples.len(),
                self.capacity
            );
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        let mut state = self.lock();
        while state.samples.len() + incoming.len() > self.capacity {
            let evict = self.eviction_block.min(state.samples.len());
            state.samples.drain(..evict);
        }
        state.samples.extend(incoming.iter().copied());
        state.last_injection_ms = Some(self.clock.now_ms());

        debug!(
            "Injected {} audio samples, buffer size: {}",
            incoming.len(),
            state.samples.len()
        );
    }

    /// True if the ring holds samples injected within the recency window.
    pub fn has_recent_audio_data(&self) -> bool {
        let state = self.lock();
        match state.last_injection_ms {
            Some(at) if !state.samples.is_empty() => {
                self.clock.now_ms().saturating_sub(at) < self.recency_ms
            }
            _ => false,
        }
    }

    /// The newest `min(samples_needed, len)` samples, right-aligned in a
    /// zero-filled vector of length `samples_needed`.
    pub fn latest(&self, samples_needed: usize) -> Vec<i16> {
        let mut out = vec![0i16; samples_needed];
        let state = self.lock();

        let count = samples_needed.min(state.samples.len());
        let skip = state.samples.len() - count;
        for (dst, &src) in out[samples_needed - count..]
            .iter_mut()
            .zip(state.samples.iter().skip(skip))
        {
            *dst = src;
        }

        debug!("Retrieved {} audio samples from injection buffer", count);
        out
    }
}

/// A microphone the capture path could be attached to.
pub trait Microphone: Send {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Capture bookkeeping for an optional microphone.
#[derive(Default)]
pub struct MicrophoneCapture {
    microphone: Option<Box<dyn Microphone>>,
    capturing: bool,
}

impl MicrophoneCapture {
    pub fn set_microphone(&mut self, microphone: Box<dyn Microphone>) {
        info!("Microphone reference set");
        self.microphone = Some(microphone);
    }

    pub fn has_microphone(&self) -> bool {
        self.microphone.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn start(&mut self) {
        match self.microphone.as_mut() {
            Some(microphone) => {
                info!("Starting microphone capture");
                microphone.start();
                self.capturing = true;
            }
            None => warn!("Cannot start capture - no microphone configured"),
        }
    }

    pub fn stop(&mut self) {
        info!("Stopping microphone capture");
        if let Some(microphone) = self.microphone.as_mut() {
            microphone.stop();
        }
        self.capturing = false;
    }

    /// Read samples straight from the microphone.
    ///
    /// Always `None`: samples reach the device only through
    /// [`InjectionBuffer::inject`]. Callers treat `None` as "no data yet".
    pub fn capture(&mut self, samples_needed: usize) -> Option<Vec<i16>> {
        if !self.has_microphone() {
            warn!("No microphone configured for capture");
            return None;
        }
        if !self.capturing {
            warn!("Microphone capture not started");
            return None;
        }
        debug!(
            "Direct capture of {} samples unsupported, use injected audio",
            samples_needed
        );
        None
    }
}
