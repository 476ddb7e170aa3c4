//! # Endpoint
//!
//! The device side of the USB link: owns every buffer and timer, runs one
//! control-loop iteration per [`Endpoint::tick`], and exposes the accessors
//! that external automation polls between ticks.
//!
//! ## Control flow:
//! ```text
//! transport byte → LineFramer → dispatch → handler
//!                                           ├─ config → DeviceState / ControlOutbox
//!                                           ├─ audio  → ChunkReassembler → AudioStreamBuffer → speaker
//!                                           └─ status / responses → transport
//! capture path → InjectionBuffer → consumer
//! ```
//!
//! ## Threading:
//! Single-threaded and cooperative. Each tick reads at most one byte and
//! handles at most one line to completion. The only state shared with
//! another thread is the [`InjectionBuffer`], which carries its own lock.

use crate::audio::injection::{InjectionBuffer, Microphone, MicrophoneCapture};
use crate::audio::reassembly::ChunkReassembler;
use crate::audio::sink::PlaybackSink;
use crate::audio::stream::{AppendOutcome, AudioStreamBuffer, FlushOutcome, FlushPacing};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::control::{ControlEvent, ControlOutbox};
use crate::protocol::fields::Message;
use crate::protocol::framer::LineFramer;
use crate::protocol::response::{OutboundMessage, StatusSnapshot};
use crate::protocol::MessageKind;
use crate::scheduler::Scheduler;
use crate::state::{DeviceState, LinkMetrics, Liveness};
use crate::transport::Transport;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Endpoint {
    pub(crate) config: AppConfig,
    pub(crate) clock: Arc<dyn Clock>,
    transport: Box<dyn Transport>,
    speaker: Option<Box<dyn PlaybackSink>>,
    framer: LineFramer,
    scheduler: Scheduler,
    pub(crate) device: DeviceState,
    pub(crate) liveness: Liveness,
    pub(crate) outbox: ControlOutbox,
    stream: AudioStreamBuffer,
    pub(crate) chunks: ChunkReassembler,
    injection: InjectionBuffer,
    capture: MicrophoneCapture,
    pacing: FlushPacing,
    pub(crate) metrics: LinkMetrics,
}

impl Endpoint {
    /// Build an endpoint with no speaker or microphone attached.
    pub fn new(config: AppConfig, clock: Arc<dyn Clock>, transport: Box<dyn Transport>) -> Self {
        Self {
            framer: LineFramer::new(config.protocol.max_line_length),
            scheduler: Scheduler::new(&config.protocol),
            device: DeviceState::new(&config.device),
            liveness: Liveness::default(),
            outbox: ControlOutbox::new(),
            stream: AudioStreamBuffer::new(config.audio.stream_capacity),
            chunks: ChunkReassembler::new(config.audio.max_total_chunks),
            injection: InjectionBuffer::new(&config.audio, clock.clone()),
            capture: MicrophoneCapture::default(),
            pacing: FlushPacing::from(&config.audio),
            metrics: LinkMetrics::default(),
            speaker: None,
            transport,
            clock,
            config,
        }
    }

    pub fn set_speaker(&mut self, speaker: Box<dyn PlaybackSink>) {
        info!("Speaker reference set");
        self.speaker = Some(speaker);
    }

    pub fn set_microphone(&mut self, microphone: Box<dyn Microphone>) {
        self.capture.set_microphone(microphone);
    }

    /// Announce the device to the host. Call once before the first tick.
    pub fn start(&mut self) {
        info!(
            "USB link ready - {} byte audio buffer, speaker {}",
            self.stream.capacity(),
            if self.speaker.is_some() { "SET" } else { "NULL" }
        );
        info!("Configuration:\n{}", self.config.dump_config());
        self.send_simple(|timestamp| OutboundMessage::BootComplete { timestamp });
    }

    /// Run one control-loop iteration.
    ///
    /// ## Order of work:
    /// 1. Second boot announcement, once, after the configured delay
    /// 2. Discard a partial line whose first byte is too old
    /// 3. Read at most one byte; dispatch the line it completes, if any
    /// 4. Periodic status
    ///
    /// ## Returns:
    /// Whether a byte was consumed, so the caller can drain bursts quickly and
    /// idle when the host is quiet.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        let due = self.scheduler.poll(now);

        if due.announce_boot {
            self.send_simple(|timestamp| OutboundMessage::BootComplete { timestamp });
        }

        if due.clear_stale_line {
            debug!("Clearing stale partial line ({} bytes)", self.framer.pending_len());
            self.framer.clear();
        }

        let consumed = match self.transport.read_byte() {
            Some(byte) => {
                let was_pending = self.framer.has_pending();
                let line = self.framer.feed(byte);
                match (was_pending, self.framer.has_pending()) {
                    (false, true) => self.scheduler.line_started(now),
                    (true, false) => self.scheduler.line_finished(),
                    _ => {}
                }
                if let Some(line) = line {
                    self.dispatch(&line);
                }
                true
            }
            None => false,
        };

        if due.send_status {
            self.send_status();
        }

        consumed
    }

    /// Route one complete line to its handler.
    pub fn dispatch(&mut self, line: &str) {
        self.metrics.lines_received += 1;
        info!("Received message ({} bytes): {}", line.len(), line);

        let kind = match MessageKind::classify(line) {
            Some(kind) => kind,
            None => {
                self.metrics.lines_unknown += 1;
                return;
            }
        };
        self.liveness.touch(self.clock.now_ms());

        let message = Message::new(line);
        debug!("Processing {:?}", kind);
        match kind {
            MessageKind::Heartbeat => {
                self.send_simple(|timestamp| OutboundMessage::HeartbeatAck { timestamp })
            }
            MessageKind::GetStatus => self.send_status(),
            MessageKind::GetWakeWordOptions => self.send_wake_word_options(),
            MessageKind::Config => self.handle_config(message),
            MessageKind::Disconnect => self.liveness.expire(),
            MessageKind::PlayTone => self.handle_play_tone(message),
            MessageKind::PlayAudioCompressed => self.handle_play_audio_compressed(message),
            MessageKind::PlayAudio => self.handle_play_audio(message),
            MessageKind::PlayAudioChunk => self.handle_play_audio_chunk(message),
            MessageKind::StartAudioStream => self.start_audio_stream(),
            MessageKind::AudioDataChunk => self.handle_audio_data_chunk(message),
            MessageKind::FinishAudioStream => {
                self.finish_audio_stream();
                self.send_simple(|timestamp| OutboundMessage::AudioStreamComplete { timestamp });
            }
        }
    }

    // ----- outbound -----

    fn emit(&mut self, encoded: serde_json::Result<String>) {
        let line = match encoded {
            Ok(line) => line,
            Err(err) => {
                warn!("Failed to encode outbound message: {}", err);
                return;
            }
        };
        if let Err(err) = self.transport.write_line(&line) {
            self.metrics.write_errors += 1;
            warn!("Failed to send to host: {}", err);
        }
    }

    /// Send a message whose only field is the timestamp.
    pub(crate) fn send_simple(&mut self, build: fn(u64) -> OutboundMessage<'static>) {
        let encoded = build(self.clock.now_ms()).encode();
        self.emit(encoded);
    }

    pub fn send_status(&mut self) {
        let encoded = OutboundMessage::Status(StatusSnapshot::new(
            self.clock.now_ms(),
            self.device.voice_phase,
            &self.device.wake_word,
            &self.device.sensitivity,
        ))
        .encode();
        self.emit(encoded);
    }

    pub fn send_wake_word_options(&mut self) {
        let encoded = OutboundMessage::WakeWordOptions {
            options: &self.config.device.wake_word_options,
            timestamp: self.clock.now_ms(),
        }
        .encode();
        self.emit(encoded);
    }

    // ----- audio stream -----

    /// Open the stream buffer, discarding anything not yet flushed.
    pub fn start_audio_stream(&mut self) {
        self.stream.open();
    }

    /// Append raw PCM bytes to the open stream (all or nothing).
    pub fn write_audio_chunk(&mut self, bytes: &[u8]) -> AppendOutcome {
        let outcome = self.stream.append(bytes);
        if outcome != AppendOutcome::Written {
            self.metrics.audio_bytes_dropped += bytes.len() as u64;
        }
        outcome
    }

    /// Close the stream and play it. Raises [`ControlEvent::AudioReady`]
    /// once every byte reached the speaker.
    pub fn finish_audio_stream(&mut self) -> FlushOutcome {
        let outcome = self
            .stream
            .flush(self.speaker.as_deref_mut(), self.clock.as_ref(), &self.pacing);

        match outcome {
            FlushOutcome::Played { .. } => {
                self.metrics.flushes += 1;
                self.outbox.push(ControlEvent::AudioReady);
            }
            FlushOutcome::Abandoned { .. } => self.metrics.flushes_abandoned += 1,
            FlushOutcome::NoSink | FlushOutcome::Empty => {}
        }
        outcome
    }

    pub fn has_audio_data(&self) -> bool {
        self.stream.has_audio_data()
    }

    pub fn clear_audio_buffer(&mut self) {
        self.stream.clear();
    }

    // ----- accessors for external automation -----

    pub fn current_wake_word(&self) -> &str {
        &self.device.wake_word
    }

    pub fn current_sensitivity(&self) -> &str {
        &self.device.sensitivity
    }

    pub fn current_voice_phase(&self) -> i32 {
        self.device.voice_phase
    }

    pub fn update_voice_phase(&mut self, phase: i32) {
        self.device.voice_phase = phase;
    }

    /// True once per completed playback.
    pub fn should_play_audio(&mut self) -> bool {
        self.outbox.take_audio_ready()
    }

    pub fn take_unmute_request(&mut self) -> bool {
        self.outbox.take_unmute_request()
    }

    pub fn take_volume_change_request(&mut self) -> bool {
        self.outbox.take_volume_change_request()
    }

    pub fn requested_volume(&self) -> f32 {
        self.outbox.requested_volume()
    }

    pub fn take_tone_playback_request(&mut self) -> bool {
        self.outbox.take_tone_playback_request()
    }

    /// Every pending control event, in the order raised.
    pub fn drain_control_events(&mut self) -> Vec<ControlEvent> {
        self.outbox.drain()
    }

    /// Whether the host sent a recognized message within the liveness window.
    pub fn is_host_connected(&self) -> bool {
        self.liveness
            .is_alive(self.clock.now_ms(), self.config.protocol.host_timeout_ms)
    }

    pub fn last_message_ms(&self) -> Option<u64> {
        self.liveness.last_message_ms()
    }

    /// True once the host input has ended for good.
    pub fn transport_closed(&self) -> bool {
        self.transport.is_closed()
    }

    pub fn metrics(&self) -> &LinkMetrics {
        &self.metrics
    }

    // ----- microphone -----

    /// Clone of the injection ring for a capture thread.
    pub fn injection_buffer(&self) -> InjectionBuffer {
        self.injection.clone()
    }

    pub fn inject_audio_data(&self, samples: &[i16]) {
        self.injection.inject(samples);
    }

    pub fn has_recent_audio_data(&self) -> bool {
        self.injection.has_recent_audio_data()
    }

    pub fn latest_audio_data(&self, samples_needed: usize) -> Vec<i16> {
        self.injection.latest(samples_needed)
    }

    pub fn start_microphone_capture(&mut self) {
        self.capture.start();
    }

    pub fn stop_microphone_capture(&mut self) {
        self.capture.stop();
    }

    /// Direct microphone reads are not supported; always `None`.
    pub fn capture_microphone_data(&mut self, samples_needed: usize) -> Option<Vec<i16>> {
        self.capture.capture(samples_needed)
    }
}
