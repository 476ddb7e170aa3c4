use crate::audio::pcm::{encode_samples, synth_tone};
use crate::audio::reassembly::ChunkOutcome;
use crate::audio::stream::AppendOutcome;
use crate::control::ControlEvent;
use crate::endpoint::Endpoint;
use crate::protocol::fields::{Field, Message};
use crate::protocol::response::OutboundMessage;
use tracing::{debug, info, warn};

const COMPRESSED_PLACEHOLDER_HZ: f32 = 440.0;
const COMPRESSED_PLACEHOLDER_MS: u32 = 100;
const COMPRESSED_PLACEHOLDER_AMPLITUDE: f32 = 16000.0;

impl Endpoint {
    /// `play_tone`: hand the tone to external automation and acknowledge.
    pub(crate) fn handle_play_tone(&mut self, message: Message<'_>) {
        let frequency = message.integer("frequency").unwrap_or(440);
        let duration_ms = message.integer("duration_ms").unwrap_or(500);
        info!("Tone requested: {}Hz for {}ms", frequency, duration_ms);

        self.outbox.push(ControlEvent::PlayTone);
        self.send_simple(|timestamp| OutboundMessage::AudioPlayed { timestamp });
    }

    /// `play_audio_compressed`: the payload is not decoded. A short fixed
    /// tone stands in for it so the host still hears something.
    pub(crate) fn handle_play_audio_compressed(&mut self, message: Message<'_>) {
        let sample_count = match message.integer("sample_count") {
            Field::Present(count) => count,
            Field::Absent => {
                warn!("Compressed audio without sample_count, ignoring");
                return;
            }
        };
        let payload = match message.string("audio_base64") {
            Field::Present(payload) => payload,
            Field::Absent => {
                warn!("Compressed audio without payload, ignoring");
                return;
            }
        };
        info!(
            "Compressed audio: {} samples, {} base64 bytes (playing placeholder tone)",
            sample_count,
            payload.len()
        );

        let tone = synth_tone(
            COMPRESSED_PLACEHOLDER_HZ,
            COMPRESSED_PLACEHOLDER_MS,
            self.config.audio.sample_rate,
            COMPRESSED_PLACEHOLDER_AMPLITUDE,
        );
        self.start_audio_stream();
        self.write_audio_chunk(&tone);
        self.finish_audio_stream();
        self.send_simple(|timestamp| OutboundMessage::AudioPlayed { timestamp });
    }

    /// `play_audio`: a whole clip, or one batch of a clip.
    ///
    /// ## Batch envelope:
    /// - A message is batched if it carries a `batch` key at all
    /// - `batch` and `total_batches` default to 1
    /// - Batch 1 opens the stream; the batch reaching `total_batches` plays it
    /// - Intermediate batches are acknowledged with `batch_received`
    pub(crate) fn handle_play_audio(&mut self, message: Message<'_>) {
        let is_batch = message.has_key("batch");
        let batch = message.integer("batch").unwrap_or(1);
        let total_batches = message.integer("total_batches").unwrap_or(1);

        if is_batch {
            debug!("Audio batch {}/{}", batch, total_batches);
            if batch == 1 {
                self.start_audio_stream();
            }
        }

        let samples = match message.int_array("audio_data") {
            Field::Present(samples) => samples,
            Field::Absent => {
                debug!("play_audio without audio_data");
                return;
            }
        };

        if !is_batch {
            self.start_audio_stream();
        }
        self.write_samples(&samples);

        if !is_batch || batch >= total_batches {
            self.finish_audio_stream();
            self.send_simple(|timestamp| OutboundMessage::AudioPlayed { timestamp });
        } else {
            self.send_simple(|timestamp| OutboundMessage::BatchReceived { timestamp });
        }
    }

    /// `play_audio_chunk`: indexed chunks that may arrive in any order.
    pub(crate) fn handle_play_audio_chunk(&mut self, message: Message<'_>) {
        if message.flag("is_start") {
            let total_chunks = message.integer("total_chunks").into_option();
            info!("Chunked audio starting, {:?} chunks expected", total_chunks);
            if self.chunks.start(total_chunks) {
                self.start_audio_stream();
            }
            return;
        }

        let chunk_index = message.integer("chunk_index").unwrap_or(-1);
        let samples = match message.int_array("audio_data") {
            Field::Present(samples) if chunk_index > 0 => samples,
            _ => {
                debug!("Audio chunk without index or data, ignoring");
                return;
            }
        };

        match self.chunks.accept(chunk_index, samples) {
            ChunkOutcome::Rejected | ChunkOutcome::Stored { .. } => {}
            ChunkOutcome::Complete(slots) => {
                for slot in &slots {
                    if !self.write_samples(slot) {
                        break;
                    }
                }
                self.finish_audio_stream();
                self.send_simple(|timestamp| OutboundMessage::AudioPlayed { timestamp });
            }
        }
    }

    /// Append samples one at a time, each as 16-bit little-endian PCM.
    ///
    /// The first sample that does not fit ends the write; the rest are
    /// counted as dropped. Returns whether every sample was written.
    fn write_samples(&mut self, samples: &[i64]) -> bool {
        let encoded = encode_samples(samples);
        for (written, sample) in encoded.chunks_exact(2).enumerate() {
            if self.write_audio_chunk(sample) != AppendOutcome::Written {
                let unwritten = samples.len() - written - 1;
                self.metrics.audio_bytes_dropped += 2 * unwritten as u64;
                return false;
            }
        }
        true
    }

    /// `audio_data_chunk`: raw bytes for the open stream, low 8 bits of each
    /// value.
    pub(crate) fn handle_audio_data_chunk(&mut self, message: Message<'_>) {
        let bytes: Vec<u8> = match message.int_array("data") {
            Field::Present(values) => values.iter().map(|value| (value & 0xFF) as u8).collect(),
            Field::Absent => return,
        };
        if !bytes.is_empty() {
            self.write_audio_chunk(&bytes);
        }
    }
}
