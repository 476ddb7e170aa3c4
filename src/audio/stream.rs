//! # Audio Stream Buffer
//!
//! Fixed-capacity staging area for outbound PCM: open it, append bytes,
//! then flush the whole thing to the speaker.
//!
//! ## Key Features:
//! - **Allocated once**: the backing array is sized at construction and never grows
//! - **All-or-nothing appends**: a chunk that does not fit is dropped whole, so
//!   sample boundaries stay byte-aligned
//! - **Paced flush**: the speaker is fed in fixed chunks with a single
//!   stop/start retry when it accepts nothing, and a short pause under backpressure
//!
//! ## Blocking:
//! `flush` sleeps between chunks through the injected [`Clock`]. Nothing else
//! runs on the control loop while it does; audio written before a flush is
//! always played in write order before the next stream can open.

use crate::audio::sink::PlaybackSink;
use crate::clock::Clock;
use crate::config::AudioConfig;
use tracing::{debug, error, info, warn};

/// What happened to one append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Written,
    /// Did not fit in the remaining capacity; buffer unchanged
    Dropped,
    /// The stream was not open; buffer unchanged
    NotStreaming,
}

/// What happened to one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Every buffered byte was handed to the sink
    Played { bytes: usize },
    /// No speaker configured
    NoSink,
    /// Nothing was buffered
    Empty,
    /// The sink kept refusing data after retries
    Abandoned { written: usize, total: usize },
}

/// Chunking and pause settings for [`AudioStreamBuffer::flush`].
#[derive(Debug, Clone, Copy)]
pub struct FlushPacing {
    pub chunk_size: usize,
    pub retry_pause_ms: u64,
    pub backpressure_pause_ms: u64,
    pub chunk_pause_ms: u64,
    pub max_stalled_writes: u32,
}

impl From<&AudioConfig> for FlushPacing {
    fn from(config: &AudioConfig) -> Self {
        Self {
            chunk_size: config.sink_chunk_size,
            retry_pause_ms: config.sink_retry_pause_ms,
            backpressure_pause_ms: config.sink_backpressure_pause_ms,
            chunk_pause_ms: config.sink_chunk_pause_ms,
            max_stalled_writes: config.max_stalled_writes,
        }
    }
}

/// Write-then-flush byte buffer feeding the playback sink.
///
/// ## Invariant:
/// `index == size` at all times: writes only ever append.
pub struct AudioStreamBuffer {
    data: Box<[u8]>,
    index: usize,
    size: usize,
    streaming: bool,
}

impl AudioStreamBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            index: 0,
            size: 0,
            streaming: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// True when a stream holds bytes that have not been flushed yet.
    pub fn has_audio_data(&self) -> bool {
        self.size > 0
    }

    /// Bytes written since the stream was opened.
    pub fn contents(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Reset the cursor and start accepting writes. Reopening discards
    /// anything not yet flushed.
    pub fn open(&mut self) {
        debug!("Starting audio stream");
        self.index = 0;
        self.size = 0;
        self.streaming = true;
    }

    /// Drop buffered bytes without touching the streaming flag.
    pub fn clear(&mut self) {
        self.index = 0;
        self.size = 0;
    }

    /// Append `bytes` if the whole chunk fits.
    pub fn append(&mut self, bytes: &[u8]) -> AppendOutcome {
        if !self.streaming {
            warn!("Attempted to write audio chunk without starting stream");
            return AppendOutcome::NotStreaming;
        }

        if self.index + bytes.len() > self.capacity() {
            warn!(
                "Audio stream buffer overflow, dropping {} byte chunk ({}/{} used)",
                bytes.len(),
                self.size,
                self.capacity()
            );
            return AppendOutcome::Dropped;
        }

        self.data[self.index..self.index + bytes.len()].copy_from_slice(bytes);
        self.index += bytes.len();
        self.size += bytes.len();

        debug!(
            "Wrote {} bytes to audio stream buffer (total: {}/{})",
            bytes.len(),
            self.size,
            self.capacity()
        );
        AppendOutcome::Written
    }

    /// Close the stream and hand its contents to `sink`.
    ///
    /// ## Process:
    /// 1. Mark the stream closed (always, even when nothing can be played)
    /// 2. Start the sink and write `chunk_size` bytes at a time
    /// 3. A write that accepts nothing triggers one stop → pause → start → retry
    /// 4. A partial write pauses briefly to let the sink drain
    ///
    /// A sink that accepts nothing for `max_stalled_writes` consecutive
    /// chunks (each already retried once) ends the flush early.
    pub fn flush<S: PlaybackSink + ?Sized>(
        &mut self,
        sink: Option<&mut S>,
        clock: &dyn Clock,
        pacing: &FlushPacing,
    ) -> FlushOutcome {
        debug!("Finishing audio stream - {} bytes total", self.size);
        self.streaming = false;

        let sink = match sink {
            Some(sink) => sink,
            None => {
                error!("No speaker configured! Cannot play audio.");
                return FlushOutcome::NoSink;
            }
        };

        if self.size == 0 {
            warn!("No audio data to play");
            return FlushOutcome::Empty;
        }

        info!("Starting speaker playback of {} bytes", self.size);
        sink.start();

        let total = self.size;
        let chunk_size = pacing.chunk_size.max(1);
        let mut offset = 0;
        let mut stalled = 0;

        while offset < total {
            let want = (total - offset).min(chunk_size);
            let chunk = &self.data[offset..offset + want];

            let mut written = sink.play(chunk).min(want);
            if written == 0 {
                warn!("Speaker write returned 0 - restarting speaker");
                sink.stop();
                clock.sleep_ms(pacing.retry_pause_ms);
                sink.start();
                clock.sleep_ms(pacing.retry_pause_ms);
                written = sink.play(chunk).min(want);
                debug!("After restart, wrote {} bytes", written);
            }

            if written == 0 {
                stalled += 1;
                if stalled >= pacing.max_stalled_writes.max(1) {
                    error!(
                        "Speaker accepted nothing for {} writes, abandoning playback at {}/{} bytes",
                        stalled, offset, total
                    );
                    return FlushOutcome::Abandoned { written: offset, total };
                }
            } else {
                stalled = 0;
            }

            offset += written;

            if written < want {
                debug!("Partial write, {} bytes remaining", total - offset);
                clock.sleep_ms(pacing.backpressure_pause_ms);
            }
            clock.sleep_ms(pacing.chunk_pause_ms);
        }

        info!("Finished streaming {} bytes to speaker", total);
        FlushOutcome::Played { bytes: total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, RecordingSink};

    fn pacing() -> FlushPacing {
        FlushPacing::from(&crate::config::AppConfig::default().audio)
    }

    #[test]
    fn test_append_requires_open_stream() {
        let mut buffer = AudioStreamBuffer::new(16);
        assert_eq!(buffer.append(&[1, 2]), AppendOutcome::NotStreaming);
        buffer.open();
        assert_eq!(buffer.append(&[1, 2]), AppendOutcome::Written);
        assert_eq!(buffer.contents(), &[1, 2]);
    }

    #[test]
    fn test_overflow_drops_whole_chunk() {
        let mut buffer = AudioStreamBuffer::new(8);
        buffer.open();
        assert_eq!(buffer.append(&[1; 6]), AppendOutcome::Written);
        assert_eq!(buffer.append(&[2; 4]), AppendOutcome::Dropped);
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.contents(), &[1; 6]);
        // an exact fit is still accepted
        assert_eq!(buffer.append(&[3; 2]), AppendOutcome::Written);
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_open_resets_cursor() {
        let mut buffer = AudioStreamBuffer::new(8);
        buffer.open();
        buffer.append(&[9; 4]);
        buffer.open();
        assert!(buffer.is_empty());
        assert!(buffer.is_streaming());
    }

    #[test]
    fn test_flush_without_sink_or_data() {
        let clock = ManualClock::new(0);
        let mut buffer = AudioStreamBuffer::new(8);
        buffer.open();
        buffer.append(&[1, 2]);
        assert_eq!(buffer.flush(None::<&mut RecordingSink>, &clock, &pacing()), FlushOutcome::NoSink);
        assert!(!buffer.is_streaming());

        let mut sink = RecordingSink::default();
        buffer.open();
        assert_eq!(buffer.flush(Some(&mut sink), &clock, &pacing()), FlushOutcome::Empty);
        assert_eq!(sink.starts, 0);
    }

    #[test]
    fn test_flush_writes_in_chunks_in_order() {
        let clock = ManualClock::new(0);
        let mut buffer = AudioStreamBuffer::new(2048);
        buffer.open();
        let payload: Vec<u8> = (0..1300u32).map(|i| (i % 251) as u8).collect();
        buffer.append(&payload);

        let mut sink = RecordingSink::default();
        let outcome = buffer.flush(Some(&mut sink), &clock, &pacing());
        assert_eq!(outcome, FlushOutcome::Played { bytes: 1300 });
        assert_eq!(sink.received, payload);
        assert_eq!(sink.write_sizes, vec![512, 512, 276]);
        // one chunk pause per write
        assert_eq!(clock.now_ms(), 3);
    }

    #[test]
    fn test_zero_write_retries_once_with_restart() {
        let clock = ManualClock::new(0);
        let mut buffer = AudioStreamBuffer::new(64);
        buffer.open();
        buffer.append(&[7; 10]);

        let mut sink = RecordingSink::default();
        sink.script = vec![0].into();
        let outcome = buffer.flush(Some(&mut sink), &clock, &pacing());
        assert_eq!(outcome, FlushOutcome::Played { bytes: 10 });
        assert_eq!(sink.starts, 2);
        assert_eq!(sink.stops, 1);
        assert_eq!(sink.received, vec![7; 10]);
        // 10 + 10 around the restart, then the chunk pause
        assert_eq!(clock.now_ms(), 21);
    }

    #[test]
    fn test_partial_write_pauses_and_resumes() {
        let clock = ManualClock::new(0);
        let mut buffer = AudioStreamBuffer::new(64);
        buffer.open();
        buffer.append(&[1, 2, 3, 4, 5, 6]);

        let mut sink = RecordingSink::default();
        sink.script = vec![4].into();
        let outcome = buffer.flush(Some(&mut sink), &clock, &pacing());
        assert_eq!(outcome, FlushOutcome::Played { bytes: 6 });
        assert_eq!(sink.received, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(sink.write_sizes, vec![4, 2]);
        // backpressure pause (5) + two chunk pauses (1 each)
        assert_eq!(clock.now_ms(), 7);
    }

    #[test]
    fn test_dead_sink_is_abandoned() {
        let clock = ManualClock::new(0);
        let mut buffer = AudioStreamBuffer::new(64);
        buffer.open();
        buffer.append(&[1; 8]);

        let mut sink = RecordingSink::default();
        sink.accept_nothing = true;
        let outcome = buffer.flush(Some(&mut sink), &clock, &pacing());
        assert_eq!(outcome, FlushOutcome::Abandoned { written: 0, total: 8 });
        assert_eq!(sink.stops, 8);
    }
}
