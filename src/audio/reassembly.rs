//! # Chunk Reassembly
//!
//! Puts an explicitly indexed, possibly out-of-order sequence of audio chunks
//! back together before anything is written to the stream buffer.
//!
//! ## Protocol:
//! 1. A start message declares `total_chunks` and resets all state
//! 2. Data messages carry a 1-based `chunk_index` and an `audio_data` array
//! 3. When the received count reaches the declared total, the slots are
//!    released in index order, whatever order they arrived in
//!
//! ## Duplicate deliveries:
//! Every accepted data message counts toward completion, including a repeat
//! of an index that is already filled. The repeat's samples are discarded
//! (a slot is filled at most once), but the count still advances, so a
//! duplicate can complete the set early with an empty slot in it.
//!
//! ## Limits:
//! A start declaring more than `max_chunks` chunks is refused, and the
//! reassembler then rejects data until a valid start arrives.

use tracing::{debug, warn};

/// Result of offering one data chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// Index outside `1..=expected_total`; nothing changed
    Rejected,
    /// Counted, more chunks outstanding
    Stored { received: usize, expected: usize },
    /// Counted, and the set is complete: slots in index order, missing ones empty
    Complete(Vec<Vec<i64>>),
}

/// Slot table for one chunked clip.
#[derive(Debug)]
pub struct ChunkReassembler {
    slots: Vec<Option<Vec<i64>>>,
    expected_total: usize,
    received: usize,
    max_chunks: usize,
}

impl ChunkReassembler {
    /// Create a reassembler that accepts clips of at most `max_chunks` chunks.
    pub fn new(max_chunks: usize) -> Self {
        Self {
            slots: Vec::new(),
            expected_total: 0,
            received: 0,
            max_chunks,
        }
    }

    pub fn expected_total(&self) -> usize {
        self.expected_total
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Begin a new clip of `total_chunks` chunks, discarding any partial one.
    ///
    /// A missing, negative or oversized total leaves the reassembler
    /// expecting nothing, so every data chunk is rejected until the next
    /// start.
    ///
    /// ## Returns:
    /// Whether the clip was accepted.
    pub fn start(&mut self, total_chunks: Option<i64>) -> bool {
        self.reset();

        let total = match total_chunks {
            Some(total) if total > 0 => total as u64,
            _ => {
                warn!("Chunked audio start without a positive total_chunks");
                return false;
            }
        };
        if total > self.max_chunks as u64 {
            warn!(
                "Chunked audio declares {} chunks, limit is {}, ignoring",
                total, self.max_chunks
            );
            return false;
        }

        let total = total as usize;
        if let Err(err) = self.slots.try_reserve_exact(total) {
            warn!("Cannot allocate {} chunk slots: {}", total, err);
            return false;
        }
        self.slots.resize(total, None);
        self.expected_total = total;
        debug!("Expecting {} audio chunks", total);
        true
    }

    /// Store the samples for `chunk_index` (1-based).
    pub fn accept(&mut self, chunk_index: i64, samples: Vec<i64>) -> ChunkOutcome {
        if chunk_index < 1 || chunk_index as u64 > self.expected_total as u64 {
            warn!(
                "Ignoring audio chunk {} outside 1..={}",
                chunk_index, self.expected_total
            );
            return ChunkOutcome::Rejected;
        }

        let slot = &mut self.slots[(chunk_index - 1) as usize];
        if slot.is_some() {
            warn!("Audio chunk {} delivered twice, keeping the first copy", chunk_index);
        } else {
            debug!("Audio chunk {} received with {} samples", chunk_index, samples.len());
            *slot = Some(samples);
        }
        self.received += 1;

        if self.received >= self.expected_total {
            debug!("All {} audio chunks received, assembling", self.expected_total);
            let ordered = self
                .slots
                .drain(..)
                .map(|slot| slot.unwrap_or_default())
                .collect();
            self.reset();
            ChunkOutcome::Complete(ordered)
        } else {
            ChunkOutcome::Stored {
                received: self.received,
                expected: self.expected_total,
            }
        }
    }

    /// Forget the current clip.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.expected_total = 0;
        self.received = 0;
    }
}
