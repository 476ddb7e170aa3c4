//! # Line Framer
//!
//! Turns the transport's byte stream into newline-terminated lines.
//!
//! ## Framing rules:
//! - `'\r'` is ignored, so CRLF and LF senders look the same
//! - `'\n'` completes a line; an empty line produces nothing
//! - once `max_len` bytes are buffered, the next byte clears the
//!   buffer and is itself dropped (runaway input protection, not an error)
//!
//! The framer holds no timers. Clearing a half-built line that went stale is
//! the scheduler's job, through [`LineFramer::clear`]. Invalid UTF-8 is
//! replaced rather than rejected; the field extractor only looks for ASCII
//! anchors anyway.

use tracing::{debug, warn};

/// Bounded accumulator for one protocol line.
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    max_len: usize,
}

impl LineFramer {
    /// Create a framer that holds at most `max_len` bytes per line.
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_len),
            max_len,
        }
    }

    /// Consume one byte from the transport.
    ///
    /// ## Returns:
    /// - **Some(line)**: a complete, non-empty line (never contains `'\n'` or `'\r'`)
    /// - **None**: the line is still being built, or the byte was dropped
    pub fn feed(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' => None,
            b'\n' => {
                if self.buffer.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buffer).into_owned();
                self.buffer.clear();
                debug!("Complete line received: {}", line);
                Some(line)
            }
            other => {
                if self.buffer.len() < self.max_len {
                    self.buffer.push(other);
                } else {
                    warn!("Input buffer overflow, clearing");
                    self.buffer.clear();
                }
                None
            }
        }
    }

    /// True while a partial line is waiting for its terminator.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Number of bytes currently buffered.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(framer: &mut LineFramer, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| framer.feed(b)).collect()
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let mut framer = LineFramer::new(512);
        let lines = feed_all(&mut framer, b"\r\n\n{\"type\":\"heartbeat\"}\r\n\n");
        assert_eq!(lines, vec!["{\"type\":\"heartbeat\"}".to_string()]);
        assert!(!framer.has_pending());
    }

    #[test]
    fn test_lines_never_contain_terminators() {
        let mut framer = LineFramer::new(16);
        let input: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        for line in feed_all(&mut framer, &input) {
            assert!(!line.is_empty());
            assert!(!line.contains('\n'));
            assert!(!line.contains('\r'));
        }
    }

    #[test]
    fn test_overflow_drops_prefix_and_recovers() {
        let mut framer = LineFramer::new(512);
        let runaway = vec![b'x'; 600];
        assert!(feed_all(&mut framer, &runaway).is_empty());
        // 512 kept, the 513th byte clears, 87 more accumulate after the reset
        assert_eq!(framer.pending_len(), 600 - 513);

        framer.clear();
        let lines = feed_all(&mut framer, b"{\"type\":\"get_status\"}\n");
        assert_eq!(lines, vec!["{\"type\":\"get_status\"}".to_string()]);
    }

    #[test]
    fn test_overflow_then_newline_yields_tail_only() {
        let mut framer = LineFramer::new(4);
        let lines = feed_all(&mut framer, b"abcdXef\n");
        // "abcd" fills the buffer, 'X' clears it and is dropped
        assert_eq!(lines, vec!["ef".to_string()]);
    }
}
