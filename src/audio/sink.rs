//! # Playback Sinks
//!
//! The speaker side of the link. The core only needs three operations from a
//! speaker: start it, offer it bytes, stop it. Real hardware drivers live
//! outside this crate; [`FileSink`] lets the host build write the decoded
//! PCM stream to disk instead.

use crate::error::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// A speaker that accepts 16-bit little-endian PCM.
///
/// ## Contract:
/// - `play` returns how many bytes were accepted; `0` means "nothing right
///   now" (stopped or full), fewer than offered means backpressure
/// - `start` and `stop` are idempotent
pub trait PlaybackSink: Send {
    fn start(&mut self);
    fn play(&mut self, data: &[u8]) -> usize;
    fn stop(&mut self);
}

/// Appends every accepted byte to a raw PCM file.
///
/// The output can be auditioned with e.g.
/// `ffplay -f s16le -ar 16000 -ac 1 out.pcm`.
pub struct FileSink {
    path: PathBuf,
    file: File,
    started: bool,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::Playback(format!("cannot open {}: {}", path.display(), e)))?;

        Ok(Self {
            path,
            file,
            started: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlaybackSink for FileSink {
    fn start(&mut self) {
        if !self.started {
            debug!("File sink started: {}", self.path.display());
            self.started = true;
        }
    }

    fn play(&mut self, data: &[u8]) -> usize {
        if !self.started {
            return 0;
        }
        match self.file.write(data) {
            Ok(written) => written,
            Err(err) => {
                error!("File sink write failed: {}", err);
                0
            }
        }
    }

    fn stop(&mut self) {
        if self.started {
            if let Err(err) = self.file.flush() {
                error!("File sink flush failed: {}", err);
            }
            self.started = false;
        }
    }
}
