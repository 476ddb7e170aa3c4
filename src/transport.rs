//! # Serial Transport
//!
//! Byte-level plumbing between the host and the protocol core.
//!
//! ## Contract:
//! - `read_byte` never blocks; `None` means "no data right now"
//! - `write_line` writes one protocol line followed by `'\n'` and flushes
//!
//! [`ChannelTransport`] is the host build's implementation: a tokio task reads
//! stdin in chunks and forwards them over an mpsc channel, so the control
//! loop can poll for bytes without ever waiting on I/O. Outbound lines go to
//! stdout, which is reserved for the protocol (logs go to stderr).

use std::collections::VecDeque;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A point-to-point byte stream to the host.
pub trait Transport: Send {
    fn read_byte(&mut self) -> Option<u8>;
    fn write_line(&mut self, line: &str) -> std::io::Result<()>;

    /// True once the host side can never send again.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Transport fed by a background reader task.
pub struct ChannelTransport<W: Write + Send> {
    incoming: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: VecDeque<u8>,
    writer: W,
    closed: bool,
}

impl<W: Write + Send> ChannelTransport<W> {
    pub fn new(incoming: mpsc::UnboundedReceiver<Vec<u8>>, writer: W) -> Self {
        Self {
            incoming,
            pending: VecDeque::new(),
            writer,
            closed: false,
        }
    }
}

impl<W: Write + Send> Transport for ChannelTransport<W> {
    fn read_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.pending.pop_front() {
            return Some(byte);
        }

        match self.incoming.try_recv() {
            Ok(chunk) => {
                self.pending.extend(chunk);
                self.pending.pop_front()
            }
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                if !self.closed {
                    info!("Host input closed");
                    self.closed = true;
                }
                None
            }
        }
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// True once the reader task has finished and every byte was consumed.
    fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

/// Forward everything read from `reader` into `sender` until EOF.
///
/// ## Usage:
/// ```rust,no_run
/// # async fn demo() {
/// let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
/// tokio::spawn(usb_voice_link::transport::pump_reader(tokio::io::stdin(), tx));
/// let transport = usb_voice_link::transport::ChannelTransport::new(rx, std::io::stdout());
/// # }
/// ```
pub async fn pump_reader<R>(mut reader: R, sender: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 1024];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("Reader reached end of input");
                break;
            }
            Ok(n) => {
                if sender.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!("Transport read failed: {}", err);
                break;
            }
        }
    }
}
