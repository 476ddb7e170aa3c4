//! Test doubles shared by the unit tests: a clock that only moves when told
//! to, an in-memory transport, and a sink that records what it was given.

use crate::audio::sink::PlaybackSink;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::endpoint::Endpoint;
use crate::transport::Transport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Clock whose `sleep_ms` advances time instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: AtomicU64::new(start_ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

/// Both ends of an in-memory transport.
#[derive(Clone, Default)]
pub struct MemoryLink {
    pub inbound: Arc<Mutex<VecDeque<u8>>>,
    pub outbound: Arc<Mutex<Vec<String>>>,
}

impl MemoryLink {
    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport { link: self.clone() }
    }

    /// Queue a line (the newline is added here).
    pub fn send_line(&self, line: &str) {
        let mut inbound = self.inbound.lock().unwrap();
        inbound.extend(line.as_bytes());
        inbound.push_back(b'\n');
    }

    pub fn send_bytes(&self, bytes: &[u8]) {
        self.inbound.lock().unwrap().extend(bytes);
    }

    /// Take every line written so far.
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut *self.outbound.lock().unwrap())
    }

    /// `type` of every line written so far, consuming them.
    pub fn take_sent_types(&self) -> Vec<String> {
        self.take_sent()
            .iter()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["type"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

pub struct MemoryTransport {
    link: MemoryLink,
}

impl Transport for MemoryTransport {
    fn read_byte(&mut self) -> Option<u8> {
        self.link.inbound.lock().unwrap().pop_front()
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.link.outbound.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

/// Sink that records accepted bytes. `script` overrides how many bytes the
/// next writes accept; once it runs out every write is accepted in full.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub received: Vec<u8>,
    pub write_sizes: Vec<usize>,
    pub script: VecDeque<usize>,
    pub accept_nothing: bool,
    pub starts: usize,
    pub stops: usize,
}

impl PlaybackSink for RecordingSink {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn play(&mut self, data: &[u8]) -> usize {
        let accepted = if self.accept_nothing {
            0
        } else {
            self.script.pop_front().unwrap_or(data.len()).min(data.len())
        };
        if accepted > 0 {
            self.received.extend_from_slice(&data[..accepted]);
            self.write_sizes.push(accepted);
        }
        accepted
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

/// Sink handle that stays inspectable after being boxed into an endpoint.
#[derive(Clone, Default)]
pub struct SharedSink(pub Arc<Mutex<RecordingSink>>);

impl SharedSink {
    pub fn received(&self) -> Vec<u8> {
        self.0.lock().unwrap().received.clone()
    }
}

impl PlaybackSink for SharedSink {
    fn start(&mut self) {
        self.0.lock().unwrap().start();
    }

    fn play(&mut self, data: &[u8]) -> usize {
        self.0.lock().unwrap().play(data)
    }

    fn stop(&mut self) {
        self.0.lock().unwrap().stop();
    }
}

/// An endpoint wired to in-memory doubles, starting at t=100ms.
pub struct Harness {
    pub endpoint: Endpoint,
    pub link: MemoryLink,
    pub clock: Arc<ManualClock>,
    pub sink: SharedSink,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(100));
        let link = MemoryLink::default();
        let sink = SharedSink::default();
        let mut endpoint =
            Endpoint::new(AppConfig::default(), clock.clone(), Box::new(link.transport()));
        endpoint.set_speaker(Box::new(sink.clone()));
        Self { endpoint, link, clock, sink }
    }

    /// Tick until every queued byte has been consumed.
    pub fn pump(&mut self) {
        while self.endpoint.tick() {}
    }

    /// Send one line and return the `type` of every reply.
    pub fn send(&mut self, line: &str) -> Vec<String> {
        self.link.send_line(line);
        self.pump();
        self.link.take_sent_types()
    }
}
