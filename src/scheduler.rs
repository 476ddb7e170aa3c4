//! # Loop Scheduler
//!
//! Timers for the unsolicited work the control loop does on its own:
//! re-announcing boot, discarding stale partial lines, and sending the
//! periodic status snapshot.

use crate::config::ProtocolConfig;

/// Work due on this loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueWork {
    pub announce_boot: bool,
    pub clear_stale_line: bool,
    pub send_status: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    boot_announce_delay_ms: u64,
    stale_line_timeout_ms: u64,
    status_interval_ms: u64,
    boot_announced: bool,
    partial_started_ms: Option<u64>,
    last_status_ms: u64,
}

impl Scheduler {
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            boot_announce_delay_ms: config.boot_announce_delay_ms,
            stale_line_timeout_ms: config.stale_line_timeout_ms,
            status_interval_ms: config.status_interval_ms,
            boot_announced: false,
            partial_started_ms: None,
            last_status_ms: 0,
        }
    }

    /// Decide what is due at `now_ms` and mark it as done.
    ///
    /// A partial line is stale once more than `stale_line_timeout_ms` passed
    /// since its first byte. Clearing it is reported as due and forgets the
    /// start time.
    pub fn poll(&mut self, now_ms: u64) -> DueWork {
        let mut due = DueWork::default();

        if !self.boot_announced && now_ms > self.boot_announce_delay_ms {
            self.boot_announced = true;
            due.announce_boot = true;
        }

        if let Some(started) = self.partial_started_ms {
            if now_ms.saturating_sub(started) > self.stale_line_timeout_ms {
                self.partial_started_ms = None;
                due.clear_stale_line = true;
            }
        }

        if now_ms.saturating_sub(self.last_status_ms) > self.status_interval_ms {
            self.last_status_ms = now_ms;
            due.send_status = true;
        }

        due
    }

    /// Record that the framer went from empty to holding a partial line.
    pub fn line_started(&mut self, now_ms: u64) {
        self.partial_started_ms = Some(now_ms);
    }

    /// Record that the framer is empty again (line completed or dropped).
    pub fn line_finished(&mut self) {
        self.partial_started_ms = None;
    }
}
