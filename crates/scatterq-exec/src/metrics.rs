//! Dispatch progress counters.
//!
//! Progress is reported through `tracing`: per-object events go to `debug`, or to
//! `info` when the session is verbose. Counters are owned by the thread that
//! collects outcomes, so no atomics are needed here.

use std::time::{Duration, Instant};

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub strategy: &'static str,
    pub total: usize,
    pub succeeded: usize,
    pub isolated: usize,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct DispatchMetrics {
    strategy: &'static str,
    total: usize,
    succeeded: usize,
    isolated: usize,
    verbose: bool,
    started: Instant,
}

impl DispatchMetrics {
    pub fn new(strategy: &'static str, total: usize, verbose: bool) -> Self {
        Self {
            strategy,
            total,
            succeeded: 0,
            isolated: 0,
            verbose,
            started: Instant::now(),
        }
    }

    /// Record one finished unit. `ok == false` means the failure was isolated.
    pub fn record(&mut self, key: &str, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.isolated += 1;
        }
        let done = self.done();
        if self.verbose {
            info!(strategy = self.strategy, key, ok, "{done}/{}", self.total);
        } else {
            debug!(strategy = self.strategy, key, ok, "{done}/{}", self.total);
        }
    }

    pub fn done(&self) -> usize {
        self.succeeded + self.isolated
    }

    pub fn finish(self) -> DispatchSummary {
        let summary = DispatchSummary {
            strategy: self.strategy,
            total: self.total,
            succeeded: self.succeeded,
            isolated: self.isolated,
            elapsed: self.started.elapsed(),
        };
        debug!(
            strategy = summary.strategy,
            total = summary.total,
            succeeded = summary.succeeded,
            isolated = summary.isolated,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "dispatch finished"
        );
        summary
    }
}
