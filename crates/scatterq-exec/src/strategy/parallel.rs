//! Bounded worker pool over scoped threads.
//!
//! `min(width, n)` workers pull indices from a shared cursor over the read-only
//! object slice. Each worker opens its own client and sends `(index, outcome)`
//! back to the calling thread, which slots results into listing order. The
//! width is the only backpressure: objects beyond it simply wait on the cursor.
//!
//! Under the abort policy the first fatal result raises a flag; workers finish
//! the unit in hand and take no new ones. The error returned is the one with the
//! lowest listing index among those observed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use scatterq_core::error::{Error, Result};
use scatterq_io::Connector;
use tracing::{debug, trace};

use super::{run_unit, settle, DispatchPlan, Strategy, UnitOutcome};
use crate::metrics::DispatchMetrics;

#[derive(Debug, Clone, Copy)]
pub struct Parallel {
    width: usize,
}

impl Parallel {
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::Config("concurrency width must be at least 1".into()));
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

enum WorkerMsg {
    Unit(usize, Result<UnitOutcome>),
    Connect(usize, Error),
}

impl Strategy for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn dispatch(
        &self,
        connector: &dyn Connector,
        plan: &DispatchPlan<'_>,
    ) -> Result<Vec<UnitOutcome>> {
        let total = plan.objects.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.width.min(total);
        debug!(workers, total, "starting worker pool");

        let cursor = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<WorkerMsg>();

        let mut slots: Vec<Option<UnitOutcome>> = (0..total).map(|_| None).collect();
        let mut first_error: Option<(usize, Error)> = None;
        let mut connect_error: Option<Error> = None;
        let mut metrics = DispatchMetrics::new(self.name(), total, plan.options.verbose);

        thread::scope(|s| {
            for worker in 0..workers {
                let tx = tx.clone();
                let cursor = &cursor;
                let abort = &abort;
                s.spawn(move || {
                    let client = match connector.connect() {
                        Ok(client) => client,
                        Err(err) => {
                            abort.store(true, Ordering::SeqCst);
                            let _ = tx.send(WorkerMsg::Connect(worker, err));
                            return;
                        }
                    };
                    while !abort.load(Ordering::SeqCst) {
                        let idx = cursor.fetch_add(1, Ordering::SeqCst);
                        if idx >= total {
                            break;
                        }
                        let key = &plan.objects[idx].key;
                        trace!(worker, idx, key = %key, "unit start");
                        let outcome =
                            settle(run_unit(client.as_ref(), plan, key), plan.options.policy);
                        if outcome.is_err() {
                            abort.store(true, Ordering::SeqCst);
                        }
                        if tx.send(WorkerMsg::Unit(idx, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for msg in rx {
                match msg {
                    WorkerMsg::Unit(idx, Ok(outcome)) => {
                        metrics.record(&plan.objects[idx].key, outcome.is_ok());
                        slots[idx] = Some(outcome);
                    }
                    WorkerMsg::Unit(idx, Err(err)) => {
                        if first_error.as_ref().map_or(true, |(seen, _)| idx < *seen) {
                            first_error = Some((idx, err));
                        }
                    }
                    WorkerMsg::Connect(worker, err) => {
                        debug!(worker, error = %err, "worker failed to connect");
                        connect_error.get_or_insert(err);
                    }
                }
            }
        });

        if let Some(err) = connect_error {
            return Err(err);
        }
        if let Some((_, err)) = first_error {
            return Err(err);
        }
        metrics.finish();

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| Error::Invariant(format!("unit {idx} never completed")))
            })
            .collect()
    }
}
