//! Execution strategies.
//!
//! A strategy turns an ordered object list into an ordered list of unit
//! outcomes, one per object, in listing order. Two variants exist and they
//! are chosen by value through [`StrategyKind`]:
//!
//! - [`Sequential`]: one object at a time on the calling thread.
//! - [`Parallel`]: a fixed-width pool of scoped worker threads, each owning its
//!   own query client.
//!
//! Every object is queried exactly once; nothing is retried at this layer.

mod parallel;
mod sequential;

pub use parallel::Parallel;
pub use sequential::Sequential;

use std::fmt;
use std::str::FromStr;

use scatterq_core::config::{FailurePolicy, Scope};
use scatterq_core::error::{Error, Result};
use scatterq_core::hook::TransformHook;
use scatterq_core::types::{ChunkFailure, ChunkResult, ObjectDescriptor, QueryRequest};
use scatterq_io::{Connector, QueryClient};
use tracing::warn;

/// Result of one unit: a chunk, or a failure recorded under [`FailurePolicy::Isolate`].
pub type UnitOutcome = std::result::Result<ChunkResult, ChunkFailure>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub policy: FailurePolicy,
    pub verbose: bool,
}

/// Everything a strategy needs to run one batch. Shared read-only by all workers.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPlan<'a> {
    pub scope: &'a Scope,
    pub objects: &'a [ObjectDescriptor],
    pub request: &'a QueryRequest,
    pub hook: Option<&'a TransformHook>,
    pub options: DispatchOptions,
}

pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Run every object in `plan` and return outcomes in listing order.
    fn dispatch(
        &self,
        connector: &dyn Connector,
        plan: &DispatchPlan<'_>,
    ) -> Result<Vec<UnitOutcome>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Sequential,
    Parallel,
}

impl StrategyKind {
    pub const NAMES: [&'static str; 4] = ["sequential", "seq", "parallel", "threads"];

    /// Instantiate the strategy. A width of zero is rejected for both kinds.
    pub fn build(self, width: usize) -> Result<Box<dyn Strategy>> {
        if width == 0 {
            return Err(Error::Config("concurrency width must be at least 1".into()));
        }
        Ok(match self {
            StrategyKind::Sequential => Box::new(Sequential),
            StrategyKind::Parallel => Box::new(Parallel::new(width)?),
        })
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(StrategyKind::Sequential),
            "parallel" | "threads" => Ok(StrategyKind::Parallel),
            other => Err(Error::Config(format!(
                "unknown strategy '{other}'; expected one of {:?}",
                Self::NAMES
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::Parallel => "parallel",
        })
    }
}

/// Query one object and apply the hook, if any.
pub fn run_unit(
    client: &dyn QueryClient,
    plan: &DispatchPlan<'_>,
    key: &str,
) -> Result<ChunkResult> {
    let chunk = client.query(plan.scope, key, plan.request)?;
    match plan.hook {
        Some(hook) => hook.apply(chunk).map_err(|e| Error::Hook {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(chunk),
    }
}

/// Apply the failure policy to one unit's result.
pub(crate) fn settle(result: Result<ChunkResult>, policy: FailurePolicy) -> Result<UnitOutcome> {
    match result {
        Ok(chunk) => Ok(Ok(chunk)),
        Err(err) if policy == FailurePolicy::Isolate && err.is_per_object() => {
            let key = err.object_key().unwrap_or_default().to_string();
            warn!(%key, error = %err, "isolating failed object");
            Ok(Err(ChunkFailure {
                key,
                reason: err.to_string(),
            }))
        }
        Err(err) => Err(err),
    }
}
