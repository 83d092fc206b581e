#![forbid(unsafe_code)]
//! scatterq-exec: dispatch strategies, aggregation, and the session facade.
//!
//! `Session::select` lists the scope, hands the ordered objects to a
//! sequential or bounded-parallel strategy, and folds the outcomes into one
//! aggregate result priced by the cost model.

pub mod aggregate;
pub mod metrics;
pub mod session;
pub mod strategy;

pub use aggregate::{aggregate, aggregate_outcomes, aggregate_with};
pub use session::{SelectOptions, Session};
pub use strategy::{
    DispatchOptions, DispatchPlan, Parallel, Sequential, Strategy, StrategyKind, UnitOutcome,
};
