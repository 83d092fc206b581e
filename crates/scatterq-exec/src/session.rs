//! Session facade: binds a scope, a strategy name, and a connector.
//!
//! `select` is synchronous end to end. It resolves the strategy before anything
//! else, so a bad name or width fails without a single catalog or query call.

use scatterq_core::config::{EngineConfig, FailurePolicy, Scope};
use scatterq_core::cost::CostModel;
use scatterq_core::error::Result;
use scatterq_core::format::{InputFormat, OutputFormat};
use scatterq_core::hook::TransformHook;
use scatterq_core::types::{AggregateResult, Listing, QueryRequest};
use scatterq_io::Connector;
use tracing::{debug, info};

use crate::aggregate::aggregate_outcomes;
use crate::strategy::{DispatchOptions, DispatchPlan, StrategyKind};

/// Per-call options for [`Session::select`]. Unset fields fall back to the session config.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub hook: Option<TransformHook>,
    pub concurrency: Option<usize>,
    pub strategy: Option<String>,
    pub failure_policy: Option<FailurePolicy>,
    pub input: InputFormat,
    pub output: OutputFormat,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: TransformHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_concurrency(mut self, width: usize) -> Self {
        self.concurrency = Some(width);
        self
    }

    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = Some(name.into());
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn with_input(mut self, input: InputFormat) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }
}

pub struct Session<C: Connector> {
    connector: C,
    config: EngineConfig,
    cost_model: CostModel,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, config: EngineConfig) -> Self {
        Self {
            connector,
            config,
            cost_model: CostModel::default(),
        }
    }

    pub fn with_cost_model(mut self, model: CostModel) -> Self {
        self.cost_model = model;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scope(&self) -> &Scope {
        &self.config.scope
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub fn list(&self) -> Result<Listing> {
        self.connector.catalog()?.list(&self.config.scope)
    }

    /// Worst-case dollars for querying every object under the scope.
    pub fn estimate_cost(&self) -> Result<f64> {
        let listing = self.list()?;
        let cost = self.cost_model.estimate_listing(&listing);
        info!(
            scope = %self.config.scope,
            objects = listing.total_objects,
            bytes = listing.total_bytes,
            cost,
            "estimated cost"
        );
        Ok(cost)
    }

    pub fn select(&self, query: &str, options: SelectOptions) -> Result<AggregateResult> {
        let name = options.strategy.as_deref().unwrap_or(&self.config.strategy);
        let width = options.concurrency.unwrap_or(self.config.concurrency);
        let strategy = name.parse::<StrategyKind>()?.build(width)?;

        let listing = self.list()?;
        debug!(
            scope = %self.config.scope,
            strategy = strategy.name(),
            width,
            objects = listing.total_objects,
            "dispatching"
        );

        let request = QueryRequest::new(query)
            .with_input(options.input)
            .with_output(options.output);
        let plan = DispatchPlan {
            scope: &self.config.scope,
            objects: &listing.objects,
            request: &request,
            hook: options.hook.as_ref(),
            options: DispatchOptions {
                policy: options
                    .failure_policy
                    .unwrap_or(self.config.failure_policy),
                verbose: self.config.verbose,
            },
        };
        let outcomes = strategy.dispatch(&self.connector, &plan)?;
        let result = aggregate_outcomes(outcomes, &self.cost_model);

        info!(
            scope = %self.config.scope,
            files = result.stats.files_processed,
            failed = result.failures.len(),
            bytes_scanned = result.stats.bytes_scanned,
            bytes_returned = result.stats.bytes_returned,
            cost = result.stats.cost,
            "select finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatterq_core::error::Error;
    use scatterq_core::types::ScanStats;
    use scatterq_io::MemoryStore;

    fn session(store: &MemoryStore) -> Session<MemoryStore> {
        let mut cfg = EngineConfig::new(Scope::new("bucket", "test"));
        cfg.concurrency = 2;
        Session::new(store.clone(), cfg)
    }

    #[test]
    fn estimate_uses_listing_totals() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.insert(format!("test/{i}"), 10_000, "", ScanStats::default());
        }
        let cost = session(&store).estimate_cost().unwrap();
        let expected = CostModel::default().estimate(100_000, 100_000, 10);
        assert!((cost - expected).abs() < 1e-20);
        assert_eq!(store.query_calls(), 0);
    }

    #[test]
    fn unknown_strategy_fails_before_any_call() {
        let store = MemoryStore::new();
        store.insert("test/a", 1, "x", ScanStats::default());
        let err = session(&store)
            .select("q", SelectOptions::new().with_strategy("processes"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(store.list_calls(), 0);
        assert_eq!(store.connect_calls(), 0);
        assert_eq!(store.query_calls(), 0);
    }

    #[test]
    fn zero_width_fails_before_any_call() {
        let store = MemoryStore::new();
        store.insert("test/a", 1, "x", ScanStats::default());
        let err = session(&store)
            .select("q", SelectOptions::new().with_concurrency(0))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(store.list_calls(), 0);
    }

    #[test]
    fn empty_scope_surfaces_before_dispatch() {
        let store = MemoryStore::new();
        store.insert("other/a", 1, "x", ScanStats::default());
        let err = session(&store).select("q", SelectOptions::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyScope(_)));
        assert_eq!(store.connect_calls(), 0);
    }

    #[test]
    fn select_aggregates_in_listing_order() {
        let store = MemoryStore::new();
        store.insert("test/b", 30, "second", ScanStats::new(30, 30, 10));
        store.insert("test/a", 30, "first", ScanStats::new(30, 30, 10));
        let result = session(&store).select("q", SelectOptions::new()).unwrap();
        assert_eq!(result.payload, vec!["first", "second"]);
        assert_eq!(result.stats.files_processed, 2);
        assert_eq!(result.stats.bytes_scanned, 60);
    }
}
