//! Fold ordered chunks into one [`AggregateResult`].
//!
//! One pass, no reordering or filtering: an empty payload still counts as a
//! processed file. Cost is computed once on the accumulated totals.

use scatterq_core::cost::CostModel;
use scatterq_core::types::{AggregateResult, AggregateStats, ChunkResult, ScanStats};

use crate::strategy::UnitOutcome;

pub fn aggregate<I>(chunks: I) -> AggregateResult
where
    I: IntoIterator<Item = ChunkResult>,
{
    aggregate_with(chunks, &CostModel::default())
}

pub fn aggregate_with<I>(chunks: I, model: &CostModel) -> AggregateResult
where
    I: IntoIterator<Item = ChunkResult>,
{
    aggregate_outcomes(chunks.into_iter().map(Ok), model)
}

/// Like [`aggregate_with`], but isolated failures are collected separately and
/// contribute nothing to the counters.
pub fn aggregate_outcomes<I>(outcomes: I, model: &CostModel) -> AggregateResult
where
    I: IntoIterator<Item = UnitOutcome>,
{
    let mut totals = ScanStats::default();
    let mut files = 0u64;
    let mut payload = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(chunk) => {
                let (text, stats) = chunk.into_parts();
                totals += stats;
                files += 1;
                payload.push(text);
            }
            Err(failure) => failures.push(failure),
        }
    }

    AggregateResult {
        payload,
        stats: AggregateStats {
            cost: model.estimate(totals.bytes_scanned, totals.bytes_returned, files),
            files_processed: files,
            bytes_scanned: totals.bytes_scanned,
            bytes_returned: totals.bytes_returned,
            bytes_processed: totals.bytes_processed,
        },
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatterq_core::types::ChunkFailure;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-20, "{a} != {b}");
    }

    #[test]
    fn single_chunk_figures() {
        let result = aggregate(vec![ChunkResult::new("test", ScanStats::new(30, 30, 10))]);
        assert_eq!(result.payload, vec!["test".to_string()]);
        assert_close(result.stats.cost, 6.77e-11);
        assert_eq!(result.stats.files_processed, 1);
        assert_eq!(result.stats.bytes_scanned, 30);
        assert_eq!(result.stats.bytes_returned, 10);
        assert_eq!(result.stats.bytes_processed, 30);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn counters_are_sums_and_order_is_kept() {
        let chunks = vec![
            ChunkResult::new("a", ScanStats::new(1, 2, 3)),
            ChunkResult::new("", ScanStats::new(10, 20, 0)),
            ChunkResult::new("c", ScanStats::new(100, 200, 300)),
        ];
        let result = aggregate(chunks);
        assert_eq!(result.payload, vec!["a", "", "c"]);
        assert_eq!(result.stats.files_processed, 3);
        assert_eq!(result.stats.bytes_scanned, 111);
        assert_eq!(result.stats.bytes_processed, 222);
        assert_eq!(result.stats.bytes_returned, 303);
    }

    #[test]
    fn empty_input_costs_nothing() {
        let result = aggregate(Vec::new());
        assert!(result.payload.is_empty());
        assert_eq!(result.stats.files_processed, 0);
        assert_eq!(result.stats.cost, 0.0);
    }

    #[test]
    fn isolated_failures_do_not_count() {
        let outcomes = vec![
            Ok(ChunkResult::new("a", ScanStats::new(30, 30, 10))),
            Err(ChunkFailure {
                key: "b".into(),
                reason: "throttled".into(),
            }),
        ];
        let result = aggregate_outcomes(outcomes, &CostModel::default());
        assert_eq!(result.stats.files_processed, 1);
        assert_close(result.stats.cost, 6.77e-11);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].key, "b");
    }
}
