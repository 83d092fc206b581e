//! Dollar cost model for remote object queries.
//!
//! The same function prices a listing before execution (worst case: every
//! byte scanned is also returned) and the realized totals afterwards.

use serde::{Deserialize, Serialize};

use crate::types::Listing;

/// How the per-object request term is priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPricing {
    /// Requests are billed at the returned-byte rate. Matches historical figures.
    #[default]
    ReturnedRate,
    /// Requests are billed at `request_rate`.
    Dedicated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Dollars per request.
    pub request_rate: f64,
    /// Dollars per returned byte.
    pub returned_rate: f64,
    /// Dollars per scanned byte.
    pub scanned_rate: f64,
    #[serde(default)]
    pub request_pricing: RequestPricing,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            request_rate: 0.0004 / 1000.0,
            returned_rate: 0.0007 / 1e9,
            scanned_rate: 0.002 / 1e9,
            request_pricing: RequestPricing::ReturnedRate,
        }
    }
}

impl CostModel {
    pub fn with_request_pricing(mut self, pricing: RequestPricing) -> Self {
        self.request_pricing = pricing;
        self
    }

    /// Estimated dollars for the given byte counters and object count.
    pub fn estimate(&self, bytes_scanned: u64, bytes_returned: u64, object_count: u64) -> f64 {
        let per_request = match self.request_pricing {
            RequestPricing::ReturnedRate => self.returned_rate,
            RequestPricing::Dedicated => self.request_rate,
        };
        // Term order is fixed so results are bit-identical across call sites.
        let returned = self.returned_rate * bytes_returned as f64;
        let requests = per_request * object_count as f64;
        let scanned = self.scanned_rate * bytes_scanned as f64;
        returned + requests + scanned
    }

    /// Pre-execution estimate for a listing.
    pub fn estimate_listing(&self, listing: &Listing) -> f64 {
        self.estimate(
            listing.total_bytes,
            listing.total_bytes,
            listing.total_objects,
        )
    }
}

/// Sum several costs, rounded to nine decimal places.
pub fn sum_cost(costs: &[f64]) -> f64 {
    let total: f64 = costs.iter().sum();
    (total * 1e9).round() / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectDescriptor;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-20,
            "expected {expected:e}, got {actual:e}"
        );
    }

    #[test]
    fn estimate_matches_reference_figures() {
        let model = CostModel::default();
        assert_close(model.estimate(100_000, 10_000, 10), 2.07007e-07);
        assert_close(model.estimate(30, 10, 1), 6.77e-11);
    }

    #[test]
    fn zero_counters_cost_nothing() {
        assert_eq!(CostModel::default().estimate(0, 0, 0), 0.0);
    }

    #[test]
    fn dedicated_request_pricing_uses_request_rate() {
        let model = CostModel::default().with_request_pricing(RequestPricing::Dedicated);
        // 10 requests at 0.0004/1000 dominate the byte terms.
        let expected = 0.0007 / 1e9 * 10_000.0 + 0.0004 / 1000.0 * 10.0 + 0.002 / 1e9 * 100_000.0;
        assert_close(model.estimate(100_000, 10_000, 10), expected);
    }

    #[test]
    fn listing_estimate_assumes_everything_returned() {
        let listing = Listing::from_objects(vec![ObjectDescriptor::new("test-key/file.json", 11)]);
        assert_close(CostModel::default().estimate_listing(&listing), 3.04e-11);
    }

    #[test]
    fn sum_cost_rounds() {
        assert_eq!(sum_cost(&[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(sum_cost(&[]), 0.0);
        assert_close(sum_cost(&[1e-10, 2e-10]), 0.0);
    }
}
