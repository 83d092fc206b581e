use scatterq_core::error::Result;
use scatterq_io::Connector;

use super::{run_unit, settle, DispatchPlan, Strategy, UnitOutcome};
use crate::metrics::DispatchMetrics;

/// One object at a time, on the calling thread, through a single client.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Strategy for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn dispatch(
        &self,
        connector: &dyn Connector,
        plan: &DispatchPlan<'_>,
    ) -> Result<Vec<UnitOutcome>> {
        if plan.objects.is_empty() {
            return Ok(Vec::new());
        }
        let client = connector.connect()?;
        let mut metrics =
            DispatchMetrics::new(self.name(), plan.objects.len(), plan.options.verbose);
        let mut outcomes = Vec::with_capacity(plan.objects.len());
        for object in plan.objects {
            let outcome = settle(
                run_unit(client.as_ref(), plan, &object.key),
                plan.options.policy,
            )?;
            metrics.record(&object.key, outcome.is_ok());
            outcomes.push(outcome);
        }
        metrics.finish();
        Ok(outcomes)
    }
}
