//! Dashboard totals over a part forest.

use std::collections::BTreeMap;

use crate::domain::builder::TreeNode;
use crate::domain::status::{classify, MetricCategory, Severity};

/// Aggregated metrics of every node reachable from a forest.
///
/// Cost and weight sums only include parts that carry a value; currencies and
/// units are not converted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSummary {
    pub total_parts: usize,
    pub parts_with_metrics: usize,
    pub cost_current: f64,
    pub cost_target: f64,
    pub weight_current: f64,
    pub weight_target: f64,
    pub tests_met: u32,
    pub tests_total: u32,
    pub drawings_released: u32,
    pub drawings_required: u32,
    pub cost_status: BTreeMap<Severity, usize>,
    pub weight_status: BTreeMap<Severity, usize>,
}

impl MetricsSummary {
    pub fn from_forest(forest: &[TreeNode]) -> Self {
        let mut summary = Self::default();

        for node in forest.iter().flat_map(TreeNode::iter) {
            summary.total_parts += 1;
            let Some(metrics) = &node.record.metrics else {
                continue;
            };
            summary.parts_with_metrics += 1;

            summary.cost_current += metrics.cost_current.unwrap_or(0.0);
            summary.cost_target += metrics.cost_target.unwrap_or(0.0);
            summary.weight_current += metrics.weight_current.unwrap_or(0.0);
            summary.weight_target += metrics.weight_target.unwrap_or(0.0);
            summary.tests_met = summary.tests_met.saturating_add(metrics.performance_tests_met);
            summary.tests_total = summary.tests_total.saturating_add(metrics.performance_tests_total);
            summary.drawings_released = summary.drawings_released.saturating_add(metrics.drawings_released);
            summary.drawings_required = summary.drawings_required.saturating_add(metrics.drawings_required);

            let cost = classify(metrics.cost_status.as_deref(), MetricCategory::Cost);
            *summary.cost_status.entry(cost.severity).or_default() += 1;
            let weight = classify(metrics.weight_status.as_deref(), MetricCategory::Weight);
            *summary.weight_status.entry(weight.severity).or_default() += 1;
        }

        summary
    }

    /// Severity of the whole cost column: the worst known bucket.
    pub fn cost_severity(&self) -> Severity {
        worst(&self.cost_status)
    }

    pub fn weight_severity(&self) -> Severity {
        worst(&self.weight_status)
    }
}

fn worst(counts: &BTreeMap<Severity, usize>) -> Severity {
    [Severity::Error, Severity::Warning, Severity::Ok]
        .into_iter()
        .find(|s| counts.get(s).copied().unwrap_or(0) > 0)
        .unwrap_or(Severity::Unknown)
}
