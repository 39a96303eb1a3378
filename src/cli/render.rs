//! Tree and record rendering for the terminal

use colored::Colorize;
use itertools::Itertools;
use termtree::Tree;

use crate::cli::output::{badge, paint};
use crate::config::DisplayConfig;
use crate::domain::format::{format_currency, format_ratio, format_weight, PLACEHOLDER};
use crate::domain::{classify, MetricCategory, PartRecord, TreeNode};

/// How much of the forest to show.
#[derive(Debug, Clone)]
pub struct TreeView<'a> {
    pub display: &'a DisplayConfig,
    /// Levels rendered below each root; `None` expands everything
    pub expand_depth: Option<usize>,
    pub show_ids: bool,
}

/// Render every root as its own tree, separated by blank lines.
pub fn render_forest(forest: &[TreeNode], view: &TreeView) -> String {
    forest
        .iter()
        .map(|root| build(root, 0, view).to_string())
        .join("\n")
}

fn build(node: &TreeNode, display_depth: usize, view: &TreeView) -> Tree<String> {
    let collapsed = node.has_children()
        && view
            .expand_depth
            .is_some_and(|limit| display_depth >= limit);

    let mut label = node_label(&node.record, view);
    if collapsed {
        let hidden = node.node_count() - 1;
        label = format!("{label}  {}", format!("(+{hidden} more)").dimmed());
        return Tree::new(label);
    }

    Tree::new(label).with_leaves(
        node.children
            .iter()
            .map(|child| build(child, display_depth + 1, view)),
    )
}

/// One-line part description with the configured metric columns.
pub fn node_label(record: &PartRecord, view: &TreeView) -> String {
    let mut pieces = vec![
        paint("●", record.status.tone()).to_string(),
        record.part_number.bold().to_string(),
        record.part_name.clone(),
        format!("rev {}", record.revision).dimmed().to_string(),
    ];
    if view.show_ids {
        pieces.push(format!("<{}>", record.id).dimmed().to_string());
    }
    pieces.extend(metric_columns(record, view.display));
    pieces.iter().join("  ")
}

fn metric_columns(record: &PartRecord, display: &DisplayConfig) -> Vec<String> {
    let metrics = record.metrics.as_ref();
    let mut columns = Vec::new();

    if display.shows("cost") {
        let text = metrics
            .map(|m| format_currency(m.cost_current, &m.cost_currency))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let status = classify(
            metrics.and_then(|m| m.cost_status.as_deref()),
            MetricCategory::Cost,
        );
        columns.push(format!("{} {}", paint(&text, status.severity), badge(&status)));
    }
    if display.shows("weight") {
        let text = metrics
            .map(|m| format_weight(m.weight_current, &m.weight_unit))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let status = classify(
            metrics.and_then(|m| m.weight_status.as_deref()),
            MetricCategory::Weight,
        );
        columns.push(format!("{} {}", paint(&text, status.severity), badge(&status)));
    }
    if display.shows("tests") {
        let status = classify(
            metrics.and_then(|m| m.performance_status.as_deref()),
            MetricCategory::Performance,
        );
        let text = metrics
            .map(|m| format_ratio(m.performance_tests_met, m.performance_tests_total, "Passed"))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        columns.push(paint(&text, status.severity).to_string());
    }
    if display.shows("drawings") {
        let status = classify(
            metrics.and_then(|m| m.drawing_status.as_deref()),
            MetricCategory::Drawing,
        );
        let text = metrics
            .map(|m| format_ratio(m.drawings_released, m.drawings_required, "Released"))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        columns.push(paint(&text, status.severity).to_string());
    }
    if display.shows("supplier") {
        columns.push(
            record
                .supplier_name
                .as_deref()
                .unwrap_or(PLACEHOLDER)
                .italic()
                .to_string(),
        );
    }
    columns
}

/// Single-line row used by list commands.
pub fn record_row(record: &PartRecord) -> String {
    format!(
        "{:<14} {:<32} L{:<2} rev {:<3} {:<14} {}",
        record.part_number,
        record.part_name,
        record.level,
        record.revision,
        record.status.label(),
        record.id.dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_tree, MetricsRecord};

    fn plain() {
        colored::control::set_override(false);
    }

    //   A
    //   └── B
    //       ├── C
    //       │   └── E
    //       └── D
    fn sample() -> Vec<TreeNode> {
        let mut a = PartRecord::new("A", None, 0, 0);
        a.metrics = Some(MetricsRecord {
            cost_current: Some(1234.5),
            cost_status: Some("over_budget".into()),
            weight_current: Some(2.0),
            ..Default::default()
        });
        build_tree(&[
            a,
            PartRecord::new("B", Some("A"), 1, 0),
            PartRecord::new("C", Some("B"), 2, 0),
            PartRecord::new("D", Some("B"), 2, 1),
            PartRecord::new("E", Some("C"), 3, 0),
        ])
    }

    #[test]
    fn given_expand_depth_when_rendering_then_collapses_deeper_subtrees() {
        plain();
        let display = DisplayConfig::default();
        let view = TreeView {
            display: &display,
            expand_depth: Some(1),
            show_ids: false,
        };

        let out = render_forest(&sample(), &view);

        assert!(out.contains("(+3 more)"), "{out}");
        assert!(!out.contains("E  E"), "{out}");
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn given_no_limit_when_rendering_then_shows_every_node() {
        plain();
        let display = DisplayConfig::default();
        let view = TreeView {
            display: &display,
            expand_depth: None,
            show_ids: true,
        };

        let out = render_forest(&sample(), &view);

        assert_eq!(out.lines().count(), 5);
        assert!(out.contains("<E>"));
        assert!(!out.contains("more)"));
    }

    #[test]
    fn given_metrics_when_rendering_label_then_formats_columns() {
        plain();
        let display = DisplayConfig::default();
        let view = TreeView {
            display: &display,
            expand_depth: None,
            show_ids: false,
        };
        let forest = sample();

        let label = node_label(&forest[0].record, &view);

        assert!(label.contains("$1,234.50 [Over Budget]"), "{label}");
        assert!(label.contains("2.000 kg [-]"), "{label}");
        assert!(label.contains("0 / 0 Passed"), "{label}");
    }
}
