//! Status classification for metric columns.
//!
//! Every known raw status value maps to exactly one [`Severity`] bucket and
//! one display label. The table is the same for all four metric categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::domain::format::PLACEHOLDER;

/// Display bucket derived from a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Error,
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Ok,
        Severity::Warning,
        Severity::Error,
        Severity::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric column a status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCategory {
    Cost,
    Weight,
    Performance,
    Drawing,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Cost => "cost",
            MetricCategory::Weight => "weight",
            MetricCategory::Performance => "performance",
            MetricCategory::Drawing => "drawing",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of status values the data source is allowed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusValue {
    OnTarget,
    Warning,
    OverBudget,
    OverWeight,
    OnTrack,
    AtRisk,
    Failing,
    Complete,
    InProgress,
    NotStarted,
}

impl StatusValue {
    pub const ALL: [StatusValue; 10] = [
        StatusValue::OnTarget,
        StatusValue::Warning,
        StatusValue::OverBudget,
        StatusValue::OverWeight,
        StatusValue::OnTrack,
        StatusValue::AtRisk,
        StatusValue::Failing,
        StatusValue::Complete,
        StatusValue::InProgress,
        StatusValue::NotStarted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusValue::OnTarget => "on_target",
            StatusValue::Warning => "warning",
            StatusValue::OverBudget => "over_budget",
            StatusValue::OverWeight => "over_weight",
            StatusValue::OnTrack => "on_track",
            StatusValue::AtRisk => "at_risk",
            StatusValue::Failing => "failing",
            StatusValue::Complete => "complete",
            StatusValue::InProgress => "in_progress",
            StatusValue::NotStarted => "not_started",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusValue::OnTarget => "On Target",
            StatusValue::Warning => "Warning",
            StatusValue::OverBudget => "Over Budget",
            StatusValue::OverWeight => "Over Weight",
            StatusValue::OnTrack => "On Track",
            StatusValue::AtRisk => "At Risk",
            StatusValue::Failing => "Failing",
            StatusValue::Complete => "Complete",
            StatusValue::InProgress => "In Progress",
            StatusValue::NotStarted => "Not Started",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StatusValue::OnTarget | StatusValue::OnTrack | StatusValue::Complete => Severity::Ok,
            StatusValue::Warning | StatusValue::AtRisk | StatusValue::InProgress => {
                Severity::Warning
            }
            StatusValue::OverBudget
            | StatusValue::OverWeight
            | StatusValue::Failing
            | StatusValue::NotStarted => Severity::Error,
        }
    }

    /// Whether the value is part of the category's own value set.
    ///
    /// Cost and weight share `on_target | warning | over_budget | over_weight`.
    pub fn belongs_to(&self, category: MetricCategory) -> bool {
        match category {
            MetricCategory::Cost | MetricCategory::Weight => matches!(
                self,
                StatusValue::OnTarget
                    | StatusValue::Warning
                    | StatusValue::OverBudget
                    | StatusValue::OverWeight
            ),
            MetricCategory::Performance => matches!(
                self,
                StatusValue::OnTrack | StatusValue::AtRisk | StatusValue::Failing
            ),
            MetricCategory::Drawing => matches!(
                self,
                StatusValue::Complete | StatusValue::InProgress | StatusValue::NotStarted
            ),
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status value: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for StatusValue {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusValue::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Badge text plus severity for one status cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub severity: Severity,
}

/// Classify a raw status value.
///
/// `None` and the empty string yield the placeholder label. Unrecognized
/// values keep their raw text as label and classify as [`Severity::Unknown`].
pub fn classify(status: Option<&str>, category: MetricCategory) -> Classification {
    let raw = match status {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            return Classification {
                label: PLACEHOLDER.to_string(),
                severity: Severity::Unknown,
            }
        }
    };

    match raw.parse::<StatusValue>() {
        Ok(value) => {
            if !value.belongs_to(category) {
                trace!(%category, %value, "status value from another category");
            }
            Classification {
                label: value.label().to_string(),
                severity: value.severity(),
            }
        }
        Err(_) => Classification {
            label: raw.to_string(),
            severity: Severity::Unknown,
        },
    }
}
