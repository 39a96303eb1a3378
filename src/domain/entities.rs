//! Domain entities: part records and their joined metrics

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::status::Severity;

/// Default currency code for cost metrics.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Default unit for weight metrics.
pub const DEFAULT_WEIGHT_UNIT: &str = "kg";

/// Lifecycle state of a part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    InDevelopment,
    Released,
    Obsolete,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::InDevelopment => "in_development",
            ItemStatus::Released => "released",
            ItemStatus::Obsolete => "obsolete",
        }
    }

    /// Human readable form, e.g. "in development".
    pub fn label(&self) -> String {
        self.as_str().replacen('_', " ", 1)
    }

    /// Colour bucket used when rendering the part icon.
    pub fn tone(&self) -> Severity {
        match self {
            ItemStatus::Released => Severity::Ok,
            ItemStatus::InDevelopment => Severity::Warning,
            ItemStatus::Obsolete => Severity::Unknown,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown item status '{0}' (expected in_development, released or obsolete)")]
pub struct ParseItemStatusError(pub String);

impl FromStr for ItemStatus {
    type Err = ParseItemStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "in_development" => Ok(ItemStatus::InDevelopment),
            "released" => Ok(ItemStatus::Released),
            "obsolete" => Ok(ItemStatus::Obsolete),
            _ => Err(ParseItemStatusError(s.to_string())),
        }
    }
}

/// One row of the bill of materials.
///
/// `parent_id == None` marks a root. `level` is the depth as stored by the
/// data source and `sort_order` orders siblings ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,

    pub part_number: String,
    pub part_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub revision: String,

    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub sort_order: i32,

    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub supplier_code: Option<String>,

    #[serde(default)]
    pub status: ItemStatus,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engineering_data: Vec<EngineeringDataLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performance_evaluations: Vec<PerformanceEvaluation>,
}

impl PartRecord {
    /// Minimal record carrying only the hierarchy fields; the id doubles as
    /// part number and name.
    pub fn new(id: &str, parent_id: Option<&str>, level: i32, sort_order: i32) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            part_number: id.to_string(),
            part_name: id.to_string(),
            level,
            sort_order,
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Case-insensitive substring match on part number or part name.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.part_number.to_lowercase().contains(&term)
            || self.part_name.to_lowercase().contains(&term)
    }
}

impl fmt::Display for PartRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.part_number, self.part_name)
    }
}

/// Cost, weight, test and drawing metrics of one part.
///
/// Status fields hold the raw value delivered by the data source; they are
/// interpreted by [`crate::domain::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsRecord {
    pub id: String,
    #[serde(alias = "bom_item_id")]
    pub part_id: String,

    pub cost_current: Option<f64>,
    pub cost_target: Option<f64>,
    pub cost_currency: String,
    pub cost_status: Option<String>,

    pub weight_current: Option<f64>,
    pub weight_target: Option<f64>,
    pub weight_unit: String,
    pub weight_status: Option<String>,

    pub performance_tests_total: u32,
    pub performance_tests_met: u32,
    pub performance_status: Option<String>,

    pub drawings_required: u32,
    pub drawings_released: u32,
    pub drawing_status: Option<String>,

    pub updated_at: String,
    pub updated_by: Option<String>,
}

impl Default for MetricsRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            part_id: String::new(),
            cost_current: None,
            cost_target: None,
            cost_currency: DEFAULT_CURRENCY.to_string(),
            cost_status: None,
            weight_current: None,
            weight_target: None,
            weight_unit: DEFAULT_WEIGHT_UNIT.to_string(),
            weight_status: None,
            performance_tests_total: 0,
            performance_tests_met: 0,
            performance_status: None,
            drawings_required: 0,
            drawings_released: 0,
            drawing_status: None,
            updated_at: String::new(),
            updated_by: None,
        }
    }
}

/// Kind of engineering artefact attached to a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineeringDataType {
    #[serde(rename = "2d_cad")]
    Cad2d,
    #[serde(rename = "3d_cad")]
    Cad3d,
    #[serde(rename = "crash")]
    Crash,
    #[serde(rename = "pedestrian")]
    Pedestrian,
    #[serde(rename = "durability")]
    Durability,
    #[serde(rename = "formability")]
    Formability,
}

impl EngineeringDataType {
    pub fn label(&self) -> &'static str {
        match self {
            EngineeringDataType::Cad2d => "2D CAD",
            EngineeringDataType::Cad3d => "3D CAD",
            EngineeringDataType::Crash => "Crash",
            EngineeringDataType::Pedestrian => "Pedestrian",
            EngineeringDataType::Durability => "Durability",
            EngineeringDataType::Formability => "Formability",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Design,
    Performance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    #[default]
    Draft,
    Review,
    Approved,
}

impl DataStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataStatus::Draft => "draft",
            DataStatus::Review => "review",
            DataStatus::Approved => "approved",
        }
    }
}

/// Drawing, CAD model or simulation file linked to a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringDataLink {
    pub id: String,
    pub data_type: EngineeringDataType,
    pub data_category: DataCategory,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size_mb: Option<f64>,
    #[serde(default)]
    pub status: DataStatus,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTestType {
    CrashSafety,
    PedestrianProtection,
    Durability,
    Formability,
}

impl PerformanceTestType {
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceTestType::CrashSafety => "Crash Safety",
            PerformanceTestType::PedestrianProtection => "Pedestrian Protection",
            PerformanceTestType::Durability => "Durability",
            PerformanceTestType::Formability => "Formability",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    Conditional,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pending => "pending",
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Conditional => "conditional",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            TestStatus::Passed => Severity::Ok,
            TestStatus::Conditional => Severity::Warning,
            TestStatus::Failed => Severity::Error,
            TestStatus::Pending => Severity::Unknown,
        }
    }
}

/// Result of one crash, pedestrian, durability or formability evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvaluation {
    pub id: String,
    pub test_type: PerformanceTestType,
    pub test_name: String,
    #[serde(default)]
    pub test_standard: Option<String>,
    #[serde(default)]
    pub test_status: TestStatus,
    #[serde(default)]
    pub test_date: Option<String>,
    #[serde(default)]
    pub test_score: Option<f64>,
    #[serde(default)]
    pub requirement_met: bool,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub actual_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
