//! Part hierarchy service
//!
//! Reads part records from a store, builds the hierarchy and applies edits.
//! Every edit is a load-modify-save of the whole snapshot.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{
    build_tree, find_orphans, sort_for_display, DomainError, ItemStatus, MetricCategory,
    MetricsRecord, PartRecord, StatusValue, TreeNode,
};
use crate::infrastructure::traits::BomStore;

/// Revision assigned when none is given.
pub const DEFAULT_REVISION: &str = "A";

/// Input for creating a part. Level and sort order are derived from the parent.
#[derive(Debug, Clone, Default)]
pub struct NewPart {
    pub parent_id: Option<String>,
    pub part_number: String,
    pub part_name: String,
    pub description: Option<String>,
    pub revision: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_code: Option<String>,
    pub status: ItemStatus,
}

/// Where to move a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentChange {
    Root,
    Under(String),
}

/// Partial update of descriptive fields; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PartUpdate {
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub description: Option<String>,
    pub revision: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_code: Option<String>,
    pub status: Option<ItemStatus>,
    pub sort_order: Option<i32>,
    pub parent: Option<ParentChange>,
}

/// Partial update of a part's metrics; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct MetricsUpdate {
    pub cost_current: Option<f64>,
    pub cost_target: Option<f64>,
    pub cost_currency: Option<String>,
    pub cost_status: Option<String>,
    pub weight_current: Option<f64>,
    pub weight_target: Option<f64>,
    pub weight_unit: Option<String>,
    pub weight_status: Option<String>,
    pub performance_tests_total: Option<u32>,
    pub performance_tests_met: Option<u32>,
    pub performance_status: Option<String>,
    pub drawings_required: Option<u32>,
    pub drawings_released: Option<u32>,
    pub drawing_status: Option<String>,
}

/// Service for reading and editing the part hierarchy.
pub struct BomService {
    store: Arc<dyn BomStore>,
}

impl BomService {
    pub fn new(store: Arc<dyn BomStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> ApplicationResult<Vec<PartRecord>> {
        self.store
            .load()
            .with_context("load parts", self.store.location())
    }

    fn save(&self, records: &[PartRecord]) -> ApplicationResult<()> {
        self.store
            .save(records)
            .with_context("save parts", self.store.location())
    }

    /// All parts ordered by (level, sort_order).
    #[instrument(level = "debug", skip(self))]
    pub fn all_items(&self) -> ApplicationResult<Vec<PartRecord>> {
        let mut records = self.load()?;
        sort_for_display(&mut records);
        debug!("all_items: {} records", records.len());
        Ok(records)
    }

    /// Parts on one level ordered by sort_order.
    #[instrument(level = "debug", skip(self))]
    pub fn items_by_level(&self, level: i32) -> ApplicationResult<Vec<PartRecord>> {
        let mut records: Vec<_> = self
            .load()?
            .into_iter()
            .filter(|r| r.level == level)
            .collect();
        records.sort_by_key(|r| r.sort_order);
        Ok(records)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn item(&self, id: &str) -> ApplicationResult<PartRecord> {
        self.load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::NotFound(id.to_string()).into())
    }

    /// Direct children ordered by sort_order. Unknown parents have none.
    #[instrument(level = "debug", skip(self))]
    pub fn children(&self, parent_id: &str) -> ApplicationResult<Vec<PartRecord>> {
        let mut records: Vec<_> = self
            .load()?
            .into_iter()
            .filter(|r| r.parent_id.as_deref() == Some(parent_id))
            .collect();
        records.sort_by_key(|r| r.sort_order);
        Ok(records)
    }

    /// Case-insensitive substring search over part number and name, ordered by level.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&self, term: &str) -> ApplicationResult<Vec<PartRecord>> {
        let mut records: Vec<_> = self
            .load()?
            .into_iter()
            .filter(|r| r.matches(term))
            .collect();
        records.sort_by_key(|r| r.level);
        debug!("search '{}': {} hits", term, records.len());
        Ok(records)
    }

    /// The display forest of all parts.
    #[instrument(level = "debug", skip(self))]
    pub fn tree(&self) -> ApplicationResult<Vec<TreeNode>> {
        Ok(build_tree(&self.all_items()?))
    }

    /// Parts whose parent does not exist; these are missing from [`Self::tree`].
    #[instrument(level = "debug", skip(self))]
    pub fn orphans(&self) -> ApplicationResult<Vec<PartRecord>> {
        let records = self.all_items()?;
        Ok(find_orphans(&records).into_iter().cloned().collect())
    }

    /// Add a part below `parent_id` (or as a root), after its last sibling.
    #[instrument(level = "debug", skip(self, new), fields(part_number = %new.part_number))]
    pub fn create(&self, new: NewPart) -> ApplicationResult<PartRecord> {
        let mut records = self.load()?;
        let id = Uuid::new_v4().to_string();

        let part_number = required("part number", &new.part_number)?;
        let part_name = required("part name", &new.part_name)?;
        let level = match new.parent_id.as_deref() {
            None => 0,
            Some(parent_id) => find(&records, parent_id)
                .map(|parent| parent.level + 1)
                .ok_or_else(|| DomainError::UnknownParent {
                    id: id.clone(),
                    parent_id: parent_id.to_string(),
                })?,
        };
        let sort_order = next_sort_order(&records, new.parent_id.as_deref());
        let now = timestamp();

        let part = PartRecord {
            id,
            parent_id: new.parent_id,
            part_number,
            part_name,
            description: new.description,
            revision: new
                .revision
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REVISION.to_string()),
            level,
            sort_order,
            supplier_name: new.supplier_name,
            supplier_code: new.supplier_code,
            status: new.status,
            created_at: now.clone(),
            updated_at: now,
            ..Default::default()
        };

        records.push(part.clone());
        self.save(&records)?;
        info!(id = %part.id, level, "created part");
        Ok(part)
    }

    /// Apply a partial update; moving a part shifts the levels of its subtree.
    #[instrument(level = "debug", skip(self, changes))]
    pub fn update(&self, id: &str, changes: PartUpdate) -> ApplicationResult<PartRecord> {
        let mut records = self.load()?;
        let pos = position(&records, id)?;

        if let Some(change) = &changes.parent {
            reparent(&mut records, pos, change)?;
        }

        let part = &mut records[pos];
        if let Some(value) = changes.part_number {
            part.part_number = required("part number", &value)?;
        }
        if let Some(value) = changes.part_name {
            part.part_name = required("part name", &value)?;
        }
        if let Some(value) = changes.description {
            part.description = Some(value);
        }
        if let Some(value) = changes.revision {
            part.revision = value;
        }
        if let Some(value) = changes.supplier_name {
            part.supplier_name = Some(value);
        }
        if let Some(value) = changes.supplier_code {
            part.supplier_code = Some(value);
        }
        if let Some(value) = changes.status {
            part.status = value;
        }
        if let Some(value) = changes.sort_order {
            part.sort_order = value;
        }
        part.updated_at = timestamp();

        let updated = part.clone();
        self.save(&records)?;
        info!(id, "updated part");
        Ok(updated)
    }

    /// Create or patch the metrics attached to a part.
    #[instrument(level = "debug", skip(self, changes))]
    pub fn update_metrics(&self, id: &str, changes: MetricsUpdate) -> ApplicationResult<MetricsRecord> {
        let mut records = self.load()?;
        let pos = position(&records, id)?;

        for (status, category) in [
            (&changes.cost_status, MetricCategory::Cost),
            (&changes.weight_status, MetricCategory::Weight),
            (&changes.performance_status, MetricCategory::Performance),
            (&changes.drawing_status, MetricCategory::Drawing),
        ] {
            if let Some(value) = status {
                check_status(value, category)?;
            }
        }

        let metrics = records[pos].metrics.get_or_insert_with(|| MetricsRecord {
            id: Uuid::new_v4().to_string(),
            part_id: id.to_string(),
            ..Default::default()
        });

        if changes.cost_current.is_some() {
            metrics.cost_current = changes.cost_current;
        }
        if changes.cost_target.is_some() {
            metrics.cost_target = changes.cost_target;
        }
        if let Some(value) = changes.cost_currency {
            metrics.cost_currency = value.to_ascii_uppercase();
        }
        if changes.cost_status.is_some() {
            metrics.cost_status = changes.cost_status;
        }
        if changes.weight_current.is_some() {
            metrics.weight_current = changes.weight_current;
        }
        if changes.weight_target.is_some() {
            metrics.weight_target = changes.weight_target;
        }
        if let Some(value) = changes.weight_unit {
            metrics.weight_unit = value;
        }
        if changes.weight_status.is_some() {
            metrics.weight_status = changes.weight_status;
        }
        if let Some(value) = changes.performance_tests_total {
            metrics.performance_tests_total = value;
        }
        if let Some(value) = changes.performance_tests_met {
            metrics.performance_tests_met = value;
        }
        if changes.performance_status.is_some() {
            metrics.performance_status = changes.performance_status;
        }
        if let Some(value) = changes.drawings_required {
            metrics.drawings_required = value;
        }
        if let Some(value) = changes.drawings_released {
            metrics.drawings_released = value;
        }
        if changes.drawing_status.is_some() {
            metrics.drawing_status = changes.drawing_status;
        }

        if metrics.performance_tests_met > metrics.performance_tests_total {
            return Err(DomainError::InvalidPart {
                message: format!(
                    "{} tests met exceeds {} total",
                    metrics.performance_tests_met, metrics.performance_tests_total
                ),
            }
            .into());
        }
        if metrics.drawings_released > metrics.drawings_required {
            return Err(DomainError::InvalidPart {
                message: format!(
                    "{} drawings released exceeds {} required",
                    metrics.drawings_released, metrics.drawings_required
                ),
            }
            .into());
        }
        metrics.updated_at = timestamp();

        let updated = metrics.clone();
        self.save(&records)?;
        info!(id, "updated metrics");
        Ok(updated)
    }

    /// Remove a part and, cascading, all of its descendants.
    ///
    /// Returns the number of removed records.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: &str) -> ApplicationResult<usize> {
        let mut records = self.load()?;
        position(&records, id)?;

        let mut doomed = descendants(&records, id);
        doomed.insert(id.to_string());

        let before = records.len();
        records.retain(|r| !doomed.contains(&r.id));
        let removed = before - records.len();

        self.save(&records)?;
        info!(id, removed, "deleted part");
        Ok(removed)
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidPart {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn check_status(value: &str, category: MetricCategory) -> Result<(), DomainError> {
    match value.parse::<StatusValue>() {
        Ok(status) if status.belongs_to(category) => Ok(()),
        _ => Err(DomainError::InvalidPart {
            message: format!("'{value}' is not a {category} status"),
        }),
    }
}

fn find<'a>(records: &'a [PartRecord], id: &str) -> Option<&'a PartRecord> {
    records.iter().find(|r| r.id == id)
}

fn position(records: &[PartRecord], id: &str) -> Result<usize, DomainError> {
    records
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| DomainError::NotFound(id.to_string()))
}

fn next_sort_order(records: &[PartRecord], parent_id: Option<&str>) -> i32 {
    records
        .iter()
        .filter(|r| r.parent_id.as_deref() == parent_id)
        .map(|r| r.sort_order + 1)
        .max()
        .unwrap_or(0)
}

/// Ids of all strict descendants of `id`, via BFS over parent links.
fn descendants(records: &[PartRecord], id: &str) -> HashSet<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in records {
        if let Some(parent) = record.parent_id.as_deref() {
            children.entry(parent).or_default().push(record.id.as_str());
        }
    }

    let mut found = HashSet::new();
    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        for &child in children.get(current).into_iter().flatten() {
            // Skip if already visited (handles cycles in stored data)
            if child != id && found.insert(child.to_string()) {
                queue.push_back(child);
            }
        }
    }
    found
}

fn reparent(
    records: &mut [PartRecord],
    pos: usize,
    change: &ParentChange,
) -> Result<(), DomainError> {
    let id = records[pos].id.clone();

    let (new_parent, new_level) = match change {
        ParentChange::Root => (None, 0),
        ParentChange::Under(parent_id) => {
            let parent = find(records, parent_id).ok_or_else(|| DomainError::UnknownParent {
                id: id.clone(),
                parent_id: parent_id.clone(),
            })?;
            if *parent_id == id || descendants(records, &id).contains(parent_id) {
                return Err(DomainError::ParentCycle {
                    id,
                    parent_id: parent_id.clone(),
                });
            }
            (Some(parent_id.clone()), parent.level + 1)
        }
    };

    if records[pos].parent_id == new_parent {
        return Ok(());
    }

    let delta = new_level - records[pos].level;
    let moved = descendants(records, &id);
    for record in records.iter_mut().filter(|r| moved.contains(&r.id)) {
        record.level += delta;
    }

    let sort_order = next_sort_order(records, new_parent.as_deref());
    let part = &mut records[pos];
    debug!(id = %part.id, ?new_parent, delta, "moving part");
    part.level = new_level;
    part.sort_order = sort_order;
    part.parent_id = new_parent;
    Ok(())
}
