//! Tests for BomService
//!
//! Services run against an in-memory store so every test sees exactly the
//! records it seeded. One test at the end goes through the JSON file store.

use std::io;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use bomdash::application::services::{
    BomService, MetricsUpdate, NewPart, ParentChange, PartUpdate,
};
use bomdash::application::ApplicationError;
use bomdash::domain::{DomainError, ItemStatus, PartRecord};
use bomdash::infrastructure::traits::{BomStore, JsonFileStore};
use bomdash::util::testing;

/// Store keeping the snapshot in memory; counts saves.
#[derive(Debug, Default)]
struct MemoryStore {
    records: Mutex<Vec<PartRecord>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    fn with(records: Vec<PartRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            saves: Mutex::new(0),
        })
    }

    fn snapshot(&self) -> Vec<PartRecord> {
        self.records.lock().unwrap().clone()
    }

    fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl BomStore for MemoryStore {
    fn load(&self) -> io::Result<Vec<PartRecord>> {
        Ok(self.snapshot())
    }

    fn save(&self, records: &[PartRecord]) -> io::Result<()> {
        *self.records.lock().unwrap() = records.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Store whose reads always fail.
#[derive(Debug)]
struct BrokenStore;

impl BomStore for BrokenStore {
    fn load(&self) -> io::Result<Vec<PartRecord>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }

    fn save(&self, _records: &[PartRecord]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }

    fn location(&self) -> String {
        "broken".to_string()
    }
}

fn part(id: &str, parent: Option<&str>, level: i32, sort_order: i32, name: &str) -> PartRecord {
    let mut record = PartRecord::new(id, parent, level, sort_order);
    record.part_number = format!("PN-{id}");
    record.part_name = name.to_string();
    record
}

//   body (BP-body)
//   ├── door
//   │   └── hinge
//   └── roof
//   chassis
fn vehicle() -> Vec<PartRecord> {
    vec![
        part("hinge", Some("door"), 2, 0, "Door Hinge"),
        part("roof", Some("body"), 1, 1, "Roof Panel"),
        part("chassis", None, 0, 1, "Chassis Frame"),
        part("door", Some("body"), 1, 0, "Front Door"),
        part("body", None, 0, 0, "Body in White"),
    ]
}

fn service(records: Vec<PartRecord>) -> (BomService, Arc<MemoryStore>) {
    testing::init_test_setup();
    let store = MemoryStore::with(records);
    (BomService::new(store.clone()), store)
}

fn domain_err(err: ApplicationError) -> DomainError {
    match err {
        ApplicationError::Domain(e) => e,
        other => panic!("expected domain error, got {other:?}"),
    }
}

// ============================================================
// queries
// ============================================================

#[test]
fn given_unsorted_store_when_all_items_then_ordered_by_level_and_sort_order() {
    // Arrange
    let (svc, _) = service(vehicle());

    // Act
    let items = svc.all_items().unwrap();

    // Assert
    let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["body", "chassis", "door", "roof", "hinge"]);
}

#[test]
fn given_store_when_tree_then_siblings_follow_sort_order() {
    let (svc, _) = service(vehicle());

    let forest = svc.tree().unwrap();

    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0].id(), "body");
    let children: Vec<&str> = forest[0].children.iter().map(|c| c.id()).collect();
    assert_eq!(children, vec!["door", "roof"]);
    assert_eq!(forest[0].find("hinge").map(|n| n.depth), Some(2));
}

#[test]
fn given_level_when_items_by_level_then_only_that_level() {
    let (svc, _) = service(vehicle());

    let items = svc.items_by_level(1).unwrap();

    let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["door", "roof"]);
}

#[test]
fn given_parent_when_children_then_direct_children_only() {
    let (svc, _) = service(vehicle());

    let children = svc.children("body").unwrap();

    let ids: Vec<&str> = children.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["door", "roof"]);
    assert!(svc.children("hinge").unwrap().is_empty());
}

#[test]
fn given_term_when_search_then_matches_number_or_name_case_insensitively() {
    let (svc, _) = service(vehicle());

    let by_name = svc.search("DOOR").unwrap();
    let by_number = svc.search("pn-roof").unwrap();

    let ids: Vec<&str> = by_name.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["door", "hinge"]);
    assert_eq!(by_number.len(), 1);
    assert!(svc.search("engine").unwrap().is_empty());
}

#[test]
fn given_unknown_id_when_item_then_not_found() {
    let (svc, _) = service(vehicle());

    let err = svc.item("nope").unwrap_err();

    assert_eq!(domain_err(err), DomainError::NotFound("nope".into()));
}

#[test]
fn given_dangling_parent_when_orphans_then_lists_it() {
    let mut records = vehicle();
    records.push(part("mirror", Some("gone"), 2, 0, "Mirror"));
    let (svc, _) = service(records);

    let orphans = svc.orphans().unwrap();

    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, "mirror");
    assert!(svc.tree().unwrap().iter().all(|r| r.find("mirror").is_none()));
}

#[test]
fn given_failing_store_when_loading_then_operation_failed_with_location() {
    testing::init_test_setup();
    let svc = BomService::new(Arc::new(BrokenStore));

    let err = svc.all_items().unwrap_err();

    match err {
        ApplicationError::OperationFailed { context, .. } => {
            assert_eq!(context, "load parts: broken")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

// ============================================================
// create
// ============================================================

#[test]
fn given_parent_when_create_then_child_level_and_next_sort_order() {
    // Arrange
    let (svc, store) = service(vehicle());

    // Act
    let created = svc
        .create(NewPart {
            parent_id: Some("body".into()),
            part_number: " BP-010 ".into(),
            part_name: "Tailgate".into(),
            ..Default::default()
        })
        .unwrap();

    // Assert
    assert_eq!(created.level, 1);
    assert_eq!(created.sort_order, 2);
    assert_eq!(created.part_number, "BP-010");
    assert_eq!(created.revision, "A");
    assert_eq!(created.status, ItemStatus::InDevelopment);
    assert!(!created.created_at.is_empty());
    assert_eq!(store.saves(), 1);
    assert_eq!(svc.children("body").unwrap().last().map(|r| r.id.clone()), Some(created.id));
}

#[test]
fn given_no_parent_when_create_then_root_part() {
    let (svc, _) = service(Vec::new());

    let created = svc
        .create(NewPart {
            part_number: "BP-001".into(),
            part_name: "Body".into(),
            revision: Some("C".into()),
            status: ItemStatus::Released,
            ..Default::default()
        })
        .unwrap();

    assert!(created.is_root());
    assert_eq!((created.level, created.sort_order), (0, 0));
    assert_eq!(created.revision, "C");
}

#[test]
fn given_unknown_parent_when_create_then_rejected_without_saving() {
    let (svc, store) = service(vehicle());

    let err = svc
        .create(NewPart {
            parent_id: Some("ghost".into()),
            part_number: "X".into(),
            part_name: "X".into(),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::UnknownParent { .. }));
    assert_eq!(store.saves(), 0);
}

#[test]
fn given_blank_name_when_create_then_invalid_part() {
    let (svc, _) = service(Vec::new());

    let err = svc
        .create(NewPart {
            part_number: "BP-001".into(),
            part_name: "   ".into(),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::InvalidPart { .. }));
}

// ============================================================
// update
// ============================================================

#[test]
fn given_fields_when_update_then_only_given_fields_change() {
    let (svc, store) = service(vehicle());

    let updated = svc
        .update(
            "door",
            PartUpdate {
                part_name: Some("Front Door LH".into()),
                status: Some(ItemStatus::Released),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.part_name, "Front Door LH");
    assert_eq!(updated.status, ItemStatus::Released);
    assert_eq!(updated.part_number, "PN-door");
    assert_eq!(updated.parent_id.as_deref(), Some("body"));
    assert_eq!(store.saves(), 1);
}

#[test]
fn given_move_when_update_then_subtree_levels_shift() {
    // Arrange: move door (level 1, child hinge at 2) below chassis
    let (svc, store) = service(vehicle());

    // Act
    let moved = svc
        .update(
            "door",
            PartUpdate {
                parent: Some(ParentChange::Under("chassis".into())),
                ..Default::default()
            },
        )
        .unwrap();

    // Assert
    assert_eq!(moved.parent_id.as_deref(), Some("chassis"));
    assert_eq!(moved.level, 1);
    let hinge = store
        .snapshot()
        .into_iter()
        .find(|r| r.id == "hinge")
        .unwrap();
    assert_eq!(hinge.level, 2);

    let forest = svc.tree().unwrap();
    assert!(forest[1].find("hinge").is_some());
}

#[test]
fn given_move_to_root_when_update_then_levels_decrease() {
    let (svc, store) = service(vehicle());

    let moved = svc
        .update(
            "door",
            PartUpdate {
                parent: Some(ParentChange::Root),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(moved.is_root());
    assert_eq!(moved.level, 0);
    let hinge = store
        .snapshot()
        .into_iter()
        .find(|r| r.id == "hinge")
        .unwrap();
    assert_eq!(hinge.level, 1);
}

#[test]
fn given_move_below_own_descendant_when_update_then_parent_cycle() {
    let (svc, store) = service(vehicle());

    let err = svc
        .update(
            "body",
            PartUpdate {
                parent: Some(ParentChange::Under("hinge".into())),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::ParentCycle { .. }));
    assert_eq!(store.saves(), 0);
}

// ============================================================
// metrics
// ============================================================

#[test]
fn given_part_without_metrics_when_update_metrics_then_creates_record() {
    let (svc, _) = service(vehicle());

    let metrics = svc
        .update_metrics(
            "door",
            MetricsUpdate {
                cost_current: Some(120.0),
                cost_currency: Some("eur".into()),
                cost_status: Some("over_budget".into()),
                performance_tests_total: Some(4),
                performance_tests_met: Some(3),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(metrics.part_id, "door");
    assert_eq!(metrics.cost_currency, "EUR");
    assert_eq!(metrics.weight_unit, "kg");
    assert_eq!(metrics.cost_status.as_deref(), Some("over_budget"));
    let stored = svc.item("door").unwrap().metrics.unwrap();
    assert_eq!(stored.performance_tests_met, 3);
}

#[test]
fn given_status_from_other_category_when_update_metrics_then_rejected() {
    let (svc, store) = service(vehicle());

    let err = svc
        .update_metrics(
            "door",
            MetricsUpdate {
                drawing_status: Some("on_target".into()),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::InvalidPart { .. }));
    assert_eq!(store.saves(), 0);
}

#[test]
fn given_more_met_than_total_when_update_metrics_then_rejected() {
    let (svc, _) = service(vehicle());

    let err = svc
        .update_metrics(
            "door",
            MetricsUpdate {
                performance_tests_total: Some(2),
                performance_tests_met: Some(3),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::InvalidPart { .. }));
}

// ============================================================
// delete
// ============================================================

#[test]
fn given_part_with_descendants_when_delete_then_cascades() {
    let (svc, store) = service(vehicle());

    let removed = svc.delete("body").unwrap();

    assert_eq!(removed, 4);
    let ids: Vec<String> = store.snapshot().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["chassis".to_string()]);
}

#[test]
fn given_unknown_id_when_delete_then_not_found() {
    let (svc, store) = service(vehicle());

    let err = svc.delete("ghost").unwrap_err();

    assert_eq!(domain_err(err), DomainError::NotFound("ghost".into()));
    assert_eq!(store.saves(), 0);
}

// ============================================================
// JSON file store
// ============================================================

#[test]
fn given_json_file_store_when_editing_then_changes_persist() {
    testing::init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data").join("bom.json");
    let svc = BomService::new(Arc::new(JsonFileStore::new(&path)));

    // Act
    let root = svc
        .create(NewPart {
            part_number: "BP-001".into(),
            part_name: "Body".into(),
            ..Default::default()
        })
        .unwrap();
    svc.create(NewPart {
        parent_id: Some(root.id.clone()),
        part_number: "BP-002".into(),
        part_name: "Door".into(),
        ..Default::default()
    })
    .unwrap();

    // Assert: a fresh service over the same file sees both parts
    let reopened = BomService::new(Arc::new(JsonFileStore::new(&path)));
    let forest = reopened.tree().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].record.part_number, "BP-001");
    assert_eq!(forest[0].children[0].record.part_name, "Door");
}
