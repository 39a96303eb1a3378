//! Tests for building the part forest from flat records
//!
//! Covered properties:
//! - every input record appears at most once in the forest
//! - children keep their relative input order
//! - root depth is the record's level, child depth is parent depth + 1
//! - a record with an unresolvable parent is dropped with its subtree
//! - the builder never mutates its input

use rstest::rstest;

use bomdash::domain::{
    build_tree, count_nodes, find_orphans, sort_for_display, PartRecord, TreeBuilder, TreeNode,
};
use bomdash::util::testing;

fn ids(nodes: &[TreeNode]) -> Vec<&str> {
    nodes.iter().map(TreeNode::id).collect()
}

fn preorder(forest: &[TreeNode]) -> Vec<(&str, i32)> {
    forest
        .iter()
        .flat_map(TreeNode::iter)
        .map(|n| (n.id(), n.depth))
        .collect()
}

// ============================================================
// basic shapes
// ============================================================

#[test]
fn given_root_with_two_children_when_building_then_links_in_input_order() {
    testing::init_test_setup();
    // Arrange
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("B", Some("A"), 1, 0),
        PartRecord::new("C", Some("A"), 1, 1),
    ];

    // Act
    let forest = build_tree(&records);

    // Assert
    assert_eq!(ids(&forest), vec!["A"]);
    assert_eq!(forest[0].depth, 0);
    assert_eq!(ids(&forest[0].children), vec!["B", "C"]);
    assert!(forest[0].children.iter().all(|c| c.depth == 1));
    assert!(forest[0].children.iter().all(|c| c.children.is_empty()));
    assert_eq!(count_nodes(&forest), records.len());
}

#[test]
fn given_empty_input_when_building_then_returns_empty_forest() {
    let forest = build_tree(&[]);
    assert!(forest.is_empty());
    assert_eq!(count_nodes(&forest), 0);
}

#[test]
fn given_child_before_parent_when_building_then_still_links() {
    // Arrange: parent appears after its child in input order
    let records = vec![
        PartRecord::new("B", Some("A"), 1, 0),
        PartRecord::new("A", None, 0, 0),
    ];

    // Act
    let forest = build_tree(&records);

    // Assert
    assert_eq!(preorder(&forest), vec![("A", 0), ("B", 1)]);
}

#[test]
fn given_several_roots_when_building_then_keeps_root_order() {
    let records = vec![
        PartRecord::new("door", None, 0, 1),
        PartRecord::new("body", None, 0, 0),
        PartRecord::new("hinge", Some("door"), 1, 0),
    ];

    let forest = build_tree(&records);

    assert_eq!(ids(&forest), vec!["door", "body"]);
    assert_eq!(forest[0].node_count(), 2);
}

#[rstest]
#[case(0, vec![("A", 0), ("B", 1), ("C", 2)])]
#[case(2, vec![("A", 2), ("B", 3), ("C", 4)])]
fn given_root_level_when_building_then_depth_counts_from_root_level(
    #[case] root_level: i32,
    #[case] expected: Vec<(&str, i32)>,
) {
    // Arrange: stored levels of the children are deliberately inconsistent
    let records = vec![
        PartRecord::new("A", None, root_level, 0),
        PartRecord::new("B", Some("A"), 7, 0),
        PartRecord::new("C", Some("B"), 0, 0),
    ];

    // Act
    let forest = build_tree(&records);

    // Assert
    assert_eq!(preorder(&forest), expected);
}

// ============================================================
// ordering
// ============================================================

#[test]
fn given_records_sorted_for_display_when_building_then_siblings_follow_sort_order() {
    // Arrange
    let mut records = vec![
        PartRecord::new("B2", Some("A"), 1, 2),
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("B0", Some("A"), 1, 0),
        PartRecord::new("B1", Some("A"), 1, 1),
    ];
    sort_for_display(&mut records);

    // Act
    let forest = build_tree(&records);

    // Assert
    assert_eq!(ids(&forest[0].children), vec!["B0", "B1", "B2"]);
}

#[test]
fn given_unsorted_records_when_building_then_does_not_reorder_siblings() {
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("late", Some("A"), 1, 9),
        PartRecord::new("early", Some("A"), 1, 0),
    ];

    let forest = build_tree(&records);

    assert_eq!(ids(&forest[0].children), vec!["late", "early"]);
}

// ============================================================
// orphans, duplicates, cycles
// ============================================================

#[test]
fn given_child_of_missing_parent_when_building_then_only_linked_child_remains() {
    // Arrange
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("B", Some("A"), 1, 0),
        PartRecord::new("C", Some("X"), 1, 0),
    ];

    // Act
    let forest = build_tree(&records);

    // Assert
    assert_eq!(ids(&forest), vec!["A"]);
    assert_eq!(forest[0].depth, 0);
    assert_eq!(ids(&forest[0].children), vec!["B"]);
    assert_eq!(forest[0].children[0].depth, 1);
    assert!(forest[0].children[0].children.is_empty());
    assert_eq!(count_nodes(&forest), 2);
}

#[test]
fn given_orphan_with_descendants_when_building_then_drops_whole_subtree() {
    testing::init_test_setup();
    // Arrange: C points at a missing parent X, D hangs below C
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("C", Some("X"), 1, 0),
        PartRecord::new("D", Some("C"), 2, 0),
    ];
    let mut builder = TreeBuilder::new();

    // Act
    let forest = builder.build(&records);

    // Assert
    assert_eq!(preorder(&forest), vec![("A", 0)]);
    assert_eq!(builder.dropped_orphans(), 1);
    let orphans: Vec<&str> = find_orphans(&records).iter().map(|r| r.id.as_str()).collect();
    assert_eq!(orphans, vec!["C"]);
}

#[test]
fn given_duplicate_ids_when_building_then_last_record_wins() {
    testing::init_test_setup();
    // Arrange
    let mut first = PartRecord::new("B", Some("A"), 1, 0);
    first.part_name = "first".into();
    let mut second = PartRecord::new("B", Some("A"), 1, 1);
    second.part_name = "second".into();
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        first,
        PartRecord::new("C", Some("B"), 2, 0),
        second,
    ];
    let mut builder = TreeBuilder::new();

    // Act
    let forest = builder.build(&records);

    // Assert
    assert_eq!(builder.dropped_duplicates(), 1);
    assert_eq!(count_nodes(&forest), 3);
    let b = forest[0].find("B").expect("B linked");
    assert_eq!(b.record.part_name, "second");
    assert_eq!(ids(&b.children), vec!["C"]);
}

#[test]
fn given_parent_cycle_when_building_then_cycle_is_unreachable() {
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("X", Some("Y"), 1, 0),
        PartRecord::new("Y", Some("X"), 1, 0),
    ];

    let forest = build_tree(&records);

    assert_eq!(preorder(&forest), vec![("A", 0)]);
}

#[test]
fn given_self_parent_when_building_then_record_is_dropped() {
    let records = vec![PartRecord::new("S", Some("S"), 0, 0)];

    let forest = build_tree(&records);

    assert!(forest.is_empty());
}

// ============================================================
// general properties
// ============================================================

#[test]
fn given_mixed_input_when_building_then_each_record_appears_at_most_once() {
    // Arrange
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("B", Some("A"), 1, 0),
        PartRecord::new("C", Some("B"), 2, 0),
        PartRecord::new("D", Some("missing"), 1, 0),
        PartRecord::new("E", None, 0, 1),
        PartRecord::new("F", Some("E"), 1, 0),
    ];

    // Act
    let forest = build_tree(&records);
    let seen = preorder(&forest);

    // Assert
    assert!(count_nodes(&forest) <= records.len());
    assert_eq!(count_nodes(&forest), 5);
    let mut unique: Vec<&str> = seen.iter().map(|(id, _)| *id).collect();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), seen.len());
}

#[test]
fn given_input_when_building_then_input_is_untouched() {
    let records = vec![
        PartRecord::new("A", None, 0, 0),
        PartRecord::new("B", Some("A"), 5, 0),
    ];
    let before = records.clone();

    let _ = build_tree(&records);

    assert_eq!(records, before);
}

#[test]
fn given_deep_chain_when_building_then_does_not_overflow() {
    // Arrange: 2k levels deep
    let mut records = vec![PartRecord::new("n0", None, 0, 0)];
    for i in 1..2_000 {
        let parent = format!("n{}", i - 1);
        records.push(PartRecord::new(&format!("n{i}"), Some(&parent), i, 0));
    }

    // Act
    let forest = build_tree(&records);

    // Assert
    assert_eq!(forest.len(), 1);
    assert_eq!(count_nodes(&forest), records.len());
    assert_eq!(forest[0].height(), 2_000);
}
