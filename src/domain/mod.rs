//! Domain layer: part records, hierarchy reconstruction, metric formatting
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod format;
pub mod status;
pub mod summary;

pub use arena::BomArena;
pub use builder::{build_tree, count_nodes, find_orphans, sort_for_display, TreeBuilder, TreeNode};
pub use entities::*;
pub use error::DomainError;
pub use status::{classify, Classification, MetricCategory, Severity, StatusValue};
pub use summary::MetricsSummary;
