//! Application services

pub mod bom;

pub use bom::{BomService, MetricsUpdate, NewPart, ParentChange, PartUpdate};
