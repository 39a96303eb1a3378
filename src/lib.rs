//! bomdash: automotive bill-of-materials hierarchy and metrics
//!
//! Layers, innermost first:
//! - `domain`: part records, tree builder, formatting and status rules (no I/O)
//! - `application`: services over a part store
//! - `infrastructure`: stores and service wiring
//! - `cli`: argument parsing, rendering and dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
