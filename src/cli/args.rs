//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::domain::ItemStatus;

/// Automotive bill-of-materials dashboard: part hierarchy, metrics and status in the terminal
#[derive(Parser, Debug)]
#[command(name = "bomdash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Part data file (overrides config)
    #[arg(short, long, global = true, env = "BOMDASH_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the part hierarchy as a tree
    Tree {
        /// Expand this many levels (default: display.expand_depth)
        #[arg(short, long)]
        depth: Option<usize>,
        /// Expand every level
        #[arg(short, long, conflicts_with = "depth")]
        all: bool,
        /// Show part ids
        #[arg(long)]
        ids: bool,
    },

    /// Show one part with metrics, engineering data and evaluations
    Show {
        /// Part id
        id: String,
    },

    /// Find parts by part number or name
    Search {
        /// Case-insensitive substring
        term: String,
    },

    /// List parts on one level
    Level {
        /// Level, 0 for top-level assemblies
        level: i32,
    },

    /// List direct children of a part
    Children {
        /// Parent part id
        id: String,
    },

    /// Show aggregated metrics
    Summary,

    /// List parts whose parent does not exist
    Orphans,

    /// Add a part
    Add(AddArgs),

    /// Edit a part
    Update(UpdateArgs),

    /// Create or edit the metrics of a part
    Metrics(MetricsArgs),

    /// Remove a part and all of its descendants
    Rm {
        /// Part id
        id: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Part number, e.g. BP-001
    pub part_number: String,
    /// Part name
    pub part_name: String,
    /// Parent part id (omit for a top-level assembly)
    #[arg(short, long)]
    pub parent: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Revision (default: A)
    #[arg(short, long)]
    pub revision: Option<String>,
    #[arg(long)]
    pub supplier_name: Option<String>,
    #[arg(long)]
    pub supplier_code: Option<String>,
    /// in_development, released or obsolete
    #[arg(short, long, default_value = "in_development")]
    pub status: ItemStatus,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Part id
    pub id: String,
    #[arg(long)]
    pub part_number: Option<String>,
    #[arg(long)]
    pub part_name: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub revision: Option<String>,
    #[arg(long)]
    pub supplier_name: Option<String>,
    #[arg(long)]
    pub supplier_code: Option<String>,
    #[arg(short, long)]
    pub status: Option<ItemStatus>,
    #[arg(long)]
    pub sort_order: Option<i32>,
    /// Move below another part
    #[arg(short, long, conflicts_with = "root")]
    pub parent: Option<String>,
    /// Move to the top level
    #[arg(long)]
    pub root: bool,
}

#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Part id
    pub id: String,
    #[arg(long)]
    pub cost: Option<f64>,
    #[arg(long)]
    pub cost_target: Option<f64>,
    /// ISO currency code
    #[arg(long)]
    pub currency: Option<String>,
    /// on_target, over_budget or under_review
    #[arg(long)]
    pub cost_status: Option<String>,
    #[arg(long)]
    pub weight: Option<f64>,
    #[arg(long)]
    pub weight_target: Option<f64>,
    #[arg(long)]
    pub weight_unit: Option<String>,
    /// on_target, overweight or under_review
    #[arg(long)]
    pub weight_status: Option<String>,
    #[arg(long)]
    pub tests_total: Option<u32>,
    #[arg(long)]
    pub tests_met: Option<u32>,
    /// all_met, partial or failed
    #[arg(long)]
    pub performance_status: Option<String>,
    #[arg(long)]
    pub drawings_required: Option<u32>,
    #[arg(long)]
    pub drawings_released: Option<u32>,
    /// complete, partial or missing
    #[arg(long)]
    pub drawing_status: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
