//! Command dispatch: one function per subcommand

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{MetricsUpdate, NewPart, ParentChange, PartUpdate};
use crate::cli::args::{AddArgs, Cli, Commands, ConfigCommands, MetricsArgs, UpdateArgs};
use crate::cli::output;
use crate::cli::render::{record_row, render_forest, TreeView};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::format::{
    format_currency, format_date, format_date_time, format_file_size, format_percentage,
    format_ratio, format_weight, progress_percent,
};
use crate::domain::{classify, count_nodes, MetricCategory, MetricsSummary, PartRecord, Severity};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed command line.
pub fn execute(cli: &Cli) -> CliResult<()> {
    let command = match &cli.command {
        Some(Commands::Completion { shell }) => return completion(*shell),
        Some(command) => command,
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| InfraError::io("print help", e))?;
            return Ok(());
        }
    };

    let cwd = std::env::current_dir().map_err(|e| InfraError::io("get current directory", e))?;
    let mut settings = Settings::load(Some(&cwd))?;
    if let Some(file) = &cli.file {
        settings.data_file = cwd.join(file);
    }
    if !settings.display.color {
        colored::control::set_override(false);
    }
    debug!(data_file = %settings.data_file.display(), "settings loaded");

    let container = ServiceContainer::new(settings);
    dispatch(&container, command, &cwd)
}

fn dispatch(container: &ServiceContainer, command: &Commands, cwd: &Path) -> CliResult<()> {
    match command {
        Commands::Tree { depth, all, ids } => tree(container, *depth, *all, *ids),
        Commands::Show { id } => show(container, id),
        Commands::Search { term } => list(container.bom.search(term)?, "no matching parts"),
        Commands::Level { level } => {
            list(container.bom.items_by_level(*level)?, "no parts on this level")
        }
        Commands::Children { id } => children(container, id),
        Commands::Summary => summary(container),
        Commands::Orphans => list(container.bom.orphans()?, "no orphaned parts"),
        Commands::Add(args) => add(container, args),
        Commands::Update(args) => update(container, args),
        Commands::Metrics(args) => metrics(container, args),
        Commands::Rm { id } => remove(container, id),
        Commands::Config { command } => config(container, command, cwd),
        Commands::Completion { shell } => completion(*shell),
    }
}

#[instrument(skip(container))]
fn tree(container: &ServiceContainer, depth: Option<usize>, all: bool, ids: bool) -> CliResult<()> {
    let forest = container.bom.tree()?;
    if forest.is_empty() {
        output::info("no parts");
        return Ok(());
    }

    let display = &container.settings.display;
    let view = TreeView {
        display,
        expand_depth: if all {
            None
        } else {
            Some(depth.unwrap_or(display.expand_depth))
        },
        show_ids: ids,
    };
    output::info(&render_forest(&forest, &view));

    let shown = count_nodes(&forest);
    let orphans = container.bom.orphans()?.len();
    if orphans > 0 {
        output::warning(&format!(
            "{orphans} part(s) reference a missing parent and are hidden (see `bomdash orphans`)"
        ));
    }
    debug!(shown, orphans, "tree rendered");
    Ok(())
}

#[instrument(skip(container))]
fn show(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let part = container.bom.item(id)?;

    output::header(&part);
    output::field("id", &part.id);
    output::field("parent", part.parent_id.as_deref().unwrap_or("-"));
    output::field("level", &part.level);
    output::field("revision", &part.revision);
    output::field("status", &output::paint(&part.status.label(), part.status.tone()));
    if let Some(description) = &part.description {
        output::field("description", description);
    }
    output::field(
        "supplier",
        &match (&part.supplier_name, &part.supplier_code) {
            (Some(name), Some(code)) => format!("{name} ({code})"),
            (Some(name), None) => name.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => "-".to_string(),
        },
    );
    output::field("created", &format_date(Some(part.created_at.as_str())));
    output::field("updated", &format_date_time(Some(part.updated_at.as_str())));

    show_metrics(&part);
    show_engineering_data(&part);
    show_evaluations(&part);

    let children = container.bom.children(id)?;
    if !children.is_empty() {
        output::header(&format!("Children ({})", children.len()));
        for child in &children {
            output::detail(&record_row(child));
        }
    }
    Ok(())
}

fn show_metrics(part: &PartRecord) {
    let Some(m) = &part.metrics else {
        return;
    };
    output::header("Metrics");

    let cost = classify(m.cost_status.as_deref(), MetricCategory::Cost);
    output::field(
        "cost",
        &format!(
            "{} / target {} {}",
            format_currency(m.cost_current, &m.cost_currency),
            format_currency(m.cost_target, &m.cost_currency),
            output::badge(&cost)
        ),
    );

    let weight = classify(m.weight_status.as_deref(), MetricCategory::Weight);
    output::field(
        "weight",
        &format!(
            "{} / target {} {}",
            format_weight(m.weight_current, &m.weight_unit),
            format_weight(m.weight_target, &m.weight_unit),
            output::badge(&weight)
        ),
    );

    let tests = classify(m.performance_status.as_deref(), MetricCategory::Performance);
    output::field(
        "tests",
        &format!(
            "{} ({}) {}",
            format_ratio(m.performance_tests_met, m.performance_tests_total, "Passed"),
            format_percentage(Some(progress_percent(
                m.performance_tests_met,
                m.performance_tests_total
            ))),
            output::badge(&tests)
        ),
    );

    let drawings = classify(m.drawing_status.as_deref(), MetricCategory::Drawing);
    output::field(
        "drawings",
        &format!(
            "{} ({}) {}",
            format_ratio(m.drawings_released, m.drawings_required, "Released"),
            format_percentage(Some(progress_percent(
                m.drawings_released,
                m.drawings_required
            ))),
            output::badge(&drawings)
        ),
    );
    output::field("updated", &format_date_time(Some(m.updated_at.as_str())));
}

fn show_engineering_data(part: &PartRecord) {
    if part.engineering_data.is_empty() {
        return;
    }
    output::header("Engineering data");
    for link in &part.engineering_data {
        output::detail(&format!(
            "{:<12} {:<28} v{:<4} {:>8}  {}  {}",
            link.data_type.label(),
            link.file_name.as_deref().unwrap_or("-"),
            link.version,
            format_file_size(link.file_size_mb),
            link.status.as_str(),
            format_date(Some(link.updated_at.as_str())),
        ));
    }
}

fn show_evaluations(part: &PartRecord) {
    if part.performance_evaluations.is_empty() {
        return;
    }
    output::header("Performance evaluations");
    for eval in &part.performance_evaluations {
        let met = if eval.requirement_met { "met" } else { "not met" };
        output::detail(&format!(
            "{:<22} {:<28} {}  score {}  {}  {}",
            eval.test_type.label(),
            eval.test_name,
            output::paint(eval.test_status.as_str(), eval.test_status.severity()),
            format_percentage(eval.test_score),
            met,
            format_date(eval.test_date.as_deref()),
        ));
    }
}

fn list(records: Vec<PartRecord>, empty: &str) -> CliResult<()> {
    if records.is_empty() {
        output::info(empty);
        return Ok(());
    }
    for record in &records {
        output::info(&record_row(record));
    }
    Ok(())
}

fn children(container: &ServiceContainer, id: &str) -> CliResult<()> {
    // Distinguish "no children" from "no such part"
    container.bom.item(id)?;
    list(container.bom.children(id)?, "no children")
}

#[instrument(skip(container))]
fn summary(container: &ServiceContainer) -> CliResult<()> {
    let forest = container.bom.tree()?;
    let summary = MetricsSummary::from_forest(&forest);
    let currency = &container.settings.currency;
    let unit = &container.settings.weight_unit;

    output::header("BOM summary");
    output::field(
        "parts",
        &format!(
            "{} ({} with metrics)",
            summary.total_parts, summary.parts_with_metrics
        ),
    );
    output::field(
        "cost",
        &format!(
            "{} / target {}  {}",
            format_currency(Some(summary.cost_current), currency),
            format_currency(Some(summary.cost_target), currency),
            severity_counts(&summary.cost_status, summary.cost_severity())
        ),
    );
    output::field(
        "weight",
        &format!(
            "{} / target {}  {}",
            format_weight(Some(summary.weight_current), unit),
            format_weight(Some(summary.weight_target), unit),
            severity_counts(&summary.weight_status, summary.weight_severity())
        ),
    );
    output::field(
        "tests",
        &format!(
            "{} ({})",
            format_ratio(summary.tests_met, summary.tests_total, "Passed"),
            format_percentage(Some(progress_percent(summary.tests_met, summary.tests_total)))
        ),
    );
    output::field(
        "drawings",
        &format!(
            "{} ({})",
            format_ratio(summary.drawings_released, summary.drawings_required, "Released"),
            format_percentage(Some(progress_percent(
                summary.drawings_released,
                summary.drawings_required
            )))
        ),
    );
    Ok(())
}

fn severity_counts(
    counts: &BTreeMap<Severity, usize>,
    overall: Severity,
) -> String {
    let text = counts
        .iter()
        .map(|(severity, n)| format!("{n} {severity}"))
        .join(", ");
    output::paint(&text, overall).to_string()
}

#[instrument(skip(container, args))]
fn add(container: &ServiceContainer, args: &AddArgs) -> CliResult<()> {
    let part = container.bom.create(NewPart {
        parent_id: args.parent.clone(),
        part_number: args.part_number.clone(),
        part_name: args.part_name.clone(),
        description: args.description.clone(),
        revision: args.revision.clone(),
        supplier_name: args.supplier_name.clone(),
        supplier_code: args.supplier_code.clone(),
        status: args.status,
    })?;
    output::action("Added", &format!("{} ({})", part, part.id));
    Ok(())
}

#[instrument(skip(container, args), fields(id = %args.id))]
fn update(container: &ServiceContainer, args: &UpdateArgs) -> CliResult<()> {
    let parent = match (&args.parent, args.root) {
        (Some(parent), _) => Some(ParentChange::Under(parent.clone())),
        (None, true) => Some(ParentChange::Root),
        (None, false) => None,
    };
    let changes = PartUpdate {
        part_number: args.part_number.clone(),
        part_name: args.part_name.clone(),
        description: args.description.clone(),
        revision: args.revision.clone(),
        supplier_name: args.supplier_name.clone(),
        supplier_code: args.supplier_code.clone(),
        status: args.status,
        sort_order: args.sort_order,
        parent,
    };
    let part = container.bom.update(&args.id, changes)?;
    output::action("Updated", &part);
    Ok(())
}

#[instrument(skip(container, args), fields(id = %args.id))]
fn metrics(container: &ServiceContainer, args: &MetricsArgs) -> CliResult<()> {
    let changes = MetricsUpdate {
        cost_current: args.cost,
        cost_target: args.cost_target,
        cost_currency: args.currency.clone(),
        cost_status: args.cost_status.clone(),
        weight_current: args.weight,
        weight_target: args.weight_target,
        weight_unit: args.weight_unit.clone(),
        weight_status: args.weight_status.clone(),
        performance_tests_total: args.tests_total,
        performance_tests_met: args.tests_met,
        performance_status: args.performance_status.clone(),
        drawings_required: args.drawings_required,
        drawings_released: args.drawings_released,
        drawing_status: args.drawing_status.clone(),
    };
    let metrics = container.bom.update_metrics(&args.id, changes)?;
    output::action(
        "Metrics updated",
        &format!(
            "{}  {}",
            format_currency(metrics.cost_current, &metrics.cost_currency),
            format_weight(metrics.weight_current, &metrics.weight_unit)
        ),
    );
    Ok(())
}

#[instrument(skip(container))]
fn remove(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let part = container.bom.item(id)?;
    let removed = container.bom.delete(id)?;
    output::action("Removed", &format!("{part} ({removed} part(s) including descendants)"));
    Ok(())
}

fn config(container: &ServiceContainer, command: &ConfigCommands, cwd: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(cwd)
            };
            write_template(&path)?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
        ConfigCommands::Path => {
            let global = global_config_path();
            output::field("global", &describe(global.as_deref()));
            output::field("local", &describe(Some(local_config_path(cwd).as_path())));
            output::field("data", &describe(Some(container.settings.data_file.as_path())));
            Ok(())
        }
    }
}

fn write_template(path: &Path) -> CliResult<()> {
    if path.exists() {
        return Err(CliError::Usage(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
    }
    fs::write(path, Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

fn describe(path: Option<&Path>) -> String {
    match path {
        Some(p) if p.exists() => p.display().to_string(),
        Some(p) => format!("{} (not found)", p.display()),
        None => "-".to_string(),
    }
}

fn completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
