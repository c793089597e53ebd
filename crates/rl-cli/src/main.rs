//! CLI entry point for relayout.
//!
//! This binary analyzes the reference graph of a project, plans a bulk
//! relocation of its files, and executes or rolls back that relocation.
//!
//! # Usage
//!
//! ```bash
//! relayout [OPTIONS] <COMMAND>
//!
//! # Classify every file and show a summary
//! relayout analyze --root ./project
//!
//! # Check a mapping, then plan and execute it
//! relayout validate --mapping mapping.json
//! relayout plan --mapping mapping.json
//! relayout execute <PLAN_ID>
//!
//! # Undo it
//! relayout rollback <PLAN_ID>
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use rl_core::{Config, ConfigError, FileRecord, MigrationPlan, PathMapping, PlanId};
use rl_graph::{DependencyGraph, DependencyGraphBuilder, GraphAnalyzer, format_cycle};
use rl_migrate::{LayoutOptions, Migrator, ReferenceRewriter, Retention, suggest_mapping};
use rl_scanner::FileClassifier;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Dependency-aware source tree relocation.
///
/// Analyzes the reference graph of a Python/TypeScript/JavaScript project,
/// plans moves with the reference rewrites they require, and executes them
/// with backup-based rollback.
#[derive(Parser)]
#[command(name = "relayout", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Project root directory.
    ///
    /// Defaults to the current directory.
    #[arg(short, long, global = true, env = "RELAYOUT_ROOT")]
    root: Option<Utf8PathBuf>,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "RELAYOUT_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Print listings and reports as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Classify every file and display a summary.
    Analyze {
        /// Show every file.
        #[arg(short, long)]
        detailed: bool,

        /// Write the file listing as CSV. Takes precedence over `--json`.
        #[arg(long)]
        csv: bool,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Show dependency graph statistics and clusters.
    Graph,

    /// List every reference cycle.
    Cycles,

    /// List files so that dependencies come first.
    Order,

    /// Check what a mapping would break, without changing anything.
    Validate {
        /// Mapping file: a JSON object of old path to new path.
        #[arg(short, long)]
        mapping: Utf8PathBuf,
    },

    /// Suggest a frontend/backend layout mapping.
    Suggest {
        /// Directory for frontend files.
        #[arg(long, default_value = "frontend")]
        frontend_dir: String,

        /// Directory for backend files.
        #[arg(long, default_value = "backend")]
        backend_dir: String,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Create a migration plan from a mapping.
    Plan {
        /// Mapping file: a JSON object of old path to new path.
        #[arg(short, long, required_unless_present = "suggest")]
        mapping: Option<Utf8PathBuf>,

        /// Plan the suggested frontend/backend layout instead.
        #[arg(long, conflicts_with = "mapping")]
        suggest: bool,

        /// Free-text description stored with the plan.
        #[arg(short, long, default_value = "relocation")]
        description: String,

        /// Show the moves and reference updates without creating a plan.
        #[arg(long)]
        dry_run: bool,
    },

    /// Execute a pending plan.
    Execute {
        /// Plan identifier.
        id: PlanId,
    },

    /// Undo a completed or failed plan.
    Rollback {
        /// Plan identifier.
        id: PlanId,
    },

    /// List every stored plan.
    List,

    /// Show one plan in detail.
    Show {
        /// Plan identifier.
        id: PlanId,
    },

    /// Show the execution history.
    History,

    /// Mark a plan interrupted mid-execution as failed.
    Recover {
        /// Plan identifier.
        id: PlanId,
    },

    /// Remove old completed and rolled-back plans and their backups.
    Cleanup {
        /// Keep only the newest N plans.
        #[arg(long, conflicts_with = "older_than_days")]
        keep: Option<usize>,

        /// Remove plans older than D days (defaults to the configured
        /// retention).
        #[arg(long)]
        older_than_days: Option<i64>,
    },
}

/// Everything a command needs.
struct Context {
    root: Utf8PathBuf,
    config: Config,
    json: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Logs go to stderr so listings on stdout stay machine-readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},globset=warn,ignore=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds the command context from CLI arguments.
///
/// # Errors
///
/// Returns an error if the root is not a directory or the configuration
/// file cannot be loaded.
fn build_context(cli: &Cli) -> color_eyre::Result<Context> {
    let root = cli.root.clone().unwrap_or_else(|| Utf8PathBuf::from("."));

    if !root.is_dir() {
        return Err(ConfigError::MissingDirectory(root).into());
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    Ok(Context {
        root,
        config,
        json: cli.json,
    })
}

// =============================================================================
// SHARED STEPS
// =============================================================================

/// Classifies every file under the root. Per-file errors are logged.
fn scan(ctx: &Context) -> color_eyre::Result<Vec<FileRecord>> {
    info!(root = %ctx.root, "Scanning");
    let mut classifier = FileClassifier::new(&ctx.root, &ctx.config.scan)?;
    let analysis = classifier.analyze_tree()?;
    for error in &analysis.errors {
        warn!(error = %error, "skipped during scan");
    }
    Ok(analysis.records)
}

fn build_graph(ctx: &Context, records: &[FileRecord]) -> DependencyGraph {
    DependencyGraphBuilder::new(ctx.config.resolve.clone()).build(records)
}

fn load_mapping(path: &Utf8Path) -> color_eyre::Result<PathMapping> {
    PathMapping::load(path).map_err(|e| color_eyre::eyre::eyre!("Failed to load mapping: {}", e))
}

fn open_migrator(ctx: &Context) -> color_eyre::Result<Migrator> {
    Ok(Migrator::open(&ctx.root, ctx.config.clone())?)
}

/// Writes `value` to stdout as pretty JSON.
fn print_json<T: Serialize + ?Sized>(value: &T) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{json}")?;
    Ok(())
}

/// Writes `content` to `output`, or stdout if none.
fn emit(content: &str, output: Option<&Utf8Path>) -> color_eyre::Result<()> {
    if let Some(output_path) = output {
        std::fs::write(output_path.as_std_path(), content)?;
        info!(path = %output_path, "Written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{content}")?;
    }
    Ok(())
}

/// Renders a mapping as the `{"old": "new"}` object it is loaded from.
fn mapping_json(mapping: &PathMapping) -> color_eyre::Result<String> {
    let plain: BTreeMap<&str, &str> = mapping
        .iter()
        .map(|(old, entry)| (old.as_str(), entry.new_path.as_str()))
        .collect();
    let mut json = serde_json::to_string_pretty(&plain)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))?;
    json.push('\n');
    Ok(json)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Classifies the tree and prints a summary, a listing, or CSV.
fn run_analyze(
    ctx: &Context,
    detailed: bool,
    csv: bool,
    output: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    let records = scan(ctx)?;

    if csv {
        return emit(&generate_csv_report(&records), output);
    }
    if ctx.json {
        let mut json = serde_json::to_string_pretty(&records)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))?;
        json.push('\n');
        return emit(&json, output);
    }

    print_analysis_summary(&records);
    if detailed {
        print_detailed_file_list(&records);
    }
    Ok(())
}

/// Prints graph statistics and clusters.
fn run_graph(ctx: &Context) -> color_eyre::Result<()> {
    #[derive(Serialize)]
    struct Report<'a> {
        statistics: &'a rl_graph::GraphStatistics,
        clusters: &'a [rl_graph::Cluster],
    }

    let records = scan(ctx)?;
    let graph = build_graph(ctx, &records);
    let analyzer = GraphAnalyzer::new(&graph);
    let statistics = analyzer.statistics();
    let clusters = analyzer.cluster(&records);

    if ctx.json {
        return print_json(&Report {
            statistics: &statistics,
            clusters: &clusters,
        });
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle)?;
    writeln!(handle, "Dependency Graph")?;
    writeln!(handle, "================")?;
    writeln!(handle)?;
    writeln!(handle, "Files:                  {}", statistics.total_files)?;
    writeln!(handle, "References:             {}", statistics.total_edges)?;
    writeln!(handle, "Cycles:                 {}", statistics.cycle_count)?;
    writeln!(
        handle,
        "Strong components:      {}",
        statistics.strongly_connected_components
    )?;
    writeln!(
        handle,
        "Weak components:        {}",
        statistics.weakly_connected_components
    )?;
    writeln!(
        handle,
        "Average out-degree:     {:.2}",
        statistics.average_out_degree
    )?;
    writeln!(handle, "Max out-degree:         {}", statistics.max_out_degree)?;
    writeln!(handle, "Files referencing none: {}", statistics.isolated_files)?;

    writeln!(handle)?;
    writeln!(handle, "Reference kinds:")?;
    for (kind, count) in &statistics.edge_kind_distribution {
        writeln!(handle, "  {kind:<20} {count}")?;
    }

    writeln!(handle)?;
    writeln!(handle, "Clusters:")?;
    for cluster in &clusters {
        writeln!(
            handle,
            "  {:<10} {} files, {} internal, {} external",
            cluster.bucket,
            cluster.files.len(),
            cluster.internal.len(),
            cluster.external.len()
        )?;
    }
    Ok(())
}

/// Lists every cycle.
fn run_cycles(ctx: &Context) -> color_eyre::Result<()> {
    let records = scan(ctx)?;
    let graph = build_graph(ctx, &records);
    let cycles = GraphAnalyzer::new(&graph).find_cycles();

    if ctx.json {
        return print_json(&cycles);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if cycles.is_empty() {
        writeln!(handle, "No cycles.")?;
    } else {
        writeln!(handle, "Cycles ({}):", cycles.len())?;
        for cycle in &cycles {
            writeln!(handle, "  {}", format_cycle(cycle))?;
        }
    }
    Ok(())
}

/// Lists files dependencies-first.
fn run_order(ctx: &Context) -> color_eyre::Result<()> {
    let records = scan(ctx)?;
    let graph = build_graph(ctx, &records);
    let analyzer = GraphAnalyzer::new(&graph);
    if !analyzer.is_acyclic() {
        warn!("graph has cycles; listing files in discovery order");
    }
    let order = analyzer.topological_order();

    if ctx.json {
        return print_json(&order);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for path in &order {
        writeln!(handle, "{path}")?;
    }
    Ok(())
}

/// Prints the relocation report for a mapping.
fn run_validate(ctx: &Context, mapping_path: &Utf8Path) -> color_eyre::Result<()> {
    let mapping = load_mapping(mapping_path)?;
    let records = scan(ctx)?;
    let graph = build_graph(ctx, &records);
    let report = GraphAnalyzer::new(&graph).validate_relocation(&mapping);

    if ctx.json {
        return print_json(&report);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if report.is_clean() {
        writeln!(handle, "No problems found.")?;
        return Ok(());
    }

    if !report.broken_dependencies.is_empty() {
        writeln!(handle)?;
        writeln!(
            handle,
            "Broken references ({}):",
            report.broken_dependencies.len()
        )?;
        for edge in &report.broken_dependencies {
            writeln!(handle, "  {}: '{}' -> {}", edge.source, edge.raw, edge.target)?;
        }
    }
    if !report.circular_dependencies.is_empty() {
        writeln!(handle)?;
        writeln!(handle, "Cycles ({}):", report.circular_dependencies.len())?;
        for cycle in &report.circular_dependencies {
            writeln!(handle, "  {cycle}")?;
        }
    }
    if !report.cross_boundary_dependencies.is_empty() {
        writeln!(handle)?;
        writeln!(
            handle,
            "Frontend/backend references ({}):",
            report.cross_boundary_dependencies.len()
        )?;
        for edge in &report.cross_boundary_dependencies {
            writeln!(handle, "  {} -> {}", edge.source, edge.target)?;
        }
    }
    if !report.warnings.is_empty() {
        writeln!(handle)?;
        writeln!(handle, "Warnings ({}):", report.warnings.len())?;
        for warning in &report.warnings {
            writeln!(handle, "  {warning}")?;
        }
    }
    Ok(())
}

/// Writes a suggested layout mapping.
fn run_suggest(
    ctx: &Context,
    options: &LayoutOptions,
    output: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    let records = scan(ctx)?;
    let suggestion = suggest_mapping(&records, options);
    for warning in &suggestion.warnings {
        warn!("{warning}");
    }
    info!(moves = suggestion.mapping.len(), "Suggested layout");
    emit(&mapping_json(&suggestion.mapping)?, output)
}

/// Creates a plan, or previews it with `dry_run`.
fn run_plan(
    ctx: &Context,
    mapping_path: Option<&Utf8Path>,
    description: &str,
    dry_run: bool,
) -> color_eyre::Result<()> {
    let records = scan(ctx)?;
    let mapping = match mapping_path {
        Some(path) => load_mapping(path)?,
        None => {
            let suggestion = suggest_mapping(&records, &LayoutOptions::default());
            for warning in &suggestion.warnings {
                warn!("{warning}");
            }
            suggestion.mapping
        }
    };

    if dry_run {
        let rewriter = ReferenceRewriter::new(&ctx.root, &records, ctx.config.resolve.clone());
        let computed = rewriter.compute_updates(&records, &mapping);
        for warning in &computed.warnings {
            warn!("{warning}");
        }
        let log = rewriter.apply(&computed.updates, true)?;
        return print_dry_run(ctx, &mapping, &log);
    }

    let mut migrator = open_migrator(ctx)?;
    let draft = migrator.create_plan(&records, &mapping, description)?;
    for warning in &draft.warnings {
        warn!("{warning}");
    }

    if ctx.json {
        return print_json(&draft.plan);
    }
    print_plan(&draft.plan)
}

/// Executes a plan and prints its result.
fn run_execute(ctx: &Context, id: PlanId) -> color_eyre::Result<()> {
    let mut migrator = open_migrator(ctx)?;
    let result = migrator.execute(id)?;

    if ctx.json {
        return print_json(&result);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Plan {}: {}", result.plan_id, result.status)?;
    writeln!(
        handle,
        "  {}/{} operations in {} ms",
        result.completed_operations, result.total_operations, result.elapsed_ms
    )?;
    if let Some(message) = &result.error_message {
        writeln!(handle, "  Error: {message}")?;
        if result.rollback_available {
            writeln!(handle, "  Run `relayout rollback {}` to undo.", result.plan_id)?;
        }
    }
    Ok(())
}

/// Rolls a plan back and prints the report.
fn run_rollback(ctx: &Context, id: PlanId) -> color_eyre::Result<()> {
    let mut migrator = open_migrator(ctx)?;
    let report = migrator.rollback(id)?;

    if ctx.json {
        return print_json(&report);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "Plan {}: {}",
        report.plan_id,
        if report.success { "rolled back" } else { "rollback incomplete" }
    )?;
    writeln!(handle, "  Files restored:      {}", report.restored)?;
    writeln!(handle, "  Files reverted:      {}", report.reverted_files)?;
    writeln!(handle, "  Directories removed: {}", report.removed_directories)?;
    for failure in &report.failures {
        writeln!(handle, "  Failed: {failure}")?;
    }
    Ok(())
}

/// Lists every stored plan.
fn run_list(ctx: &Context) -> color_eyre::Result<()> {
    #[derive(Serialize)]
    struct Summary<'a> {
        id: PlanId,
        status: rl_core::PlanStatus,
        created_at: chrono::DateTime<chrono::Utc>,
        operations: usize,
        description: &'a str,
    }

    let migrator = open_migrator(ctx)?;
    let plans = migrator.plans();

    if ctx.json {
        let summaries: Vec<Summary<'_>> = plans
            .iter()
            .map(|plan| Summary {
                id: plan.id,
                status: plan.status,
                created_at: plan.created_at,
                operations: plan.operations.len(),
                description: &plan.description,
            })
            .collect();
        return print_json(&summaries);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if plans.is_empty() {
        writeln!(handle, "No plans.")?;
    }
    for plan in plans {
        writeln!(
            handle,
            "{}  {:<11}  {}  {:>4} ops  {}",
            plan.id,
            plan.status,
            plan.created_at.format("%Y-%m-%d %H:%M:%S"),
            plan.operations.len(),
            plan.description
        )?;
    }
    Ok(())
}

/// Shows one plan.
fn run_show(ctx: &Context, id: PlanId) -> color_eyre::Result<()> {
    let migrator = open_migrator(ctx)?;
    let plan = migrator
        .plan(id)
        .ok_or_else(|| color_eyre::eyre::eyre!("Plan {} not found", id))?;

    if ctx.json {
        return print_json(plan);
    }
    print_plan(plan)
}

/// Shows every execution result.
fn run_history(ctx: &Context) -> color_eyre::Result<()> {
    let migrator = open_migrator(ctx)?;
    let history = migrator.history();

    if ctx.json {
        return print_json(history);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if history.is_empty() {
        writeln!(handle, "No executions.")?;
    }
    for result in history {
        writeln!(
            handle,
            "{}  {}  {:<11}  {}/{} ops  {} ms{}",
            result.finished_at.format("%Y-%m-%d %H:%M:%S"),
            result.plan_id,
            result.status,
            result.completed_operations,
            result.total_operations,
            result.elapsed_ms,
            result
                .error_message
                .as_deref()
                .map(|message| format!("  ({message})"))
                .unwrap_or_default()
        )?;
    }
    Ok(())
}

/// Marks an interrupted plan as failed.
fn run_recover(ctx: &Context, id: PlanId) -> color_eyre::Result<()> {
    let mut migrator = open_migrator(ctx)?;
    let result = migrator.mark_interrupted(id)?;

    if ctx.json {
        return print_json(&result);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "Plan {} marked {}; {} of {} operations had completed.",
        id, result.status, result.completed_operations, result.total_operations
    )?;
    Ok(())
}

/// Prunes old plans.
fn run_cleanup(
    ctx: &Context,
    keep: Option<usize>,
    older_than_days: Option<i64>,
) -> color_eyre::Result<()> {
    let retention = match (keep, older_than_days) {
        (Some(keep), _) => Retention::KeepLatest(keep),
        (None, Some(days)) => Retention::OlderThan(TimeDelta::days(days)),
        (None, None) => Retention::OlderThan(TimeDelta::days(i64::from(
            ctx.config.store.retention_days,
        ))),
    };

    let mut migrator = open_migrator(ctx)?;
    let removed = migrator.cleanup(retention)?;

    if ctx.json {
        return print_json(&removed);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Removed {} plan(s).", removed.len())?;
    for id in &removed {
        writeln!(handle, "  {id}")?;
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints a summary of classified files.
fn print_analysis_summary(records: &[FileRecord]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *categories.entry(record.category.label()).or_insert(0) += 1;
    }
    let tests = records.iter().filter(|r| r.is_test).count();
    let configs = records.iter().filter(|r| r.is_config).count();
    let references: usize = records.iter().map(FileRecord::reference_count).sum();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Analysis Summary");
    let _ = writeln!(handle, "================");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Total files: {}", records.len());
    for (category, count) in &categories {
        let _ = writeln!(handle, "  {category:<22} {count}");
    }
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Test files:   {tests}");
    let _ = writeln!(handle, "Config files: {configs}");
    let _ = writeln!(handle, "References:   {references}");
}

/// Prints every file with its category and counts.
fn print_detailed_file_list(records: &[FileRecord]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Files ({}):", records.len());
    for record in records {
        let _ = writeln!(
            handle,
            "  {:<50} {:<22} refs={} exports={}{}",
            record.path,
            record.category.label(),
            record.reference_count(),
            record.exports.len(),
            if record.is_test { " [test]" } else { "" }
        );
    }
}

/// Prints the moves and reference updates a mapping would perform.
fn print_dry_run(
    ctx: &Context,
    mapping: &PathMapping,
    log: &rl_migrate::ChangeLog,
) -> color_eyre::Result<()> {
    #[derive(Serialize)]
    struct Preview<'a> {
        moves: BTreeMap<&'a str, &'a str>,
        updates: &'a rl_migrate::ChangeLog,
    }

    if ctx.json {
        return print_json(&Preview {
            moves: mapping
                .iter()
                .map(|(old, entry)| (old.as_str(), entry.new_path.as_str()))
                .collect(),
            updates: log,
        });
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Moves ({}):", mapping.len())?;
    for (old, entry) in mapping.iter() {
        writeln!(handle, "  {old} -> {}", entry.new_path)?;
    }
    writeln!(handle)?;
    writeln!(handle, "Reference updates:")?;
    for (file, lines) in log {
        writeln!(handle, "  {file}")?;
        for line in lines {
            writeln!(handle, "    {line}")?;
        }
    }
    Ok(())
}

/// Prints a plan with its operations and updates.
fn print_plan(plan: &MigrationPlan) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle, "Plan {}", plan.id)?;
    writeln!(handle, "  Description: {}", plan.description)?;
    writeln!(handle, "  Status:      {}", plan.status)?;
    writeln!(
        handle,
        "  Created:     {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(handle)?;
    writeln!(handle, "Operations ({}):", plan.operations.len())?;
    for op in &plan.operations {
        let mark = match (op.completed, &op.error) {
            (true, _) => "x",
            (false, Some(_)) => "!",
            (false, None) => " ",
        };
        writeln!(handle, "  [{mark}] {}", op.describe())?;
        if let Some(error) = &op.error {
            writeln!(handle, "      {error}")?;
        }
    }
    if !plan.updates.is_empty() {
        writeln!(handle)?;
        writeln!(handle, "Reference updates ({}):", plan.updates.len())?;
        for update in &plan.updates {
            writeln!(handle, "  {}  {}", update.file, update.log_line())?;
        }
    }
    Ok(())
}

/// Generates a CSV listing of classified files.
fn generate_csv_report(records: &[FileRecord]) -> String {
    use std::fmt::Write;

    let mut output =
        String::from("path,category,size,is_test,is_config,reference_count,export_count\n");

    for record in records {
        let escaped_path = escape_csv(record.path.as_str());
        let category = record.category.label();

        let _ = writeln!(
            output,
            "{escaped_path},{category},{},{},{},{},{}",
            record.size,
            record.is_test,
            record.is_config,
            record.reference_count(),
            record.exports.len()
        );
    }

    output
}

/// Escapes a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve root and configuration
    let ctx = build_context(&cli)?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Analyze {
            detailed,
            csv,
            output,
        } => run_analyze(&ctx, *detailed, *csv, output.as_deref()),
        Commands::Graph => run_graph(&ctx),
        Commands::Cycles => run_cycles(&ctx),
        Commands::Order => run_order(&ctx),
        Commands::Validate { mapping } => run_validate(&ctx, mapping),
        Commands::Suggest {
            frontend_dir,
            backend_dir,
            output,
        } => {
            let options = LayoutOptions {
                frontend_dir: frontend_dir.clone(),
                backend_dir: backend_dir.clone(),
            };
            run_suggest(&ctx, &options, output.as_deref())
        }
        Commands::Plan {
            mapping,
            suggest: _,
            description,
            dry_run,
        } => run_plan(&ctx, mapping.as_deref(), description, *dry_run),
        Commands::Execute { id } => run_execute(&ctx, *id),
        Commands::Rollback { id } => run_rollback(&ctx, *id),
        Commands::List => run_list(&ctx),
        Commands::Show { id } => run_show(&ctx, *id),
        Commands::History => run_history(&ctx),
        Commands::Recover { id } => run_recover(&ctx, *id),
        Commands::Cleanup {
            keep,
            older_than_days,
        } => run_cleanup(&ctx, *keep, *older_than_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("a/b.ts"), "a/b.ts");
        assert_eq!(escape_csv("a,b.ts"), "\"a,b.ts\"");
        assert_eq!(escape_csv("say \"hi\".py"), "\"say \"\"hi\"\".py\"");
    }

    #[test]
    fn test_csv_report() {
        let mut record = FileRecord::new(
            "app/main.py".into(),
            rl_core::FileCategory::BackendSource,
        );
        record.size = 12;
        record.references.push("os".to_owned());
        insta::assert_snapshot!(generate_csv_report(&[record]), @r"
        path,category,size,is_test,is_config,reference_count,export_count
        app/main.py,backend_python,12,false,false,1,0
        ");
    }

    #[test]
    fn test_mapping_json_round_trips() {
        let mut mapping = PathMapping::new();
        mapping
            .insert(
                Utf8Path::new("main.py"),
                Utf8Path::new("backend/main.py"),
                rl_core::FileCategory::BackendSource,
            )
            .unwrap();
        let json = mapping_json(&mapping).unwrap();
        let loaded = PathMapping::from_json_str(&json).unwrap();
        assert_eq!(
            loaded.new_path(Utf8Path::new("main.py")).unwrap().as_str(),
            "backend/main.py"
        );
    }
}
