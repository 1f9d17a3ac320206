use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use patchlist_core::append::append_missing_patches;
use patchlist_core::assets::list_dir;
use patchlist_core::maintain::{SortOptions, check_catalog, sort_catalog};
use patchlist_core::runtime::{
    PathOverrides, ResolutionContext, ResolvedPaths, inspect_runtime, normalize_for_display,
    resolve_paths,
};
use patchlist_core::validate::{UsageCount, Warning};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "patchlist",
    version,
    about = "Validate and canonicalize a catalog of ROM patches"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Catalog file to operate on")]
    catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            config: cli.config.clone(),
            catalog: cli.catalog.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Validate, add placeholders for new patches, and rewrite the catalog sorted")]
    Sort(SortArgs),
    #[command(about = "Validate the catalog and assets without writing")]
    Check(JsonArgs),
    #[command(about = "Interactively describe patch files missing from the catalog")]
    Add,
    #[command(about = "Author and tag usage across the catalog")]
    Stats(JsonArgs),
    #[command(about = "Show the resolved layout and which paths exist")]
    Status,
}

#[derive(Debug, Args)]
struct SortArgs {
    #[arg(long, help = "Report what would change without writing")]
    dry_run: bool,
    #[arg(long, help = "Print a unified diff of the rewrite")]
    diff: bool,
}

#[derive(Debug, Args)]
struct JsonArgs {
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Sort(args)) => run_sort(&runtime, args),
        Some(Commands::Check(args)) => run_check(&runtime, args),
        Some(Commands::Add) => run_add(&runtime),
        Some(Commands::Stats(args)) => run_stats(&runtime, args),
        Some(Commands::Status) => run_status(&runtime),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Logs go to stderr so reports on stdout stay clean. `RUST_LOG` wins over `--log-level`.
fn initialize_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_sort(runtime: &RuntimeOptions, args: SortArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = sort_catalog(
        &paths,
        &SortOptions {
            dry_run: args.dry_run,
            diff: args.diff,
        },
    )?;

    println!("catalog sort");
    println!("catalog_path: {}", report.catalog_path);
    println!("entries: {}", report.entries);
    println!("added_placeholders: {}", report.added_placeholders.len());
    for filename in &report.added_placeholders {
        println!("  - {filename}");
    }
    println!("changed: {}", format_flag(report.changed));
    println!("wrote: {}", format_flag(report.wrote));
    print_warnings(&report.warnings);
    if let Some(diff) = &report.diff {
        println!();
        print!("{diff}");
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_check(runtime: &RuntimeOptions, args: JsonArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = check_catalog(&paths)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("catalog check");
    println!("catalog_path: {}", report.catalog_path);
    println!("entries: {}", report.validation.entries);
    println!("patches: {}", report.assets.patches);
    println!("screenshots: {}", report.assets.screenshots);
    println!("extras: {}", report.assets.extras);
    println!(
        "uncovered_patches: {}",
        report.validation.uncovered_patches.len()
    );
    for filename in &report.validation.uncovered_patches {
        println!("  - {filename}");
    }
    print_warnings(&report.validation.warnings);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_add(runtime: &RuntimeOptions) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let report = append_missing_patches(&paths, &mut input, &mut output)?;

    println!();
    println!("catalog_path: {}", report.catalog_path);
    println!("added: {}", report.added.len());
    for entry in &report.added {
        println!("  - {} ({})", entry.name, entry.file);
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_stats(runtime: &RuntimeOptions, args: JsonArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = check_catalog(&paths)?;
    let validation = &report.validation;

    if args.json {
        let payload = serde_json::json!({
            "catalog_path": report.catalog_path,
            "entries": validation.entries,
            "authors": validation.authors,
            "tags": validation.tags,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("catalog stats");
    println!("catalog_path: {}", report.catalog_path);
    println!("entries: {}", validation.entries);
    print_usage("authors", &validation.authors);
    print_usage("tags", &validation.tags);
    print_warnings(&validation.warnings);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_status(runtime: &RuntimeOptions) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let status = inspect_runtime(&paths)?;

    println!("runtime status");
    println!("project_root: {}", normalize_for_display(&paths.project_root));
    println!(
        "project_root_exists: {}",
        format_flag(status.project_root_exists)
    );
    println!("config_path: {}", normalize_for_display(&paths.config_path));
    println!("config_exists: {}", format_flag(status.config_exists));
    println!("catalog_path: {}", normalize_for_display(&paths.catalog_path));
    println!("catalog_exists: {}", format_flag(status.catalog_exists));
    println!(
        "catalog_size_bytes: {}",
        status
            .catalog_size_bytes
            .map(|size| size.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    for (label, dir, exists) in [
        ("patches", &paths.patches_dir, status.patches_dir_exists),
        (
            "screenshots",
            &paths.screenshots_dir,
            status.screenshots_dir_exists,
        ),
        ("extras", &paths.extras_dir, status.extras_dir_exists),
    ] {
        println!("{label}_dir: {}", normalize_for_display(dir));
        println!("{label}_dir_exists: {}", format_flag(exists));
        if exists {
            println!("{label}_count: {}", list_dir(dir)?.len());
        }
    }
    if !status.warnings.is_empty() {
        println!("warnings:");
        for warning in &status.warnings {
            println!("  - {warning}");
        }
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!("warnings:");
    for warning in warnings {
        println!("  - {warning}");
    }
}

fn print_usage(label: &str, usage: &[UsageCount]) {
    println!("{label}: {}", usage.len());
    for item in usage {
        if item.variants.len() > 1 {
            println!(
                "  {:>4}  {} (also: {})",
                item.count,
                item.value,
                item.variants[1..].join(", ")
            );
        } else {
            println!("  {:>4}  {}", item.count, item.value);
        }
    }
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<ResolvedPaths> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        config: runtime.config.clone(),
        catalog: runtime.catalog.clone(),
    };

    let initial = resolve_paths(&context, &overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    let paths = resolve_paths(&context, &overrides)?;
    tracing::debug!(
        project_root = %normalize_for_display(&paths.project_root),
        root_source = paths.root_source.as_str(),
        catalog = %normalize_for_display(&paths.catalog_path),
        catalog_source = paths.catalog_source.as_str(),
        "resolved runtime paths"
    );
    Ok(paths)
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
