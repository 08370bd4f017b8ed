use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use testdex::adapter::Framework;
use testdex::config::{ScanOptions, TestdexConfig};
use testdex::format::OutputFormat;
use testdex::scan;
use testdex::sync::{self, IdMap, SyncOptions};
use testdex::telemetry;

/// Test-model extractor and stable-ID synchronizer
///
/// testdex scans test source files written in one of five authoring idioms
/// (mocha, qunit, jest, codecept, markdown), builds a model of suites,
/// tests, skip state, and tags, and keeps stable @T…/@S… identifiers in
/// sync between that model and an external registry by rewriting titles
/// in place.
///
/// QUICK START:
///
///   testdex scan --pattern "tests/**/*.test.js" --framework mocha
///
///   # Insert registry-issued IDs into titles
///   testdex update-ids --pattern "tests/**/*.test.js" --ids ids.json
///
///   # Remove them again
///   testdex clean-ids --pattern "tests/**/*.test.js" --ids ids.json
///
/// Defaults for --pattern and --framework can live in testdex.toml in the
/// working root; flags override the file.
#[derive(Parser)]
#[command(name = "testdex")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'testdex <command> --help' for details on a specific command.")]
struct Cli {
    /// Working root the scan pattern and file paths are relative to
    #[arg(long, short = 'd', global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan test files and print the discovered test model
    Scan {
        /// Glob pattern for test files (e.g. "tests/**/*.test.js")
        #[arg(long, short)]
        pattern: Option<String>,

        /// Authoring framework: mocha, qunit, jest, codecept, markdown
        #[arg(long, short)]
        framework: Option<Framework>,

        /// Do not merge before/after hook code into test snippets
        #[arg(long)]
        no_hooks: bool,

        /// Prefix code snippets with source line numbers
        #[arg(long)]
        line_numbers: bool,

        /// Output format: text, markdown, or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// List skipped tests instead of the full tree
        #[arg(long)]
        skipped: bool,
    },

    /// Insert registry-issued IDs into test and suite titles
    ///
    /// Titles already carrying the issued ID are left alone; titles carrying
    /// a different ID are counted as conflicts and never overwritten.
    UpdateIds {
        /// Glob pattern for test files
        #[arg(long, short)]
        pattern: Option<String>,

        /// Authoring framework: mocha, qunit, jest, codecept, markdown
        #[arg(long, short)]
        framework: Option<Framework>,

        /// JSON file with the identifier map: {"tests": {...}, "suites": {...}}
        #[arg(long)]
        ids: PathBuf,
    },

    /// Remove previously inserted IDs from test and suite titles
    CleanIds {
        /// Glob pattern for test files
        #[arg(long, short)]
        pattern: Option<String>,

        /// Authoring framework: mocha, qunit, jest, codecept, markdown
        #[arg(long, short)]
        framework: Option<Framework>,

        /// JSON file with the identifier map: {"tests": {...}, "suites": {...}}
        #[arg(long)]
        ids: PathBuf,

        /// Remove any well-formed ID token, even ones the map does not know
        /// (escape hatch for orphaned IDs)
        #[arg(long)]
        dangerous: bool,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            pattern,
            framework,
            no_hooks,
            line_numbers,
            format,
            skipped,
        } => run_scan(
            &cli.dir, pattern, framework, no_hooks, line_numbers, format, skipped,
        ),
        Commands::UpdateIds {
            pattern,
            framework,
            ids,
        } => run_update(&cli.dir, pattern, framework, &ids),
        Commands::CleanIds {
            pattern,
            framework,
            ids,
            dangerous,
        } => run_clean(&cli.dir, pattern, framework, &ids, dangerous),
    }
}

/// Merge CLI flags over testdex.toml and resolve the scan inputs.
fn resolve(
    dir: &Path,
    pattern: Option<String>,
    framework: Option<Framework>,
) -> Result<(TestdexConfig, String, Framework)> {
    let config = TestdexConfig::load(dir)?;
    let pattern = pattern
        .or_else(|| config.scan.pattern.clone())
        .context("no scan pattern: pass --pattern or set scan.pattern in testdex.toml")?;
    let framework = framework
        .or(config.scan.framework)
        .unwrap_or(Framework::Mocha);
    Ok((config, pattern, framework))
}

#[allow(clippy::fn_params_excessive_bools)]
fn run_scan(
    dir: &Path,
    pattern: Option<String>,
    framework: Option<Framework>,
    no_hooks: bool,
    line_numbers: bool,
    format: OutputFormat,
    skipped: bool,
) -> Result<()> {
    let (config, pattern, framework) = resolve(dir, pattern, framework)?;
    let opts = ScanOptions {
        include_hooks: config.scan.hooks && !no_hooks,
        line_numbers: config.scan.line_numbers || line_numbers,
    };

    let decorator = scan::scan(&pattern, dir, framework, &opts)?;
    decorator.validate()?;

    if skipped {
        for name in decorator.skipped_full_names() {
            println!("{name}");
        }
        return Ok(());
    }

    println!("{}", format.render(&decorator)?);
    if format == OutputFormat::Text {
        eprintln!(
            "{} test(s), {} skipped",
            decorator.count(),
            decorator.skipped_full_names().len()
        );
    }
    Ok(())
}

fn run_update(
    dir: &Path,
    pattern: Option<String>,
    framework: Option<Framework>,
    ids: &Path,
) -> Result<()> {
    let (config, pattern, framework) = resolve(dir, pattern, framework)?;
    let decorator = scan::scan(&pattern, dir, framework, &config.scan.options())?;
    decorator.validate()?;

    let mut map = IdMap::from_json_file(ids)?;
    let report = sync::update_ids(
        &decorator.records_by_file(),
        &mut map,
        dir,
        &SyncOptions::default(),
    )?;

    println!("updated {} file(s)", report.updated_files.len());
    for file in &report.updated_files {
        println!("  {}", file.display());
    }
    if report.duplicates > 0 {
        eprintln!(
            "warning: {} title(s) already carried a different ID and were left unchanged",
            report.duplicates
        );
    }
    Ok(())
}

fn run_clean(
    dir: &Path,
    pattern: Option<String>,
    framework: Option<Framework>,
    ids: &Path,
    dangerous: bool,
) -> Result<()> {
    let (config, pattern, framework) = resolve(dir, pattern, framework)?;
    let decorator = scan::scan(&pattern, dir, framework, &config.scan.options())?;

    let map = IdMap::from_json_file(ids)?;
    let opts = SyncOptions {
        dangerous: dangerous || config.sync.dangerous,
        ..SyncOptions::default()
    };
    let report = sync::clean_ids(&decorator.records_by_file(), &map, dir, &opts)?;

    println!("cleaned {} file(s)", report.updated_files.len());
    for file in &report.updated_files {
        println!("  {}", file.display());
    }
    Ok(())
}
