//! Thin command-line front end over the formatting engine.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use javelin_batch::{BatchOptions, BatchProcessor, BatchResult};
use javelin_config::FormatConfig;
use javelin_rules::{report_to_json, RuleRegistry, Violation};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "javelin",
    version,
    about = "Java source formatter (check, fix, parse)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report style violations without touching any file
    Check(BatchArgs),
    /// Apply auto-fixes in place, then report what remains
    Fix(BatchArgs),
    /// Print a debug parse tree / errors for a single file
    Parse(ParseArgs),
}

#[derive(Args)]
struct BatchArgs {
    /// Files or directories to process (directories are searched for
    /// `*.java`)
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Path to a javelin.toml (defaults to `./javelin.toml` when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Emit the violation envelope as JSON
    #[arg(long)]
    json: bool,
    /// Cap on concurrently processed files
    #[arg(long)]
    max_concurrency: Option<usize>,
}

#[derive(Args)]
struct ParseArgs {
    path: PathBuf,
    /// Emit parse errors as JSON instead of a tree dump
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            // Configuration and I/O problems are usage-level failures.
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Check(args) => run_batch(args, false),
        Command::Fix(args) => run_batch(args, true),
        Command::Parse(args) => run_parse(args),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<FormatConfig> {
    let config = match explicit {
        Some(path) => FormatConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            let default_path = Path::new("javelin.toml");
            if default_path.exists() {
                FormatConfig::load(default_path).context("loading ./javelin.toml")?
            } else {
                FormatConfig::default()
            }
        }
    };
    RuleRegistry::shared()
        .validate_config(&config)
        .context("rule configuration rejected")?;
    Ok(config)
}

fn init_tracing(config: &FormatConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter())
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn collect_java_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry.with_context(|| format!("walking {}", path.display()))?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|e| e == "java")
                {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn run_batch(args: BatchArgs, write: bool) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config);

    let files = collect_java_files(&args.paths)?;
    if files.is_empty() {
        eprintln!("no Java files found");
        return Ok(ExitCode::SUCCESS);
    }

    let options = BatchOptions {
        max_concurrency: args.max_concurrency,
        write,
        ..BatchOptions::default()
    };
    let processor = BatchProcessor::new(Arc::new(config), options);

    let progress: &javelin_batch::ProgressCallback = &|done, total, path| {
        tracing::debug!(done, total, path = %path.display(), "file finished");
    };
    let result = processor.process(&files, Some(progress));

    let mut violations: Vec<&Violation> = result
        .results
        .iter()
        .flat_map(|r| r.violations.iter())
        .collect();
    violations.sort_by_key(|v| (v.file_path.clone(), v.range.start()));

    if args.json {
        let owned: Vec<Violation> = violations.iter().map(|&v| v.clone()).collect();
        println!("{}", report_to_json(&owned));
    } else {
        print_human(&violations, &result, write);
    }

    for (path, message) in &result.errors {
        eprintln!("{}: {message}", path.display());
    }

    let has_findings = !violations.is_empty() && !write;
    if result.failure_count > 0 || has_findings {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_human(violations: &[&Violation], result: &BatchResult, write: bool) {
    for violation in violations {
        println!(
            "{}:{}:{}: {} [{}] {}",
            violation.file_path.display(),
            violation.line,
            violation.column,
            violation.severity.as_str(),
            violation.rule_id,
            violation.message
        );
    }

    let fixable = violations
        .iter()
        .filter(|v| v.auto_fixes().next().is_some())
        .count();
    let rewritten = result
        .results
        .iter()
        .filter(|r| r.rewritten.is_some())
        .count();
    if write {
        println!(
            "{} files processed, {} rewritten, {} failed ({:.1} files/s)",
            result.total, rewritten, result.failure_count, result.throughput
        );
    } else {
        println!(
            "{} violations ({} fixable) in {} files, {} failed ({:.1} files/s)",
            violations.len(),
            fixable,
            result.total,
            result.failure_count,
            result.throughput
        );
    }
}

fn run_parse(args: ParseArgs) -> Result<ExitCode> {
    let source = std::fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;

    let result = javelin_syntax::parse(&source);
    if args.json {
        let errors: Vec<_> = result
            .errors()
            .iter()
            .map(|e| {
                serde_json::json!({
                    "message": e.message,
                    "start": u32::from(e.range.start()),
                    "end": u32::from(e.range.end()),
                    "recoverable": e.recoverable,
                })
            })
            .collect();
        let envelope = serde_json::json!({
            "file": args.path.display().to_string(),
            "success": result.is_success(),
            "nodes": result.arena().map(|a| a.len()).unwrap_or(0),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        if let Some(arena) = result.arena() {
            print!("{}", arena.dump());
        }
        for error in result.errors() {
            eprintln!("{error}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
