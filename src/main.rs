use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use schemadiff::presentation::cli_summary::{print_perf_summary, print_snapshot_line, print_summary};
use schemadiff::presentation::writers::{all_writers, write_to_file, writer_for};
use schemadiff::{AppConfig, Comparison, LogLevel, OutputConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "schemadiff",
    version,
    about = "Schemadiff: capture database schemas and report structural drift."
)]
struct Cli {
    /// Config file (defaults to ./schemadiff.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show introspection SQL and debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture one configured database into a snapshot file
    Export {
        #[arg(long, value_enum, default_value = "source")]
        side: Side,

        /// Where to write the snapshot JSON
        #[arg(short, long)]
        out: PathBuf,

        /// Label to record instead of the configured one
        #[arg(long)]
        label: Option<String>,
    },

    /// Capture both configured databases and compare them
    Compare {
        #[command(flatten)]
        report: ReportArgs,

        /// Print introspection timings
        #[arg(long)]
        timing: bool,
    },

    /// Compare two previously exported snapshot files
    DiffFiles {
        left: PathBuf,
        right: PathBuf,

        /// Report directory (defaults to the configured output dir)
        #[arg(long)]
        out_dir: Option<String>,

        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Print the summary only; write no report files
    #[arg(long)]
    dry_run: bool,

    /// all, json, txt or html
    #[arg(short, long, default_value = "all")]
    format: String,

    /// Exit with status 1 when any difference is found
    #[arg(long)]
    fail_on_drift: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Side {
    Source,
    Target,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    schemadiff::init_tracing(match (cli.verbose, cli.quiet) {
        (true, _) => LogLevel::Debug,
        (_, true) => LogLevel::Error,
        _ => LogLevel::Info,
    });

    match cli.command {
        Command::Export { side, out, label } => {
            let cfg = load_config(cli.config)?;
            let db = match side {
                Side::Source => &cfg.source,
                Side::Target => &cfg.target,
            };
            let label = label.as_deref().unwrap_or(db.label());

            let snapshot = schemadiff::export(db, label)
                .await
                .with_context(|| format!("Could not capture a snapshot for {label}"))?;
            schemadiff::save_snapshot(&snapshot, &out)?;

            print_snapshot_line(&snapshot, &schemadiff::fingerprint(&snapshot));
            println!("Snapshot written to {}", out.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Compare { report, timing } => {
            let cfg = load_config(cli.config)?;
            let (comparison, perf) = schemadiff::run_with_timing(&cfg).await?;
            if timing {
                print_perf_summary(&perf);
            }
            emit(&comparison, &report, &cfg.output.dir)
        }

        Command::DiffFiles {
            left,
            right,
            out_dir,
            report,
        } => {
            let left = schemadiff::load_snapshot(&left)?;
            let right = schemadiff::load_snapshot(&right)?;
            let comparison = schemadiff::compare_snapshots(&left, &right);

            let dir = report_dir(out_dir, cli.config.or_else(AppConfig::default_path))?;
            emit(&comparison, &report, &dir)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let path = match path.or_else(AppConfig::default_path) {
        Some(path) => path,
        None => bail!("No config file found: pass --config or create ./schemadiff.toml"),
    };
    AppConfig::load(&path)
}

/// `--out-dir` if given, else the configured output dir. Without any config
/// file the default dir is used; a config file that fails to load is an error.
fn report_dir(out_dir: Option<String>, config: Option<PathBuf>) -> Result<String> {
    if let Some(dir) = out_dir {
        return Ok(dir);
    }
    match config {
        Some(path) => Ok(AppConfig::load(&path)?.output.dir),
        None => Ok(OutputConfig::default().dir),
    }
}

fn emit(comparison: &Comparison, args: &ReportArgs, dir: &str) -> Result<ExitCode> {
    print_summary(comparison);

    if !args.dry_run {
        let writers = match args.format.as_str() {
            "all" => all_writers(),
            fmt => vec![writer_for(fmt).ok_or_else(|| anyhow::anyhow!("Unknown format: {}", fmt))?],
        };
        for writer in writers {
            let path = write_to_file(&*writer, comparison, dir)?;
            println!("Report written to {}", path.display());
        }
    }

    if args.fail_on_drift && comparison.has_drift() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
