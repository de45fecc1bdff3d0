use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use rusty_merge::loader::DEFAULT_MAX_FILE_SIZE_MB;
use rusty_merge::{ExportFormat, JoinMode, MergeConfig, Session, Settings, Side};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rusty-merge")]
#[command(about = "Join two CSV or Excel tables on key columns")]
#[command(version)]
struct Cli {
    /// Largest accepted input file, in megabytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE_MB, global = true)]
    max_file_size_mb: usize,

    /// Infer column types instead of keeping cells as displayed text
    #[arg(long, global = true)]
    infer_types: bool,

    /// Trim surrounding whitespace of text cells after loading
    #[arg(long, global = true)]
    normalize: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Step-by-step merge wizard (default)
    Interactive,
    /// Merge two files in one go
    Join(JoinArgs),
}

#[derive(Args)]
struct JoinArgs {
    /// First table (A)
    #[arg(long = "a", value_name = "FILE")]
    a: PathBuf,

    /// Second table (B)
    #[arg(long = "b", value_name = "FILE")]
    b: PathBuf,

    /// Sheet of A to read; the first sheet by default
    #[arg(long)]
    sheet_a: Option<String>,

    /// Sheet of B to read; the first sheet by default
    #[arg(long)]
    sheet_b: Option<String>,

    /// Key columns of A, comma-separated
    #[arg(long, value_delimiter = ',')]
    keys_a: Vec<String>,

    /// Key columns of B, paired with --keys-a by position; same names as A when omitted
    #[arg(long, value_delimiter = ',')]
    keys_b: Vec<String>,

    /// inner, left, right, outer, anti_a_not_b or anti_b_not_a
    #[arg(long)]
    mode: Option<JoinMode>,

    /// Output columns taken from A; all when omitted
    #[arg(long, value_delimiter = ',')]
    columns_a: Vec<String>,

    /// Output columns taken from B; all when omitted
    #[arg(long, value_delimiter = ',')]
    columns_b: Vec<String>,

    /// Result file, .xlsx or .csv
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Saved merge configuration with keys and join type
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save the merge configuration used to this file
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,
}

fn run_join(mut session: Session, args: JoinArgs) -> Result<()> {
    session
        .upload_path(Side::A, &args.a, args.sheet_a)
        .with_context(|| format!("Failed to load table A from '{}'", args.a.display()))?;
    session
        .upload_path(Side::B, &args.b, args.sheet_b)
        .with_context(|| format!("Failed to load table B from '{}'", args.b.display()))?;

    if let Some(path) = &args.config {
        let config = MergeConfig::load(path)
            .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
        session.apply_config(&config).context("Configuration does not fit the tables")?;
    }
    if !args.keys_a.is_empty() {
        let keys_b = if args.keys_b.is_empty() {
            &args.keys_a
        } else {
            &args.keys_b
        };
        let report = session.choose_keys(&args.keys_a, keys_b)?;
        for warning in &report.warnings {
            warn!("{}", warning);
        }
    } else if args.config.is_none() {
        bail!("Key columns are required: pass --keys-a or --config");
    }
    if let Some(mode) = args.mode {
        session.choose_mode(mode);
    }
    session.choose_columns(&args.columns_a, &args.columns_b)?;

    let result = session.execute().context("Merge failed")?;
    println!("{}", result.stats);

    if let Some(path) = &args.save_config {
        session
            .merge_config()
            .save(path)
            .with_context(|| format!("Failed to save configuration '{}'", path.display()))?;
        info!("Configuration saved to '{}'", path.display());
    }
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(ExportFormat::default().default_filename()));
    let written = session
        .save(&output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    println!("Saved '{}'", written.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let settings = Settings {
        max_file_size_mb: cli.max_file_size_mb,
        preserve_format: !cli.infer_types,
        normalize: cli.normalize,
        ..Settings::default()
    };
    let session = Session::new(settings).context("Invalid settings")?;
    match cli.command {
        Some(Command::Join(args)) => run_join(session, args),
        Some(Command::Interactive) | None => rusty_merge::shell::run(session),
    }
}
