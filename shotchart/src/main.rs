//! Shotchart CLI - clean shot-chart CSVs and load them into SQLite
//!
//! # Main Commands
//!
//! ```bash
//! shotchart run data/raw/shots.csv          # transform, then load
//! shotchart transform data/raw/shots.csv    # clean only
//! shotchart load data/processed/shots.csv   # load an already cleaned file
//! ```
//!
//! # Store and Config Commands
//!
//! ```bash
//! shotchart init-db                         # create the schema
//! shotchart stats                           # row counts
//! shotchart config                          # print the default transform config
//! shotchart config --check my-config.json   # validate a config file
//! shotchart teams                           # print the team directory
//! shotchart teams --id 1610612739           # look up one team
//! ```
//!
//! The database path comes from `--db`, then `SHOTCHART_DB`, then
//! `data/shotchart.db`.

use clap::{Args, Parser, Subcommand};
use shotchart::logs::write_report;
use shotchart::{
    load, read_table, transform, write_table_file, PipelineError, ShotKey, SqliteStore, Table,
    TeamDirectory, TransformConfig,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_DB: &str = "data/shotchart.db";
const DEFAULT_CLEANED: &str = "data/processed/shots_processed.csv";
const DEFAULT_TRANSFORM_LOG: &str = "logs/transform_log.json";
const DEFAULT_LOAD_LOG: &str = "logs/load_log.json";

type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "shotchart", version)]
#[command(about = "Clean player shot-chart records and load them into a relational store", long_about = None)]
struct Cli {
    /// More log output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TransformArgs {
    /// Transform config JSON (defaults to the built-in rules)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transform report location
    #[arg(long, default_value = DEFAULT_TRANSFORM_LOG)]
    transform_log: PathBuf,
}

#[derive(Args)]
struct StoreArgs {
    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Create the store without the (game_id, shot_number) unique key
    #[arg(long)]
    no_shot_key: bool,
}

#[derive(Args)]
struct LoadArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Team directory JSON (defaults to the built-in NBA directory)
    #[arg(short, long)]
    teams: Option<PathBuf>,

    /// Delete all shots, games and teams before loading
    #[arg(long)]
    clear: bool,

    /// Load report location
    #[arg(long, default_value = DEFAULT_LOAD_LOG)]
    load_log: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw shot CSV
    Transform {
        /// Raw shot CSV
        input: PathBuf,

        /// Cleaned CSV output
        #[arg(short, long, default_value = DEFAULT_CLEANED)]
        output: PathBuf,

        #[command(flatten)]
        transform: TransformArgs,
    },

    /// Load a cleaned shot CSV into the store
    Load {
        /// Cleaned shot CSV
        #[arg(default_value = DEFAULT_CLEANED)]
        input: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Transform a raw CSV, save the cleaned copy, then load it
    Run {
        /// Raw shot CSV
        input: PathBuf,

        /// Cleaned CSV output
        #[arg(short, long, default_value = DEFAULT_CLEANED)]
        output: PathBuf,

        #[command(flatten)]
        transform: TransformArgs,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Create the store schema
    InitDb {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show row counts of the store
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the default transform config, or validate a config file
    Config {
        /// Config file to validate
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// Print the team directory
    Teams {
        /// Team directory JSON (defaults to the built-in NBA directory)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Only show the team with this external id
        #[arg(long)]
        id: Option<i64>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Transform { input, output, transform } => {
            cmd_transform(&input, &output, &transform).map(|_| ())
        }
        Commands::Load { input, load } => cmd_load(&input, &load),
        Commands::Run { input, output, transform, load } => {
            cmd_run(&input, &output, &transform, &load)
        }
        Commands::InitDb { store } => cmd_init_db(&store),
        Commands::Stats { store } => cmd_stats(&store),
        Commands::Config { check } => cmd_config(check.as_deref()),
        Commands::Teams { file, id } => cmd_teams(file.as_deref(), id),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (_, true) => "error",
        (true, false) => "debug",
        (false, false) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn store_from(args: &StoreArgs) -> SqliteStore {
    let path = args
        .db
        .clone()
        .or_else(|| std::env::var_os("SHOTCHART_DB").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
    let shot_key = if args.no_shot_key { ShotKey::None } else { ShotKey::GameSequence };
    SqliteStore::open(path).with_shot_key(shot_key)
}

fn transform_config(args: &TransformArgs) -> CmdResult<TransformConfig> {
    Ok(match &args.config {
        Some(path) => TransformConfig::from_path(path)?,
        None => TransformConfig::default(),
    })
}

fn team_directory(path: Option<&Path>) -> CmdResult<TeamDirectory> {
    Ok(match path {
        Some(path) => TeamDirectory::from_path(path)?,
        None => TeamDirectory::nba(),
    })
}

/// Clean `input`, write the cleaned CSV and the report. The report is written
/// even when the transform fails.
fn cmd_transform(input: &Path, output: &Path, args: &TransformArgs) -> CmdResult<Table> {
    let config = transform_config(args)?;
    let parsed = read_table(input)?;
    eprintln!("Processing: {}", input.display());
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(parsed.delimiter));
    eprintln!("   Rows: {}", parsed.table.len());

    let outcome = match transform(parsed.table, &config) {
        Ok(outcome) => outcome,
        Err(failure) => {
            write_report(&args.transform_log, &failure.report)?;
            return Err(PipelineError::from(failure).into());
        }
    };

    outcome.report.log_summary();
    write_report(&args.transform_log, &outcome.report)?;
    write_table_file(&outcome.table, output)?;
    eprintln!("Cleaned {} shots -> {}", outcome.table.len(), output.display());
    Ok(outcome.table)
}

fn cmd_load(input: &Path, args: &LoadArgs) -> CmdResult {
    let parsed = read_table(input)?;
    eprintln!("Loading: {} ({} shots)", input.display(), parsed.table.len());
    load_table(&parsed.table, args)
}

fn cmd_run(input: &Path, output: &Path, transform: &TransformArgs, load: &LoadArgs) -> CmdResult {
    let cleaned = cmd_transform(input, output, transform)?;
    load_table(&cleaned, load)
}

fn load_table(cleaned: &Table, args: &LoadArgs) -> CmdResult {
    let directory = team_directory(args.teams.as_deref())?;
    let store = store_from(&args.store);
    store.migrate()?;
    if args.clear {
        store.clear()?;
        eprintln!("Cleared {}", store.path().display());
    }

    match load(cleaned, &directory, &store) {
        Ok(report) => {
            report.log_summary();
            write_report(&args.load_log, &report)?;
            eprintln!(
                "Stored: {} teams, {} games, {} shots",
                report.stats.teams, report.stats.games, report.stats.shots
            );
            Ok(())
        }
        Err(failure) => {
            write_report(&args.load_log, &failure.report)?;
            Err(PipelineError::from(failure).into())
        }
    }
}

fn cmd_init_db(args: &StoreArgs) -> CmdResult {
    let store = store_from(args);
    store.migrate()?;
    eprintln!("Schema ready: {}", store.path().display());
    Ok(())
}

fn cmd_stats(args: &StoreArgs) -> CmdResult {
    let store = store_from(args);
    let counts = store.counts()?;
    println!("Database: {}", store.path().display());
    println!("  teams: {}", counts.teams);
    println!("  games: {}", counts.games);
    println!("  shots: {}", counts.shots);
    Ok(())
}

fn cmd_config(check: Option<&Path>) -> CmdResult {
    match check {
        Some(path) => {
            let config = TransformConfig::from_path(path)?;
            eprintln!(
                "Valid config: {} shot types, {} required columns, {} distance buckets",
                config.shot_type_mapping.len(),
                config.required_columns.len(),
                config.distance_buckets.len()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&TransformConfig::default())?),
    }
    Ok(())
}

fn cmd_teams(file: Option<&Path>, id: Option<i64>) -> CmdResult {
    let directory = team_directory(file)?;
    if let Some(id) = id {
        println!("{:>10}  {:<4} {}", id, directory.abbreviation_of(id), directory.name_of(id));
        if directory.get(id).is_none() {
            eprintln!("Team {} is not in the directory", id);
        }
        return Ok(());
    }
    for team in directory.teams() {
        println!("{:>10}  {:<4} {}", team.external_team_id, team.abbreviation, team.name);
    }
    eprintln!("{} teams", directory.len());
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
