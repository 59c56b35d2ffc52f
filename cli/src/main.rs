mod output;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgGroup, Args, Parser, Subcommand};
use jobtracker_config::{
    ConfigSource, ConnectionConfig, DEFAULT_TIMEOUT_SECS, ENV_DB_PATH, default_db_path, resolve,
};
use jobtracker_core::validate_id;
use jobtracker_sqlite::{
    APPLICATIONS_TABLE, ApplicationStore, Migration, MigrationState, open, table_exists,
};
use rusqlite::Connection;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::output::{ExportFormat, OutputFormat, render};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "jobtracker", version = PACKAGE_VERSION)]
#[command(about = "Track job applications in a local SQLite database")]
struct Cli {
    /// Override the configured database timeout, in seconds.
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a new job application.
    Add(AddArgs),
    /// List all job applications.
    List(ListArgs),
    /// Search company, position and status for a keyword.
    Search(SearchArgs),
    /// Update fields of a job application by its ID.
    Update(UpdateArgs),
    /// Delete a job application by its ID.
    Delete(DeleteArgs),
    /// Delete all job applications and restart IDs at 1.
    Clear(ClearArgs),
    /// Apply pending database migrations.
    Migrate(MigrateArgs),
    /// Export all job applications as JSON or CSV.
    Export(ExportArgs),
    /// Write the database connection configuration.
    Configure(ConfigureArgs),
    /// Show the active connection configuration.
    Config,
    /// Print the version.
    Version,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Company name.
    #[arg(short, long)]
    company: String,
    /// Job position.
    #[arg(short, long)]
    position: String,
    /// Application status (default: Applied).
    #[arg(short, long, default_value = "")]
    status: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Column to sort by (id, company, position, status, created_at, updated_at).
    #[arg(short, long)]
    sort: Option<String>,
    /// Sort in descending order.
    #[arg(short, long = "desc", visible_alias = "descending")]
    descending: bool,
    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Text to look for, ignoring case.
    #[arg(short, long)]
    keyword: String,
    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("fields")
        .required(true)
        .multiple(true)
        .args(["company", "position", "status"])
))]
struct UpdateArgs {
    /// ID of the application to update.
    #[arg(short, long, value_parser = parse_id)]
    id: i64,
    /// New company name.
    #[arg(short, long)]
    company: Option<String>,
    /// New job position.
    #[arg(short, long)]
    position: Option<String>,
    /// New status.
    #[arg(short, long)]
    status: Option<String>,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// ID of the application to delete.
    #[arg(short, long, value_parser = parse_id)]
    id: i64,
}

#[derive(Debug, Args)]
struct ClearArgs {
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    force: bool,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// Show which migrations are applied instead of running them.
    #[arg(long)]
    status: bool,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Export format.
    #[arg(short, long, value_enum)]
    format: ExportFormat,
    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ConfigureArgs {
    /// SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,
    /// Database timeout in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(1);
            }
        },
    };
    init_logging();

    let timeout = cli.timeout;
    let result = match cli.command {
        Command::Add(args) => run_add(args, timeout),
        Command::List(args) => run_list(args, timeout),
        Command::Search(args) => run_search(args, timeout),
        Command::Update(args) => run_update(args, timeout),
        Command::Delete(args) => run_delete(args, timeout),
        Command::Clear(args) => run_clear(args, timeout),
        Command::Migrate(args) => run_migrate(args, timeout),
        Command::Export(args) => run_export(args, timeout),
        Command::Configure(args) => run_configure(args),
        Command::Config => run_config(),
        Command::Version => {
            println!("JobTracker version {PACKAGE_VERSION}");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run_add(args: AddArgs, timeout: Option<u64>) -> Result<(), String> {
    let conn = open_initialized(timeout)?;
    let id = ApplicationStore::new(&conn)
        .add(&args.company, &args.position, &args.status)
        .map_err(|e| format!("failed to add job application: {e}"))?;
    println!("Job application added successfully (id {id})");
    Ok(())
}

fn run_list(args: ListArgs, timeout: Option<u64>) -> Result<(), String> {
    let conn = open_initialized(timeout)?;
    let apps = ApplicationStore::new(&conn)
        .list(args.sort.as_deref(), args.descending)
        .map_err(|e| format!("failed to list job applications: {e}"))?;
    print!("{}", render(&apps, args.format)?);
    Ok(())
}

fn run_search(args: SearchArgs, timeout: Option<u64>) -> Result<(), String> {
    let conn = open_initialized(timeout)?;
    let apps = ApplicationStore::new(&conn)
        .search(&args.keyword)
        .map_err(|e| format!("failed to search job applications: {e}"))?;
    print!("{}", render(&apps, args.format)?);
    Ok(())
}

fn run_update(args: UpdateArgs, timeout: Option<u64>) -> Result<(), String> {
    let fields: Vec<(&str, String)> = [
        ("company", args.company),
        ("position", args.position),
        ("status", args.status),
    ]
    .into_iter()
    .filter_map(|(column, value)| value.map(|v| (column, v)))
    .collect();
    if fields.iter().all(|(_, value)| value.trim().is_empty()) {
        return Err("nothing to update: every given value is empty".to_string());
    }

    let conn = open_initialized(timeout)?;
    let rows = ApplicationStore::new(&conn)
        .update(args.id, fields)
        .map_err(|e| format!("failed to update job application: {e}"))?;
    if rows == 0 {
        println!("No job application found with id {}", args.id);
    } else {
        println!("Updated job application with id {}", args.id);
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, timeout: Option<u64>) -> Result<(), String> {
    let conn = open_initialized(timeout)?;
    let rows = ApplicationStore::new(&conn)
        .delete(args.id)
        .map_err(|e| format!("failed to delete job application: {e}"))?;
    if rows == 0 {
        println!("No job application found with id {}", args.id);
    } else {
        println!("Deleted job application with id {}", args.id);
    }
    Ok(())
}

fn run_clear(args: ClearArgs, timeout: Option<u64>) -> Result<(), String> {
    if !args.force {
        let answer = prompt("Are you sure you want to delete all job applications? (y/N): ")?;
        let answer = answer.to_lowercase();
        if answer != "y" && answer != "yes" {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let conn = open_initialized(timeout)?;
    let removed = ApplicationStore::new(&conn)
        .clear()
        .map_err(|e| format!("failed to clear job applications: {e}"))?;
    println!("Deleted {removed} job application(s)");
    Ok(())
}

fn run_migrate(args: MigrateArgs, timeout: Option<u64>) -> Result<(), String> {
    let conn = open_database(timeout)?;
    let migration =
        Migration::new(&conn).map_err(|e| format!("failed to load migrations: {e}"))?;

    if args.status {
        let status = migration
            .status()
            .map_err(|e| format!("failed to get migration status: {e}"))?;
        for script in status {
            let state = match script.state {
                MigrationState::Applied => "applied",
                MigrationState::Pending => "pending",
            };
            println!("{state:<8} {}", script.name);
        }
        return Ok(());
    }

    let report = migration
        .run()
        .map_err(|e| format!("migration failed: {e}"))?;
    if report.is_up_to_date() {
        println!("Database is up to date");
    } else {
        for name in &report.applied {
            println!("Applied {name}");
        }
        println!("Migrations run successfully");
    }
    Ok(())
}

fn run_export(args: ExportArgs, timeout: Option<u64>) -> Result<(), String> {
    let conn = open_initialized(timeout)?;
    let apps = ApplicationStore::new(&conn)
        .list(None, false)
        .map_err(|e| format!("failed to read job applications: {e}"))?;
    let content = render(&apps, args.format.into())?;

    match args.output {
        Some(path) => {
            fs::write(&path, content)
                .map_err(|e| format!("failed to write '{}': {e}", path.display()))?;
            println!(
                "Exported {} job application(s) to {}",
                apps.len(),
                path.display()
            );
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn run_configure(args: ConfigureArgs) -> Result<(), String> {
    let current = ConnectionConfig::load().ok();
    let default_timeout = current
        .as_ref()
        .map_or(DEFAULT_TIMEOUT_SECS, |config| config.timeout_secs);

    let db_path = match args.db_path {
        Some(path) => path,
        None => {
            let default_path = match &current {
                Some(config) => config.db_path.clone(),
                None => default_db_path().map_err(|e| e.to_string())?,
            };
            let answer = prompt(&format!("Database path [{}]: ", default_path.display()))?;
            if answer.is_empty() {
                default_path
            } else {
                PathBuf::from(answer)
            }
        }
    };
    let timeout_secs = match args.timeout_secs {
        Some(secs) => secs,
        None => {
            let answer = prompt(&format!("Timeout in seconds [{default_timeout}]: "))?;
            if answer.is_empty() {
                default_timeout
            } else {
                answer
                    .parse()
                    .map_err(|_| format!("invalid timeout {answer:?}: expected whole seconds"))?
            }
        }
    };

    let config = ConnectionConfig::new(db_path).with_timeout_secs(timeout_secs);
    let path = config.save().map_err(|e| e.to_string())?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn run_config() -> Result<(), String> {
    let resolved = resolve().map_err(|e| e.to_string())?;
    let source = match &resolved.source {
        ConfigSource::Environment => format!("environment ({ENV_DB_PATH})"),
        ConfigSource::File(path) => path.display().to_string(),
    };
    println!("Database path: {}", resolved.config.db_path.display());
    println!("Timeout:       {}s", resolved.config.timeout_secs);
    println!("Source:        {source}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolves configuration and opens the database it names.
fn open_database(timeout: Option<u64>) -> Result<Connection, String> {
    let resolved = resolve().map_err(|e| e.to_string())?;
    let mut config = resolved.config;
    if let Some(secs) = timeout {
        config.timeout_secs = secs;
    }
    debug!(db_path = %config.db_path.display(), source = ?resolved.source, "resolved configuration");

    open(&config.db_path, config.timeout())
        .map_err(|e| format!("failed to open database '{}': {e}", config.db_path.display()))
}

/// Opens the database and checks that migrations have created the schema.
fn open_initialized(timeout: Option<u64>) -> Result<Connection, String> {
    let conn = open_database(timeout)?;
    let ready = table_exists(&conn, APPLICATIONS_TABLE)
        .map_err(|e| format!("failed to inspect database: {e}"))?;
    if !ready {
        return Err("database is not initialized; run `jobtracker migrate` first".to_string());
    }
    Ok(conn)
}

/// Prints `message` and reads one trimmed line from stdin. EOF reads as empty.
fn prompt(message: &str) -> Result<String, String> {
    print!("{message}");
    io::stdout()
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("failed to read input: {e}"))?;
    Ok(line.trim().to_string())
}

fn parse_id(raw: &str) -> Result<i64, String> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{raw:?} is not a valid id"))?;
    validate_id(id).map_err(|e| e.to_string())
}
