//! Synheart Heart Rate CLI
//!
//! Record and review heart rate readings.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use synheart_heart_rate::{
    audit::{create_shared_log_with_persistence, SharedAccessLog},
    config::Config,
    store::{JsonFileStore, PermissionSet},
    sync::{FilterMode, HistorySnapshot, RecordSyncController, SyncError},
    CONSENT_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-hr")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Record and review heart rate readings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and show recent readings
    List {
        /// Days of history to load (defaults to the configured lookback)
        #[arg(long)]
        days: Option<u32>,

        /// Only show readings matching this heart rate
        #[arg(long)]
        filter: Option<String>,

        /// Filter matching mode (substring or exact)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Save a new reading
    Add {
        /// Heart rate in beats per minute (1-300)
        #[arg(long)]
        bpm: String,

        /// Reading time as "yyyy-MM-dd HH:mm" (defaults to now)
        #[arg(long, default_value = "")]
        at: String,
    },

    /// Grant access to heart rate data
    Grant {
        /// Grant read access only
        #[arg(long)]
        read: bool,

        /// Grant write access only
        #[arg(long)]
        write: bool,
    },

    /// Withdraw all access to heart rate data
    Revoke,

    /// Show consent state and access statistics
    Status,

    /// Display what access is used for
    Consent,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { days, filter, mode } => cmd_list(days, filter, mode).await,
        Commands::Add { bpm, at } => cmd_add(&bpm, &at).await,
        Commands::Grant { read, write } => cmd_grant(read, write),
        Commands::Revoke => cmd_revoke(),
        Commands::Status => cmd_status().await,
        Commands::Consent => {
            println!("{CONSENT_DECLARATION}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn cmd_list(
    days: Option<u32>,
    filter: Option<String>,
    mode: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(days) = days {
        config.lookback_days = days;
    }
    if let Some(name) = mode {
        config.filter_mode = FilterMode::from_name(&name)
            .with_context(|| format!("unknown filter mode '{name}' (use substring or exact)"))?;
    }

    let (controller, access_log) = build_controller(&config)?;
    let started = controller.start().await;
    persist_access_log(&access_log);
    check_started(started)?;

    if let Some(query) = filter {
        controller.filter(&query);
    }

    print_history(&controller.snapshot());
    Ok(())
}

async fn cmd_add(bpm: &str, at: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let (controller, access_log) = build_controller(&config)?;

    let started = controller.start().await;
    if let Err(e) = check_started(started) {
        persist_access_log(&access_log);
        return Err(e);
    }

    controller.set_bpm_input(bpm);
    controller.set_timestamp_input(at);
    let saved = controller.save_form().await;
    persist_access_log(&access_log);

    match saved {
        Ok(sample) => println!("Saved {sample}"),
        Err(SyncError::RefreshFailed { saved, error }) => {
            println!("Saved {saved}");
            eprintln!("Warning: could not refresh history: {error}");
        }
        Err(e) => anyhow::bail!(e.user_message()),
    }
    println!();
    print_history(&controller.snapshot());
    Ok(())
}

fn cmd_grant(read: bool, write: bool) -> anyhow::Result<()> {
    let mut config = load_config()?;

    // No flag means both.
    let (read, write) = if !read && !write {
        (true, true)
    } else {
        (read, write)
    };
    config.consent.read |= read;
    config.consent.write |= write;
    config.save().context("saving config")?;

    println!("{CONSENT_DECLARATION}");
    print_consent(&config.consent);
    Ok(())
}

fn cmd_revoke() -> anyhow::Result<()> {
    let mut config = load_config()?;
    config.consent = PermissionSet::default();
    config.save().context("saving config")?;

    println!("Access withdrawn. Stored readings are kept but will not be read.");
    Ok(())
}

async fn cmd_status() -> anyhow::Result<()> {
    let config = load_config()?;

    println!("Synheart Heart Rate Status");
    println!("==========================");
    println!();
    print_consent(&config.consent);
    println!("Time zone: {}", config.zone()?.name());
    println!("Lookback: {} days", config.lookback_days);
    println!();

    let store = JsonFileStore::new(config.records_path(), config.consent);
    match store.record_count().await {
        Ok(count) => println!("Stored records: {count} ({})", store.path().display()),
        Err(e) => eprintln!("Warning: could not read records: {e}"),
    }
    println!();

    if config.access_log_path().exists() {
        let log = create_shared_log_with_persistence(config.access_log_path());
        println!("{}", log.summary());
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = load_config()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    Config::load().with_context(|| format!("loading {:?}", Config::config_path()))
}

fn build_controller(config: &Config) -> anyhow::Result<(RecordSyncController, SharedAccessLog)> {
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let access_log = create_shared_log_with_persistence(config.access_log_path());
    let store = Arc::new(JsonFileStore::new(config.records_path(), config.consent));
    let controller = RecordSyncController::new(store)
        .with_zone(config.zone()?)
        .with_filter_mode(config.filter_mode)
        .with_lookback_days(config.lookback_days)
        .with_access_log(access_log.clone());

    Ok((controller, access_log))
}

fn check_started<T>(started: Result<T, SyncError>) -> anyhow::Result<()> {
    match started {
        Ok(_) => Ok(()),
        Err(e @ SyncError::NotAuthorized(_)) => {
            anyhow::bail!("{}\nRun `synheart-hr grant` to allow access.", e.user_message())
        }
        Err(e) => anyhow::bail!(e.user_message()),
    }
}

fn persist_access_log(log: &SharedAccessLog) {
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save access log: {e}");
    }
}

fn print_consent(consent: &PermissionSet) {
    let state = |granted: bool| if granted { "Granted ✓" } else { "Not Granted ✗" };
    println!("Read access:  {}", state(consent.read));
    println!("Write access: {}", state(consent.write));
}

fn print_history(snapshot: &HistorySnapshot) {
    println!("Heart Rate History");
    println!("==================");
    if let Some(query) = &snapshot.filter {
        println!(
            "Filter: {query} ({} of {} readings)",
            snapshot.filtered_records.len(),
            snapshot.all_records.len()
        );
    }

    if snapshot.filtered_records.is_empty() {
        println!("No readings found.");
        return;
    }

    for sample in &snapshot.filtered_records {
        println!(
            "  {}  Heart Rate: {}",
            sample.time_label(),
            sample.rate_label()
        );
    }
}
