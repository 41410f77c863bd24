use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};

use vitalrs::config::{log_bundled_json, AppConfig, StoreKind};
use vitalrs::export::{self, ExportFormat};
use vitalrs::gateway::{
    self, ActivityRecord, AuthClient, LocalSettings, ManualEntry, RecordStore, RestAuthClient,
    RestRecordStore, SqliteRecordStore,
};
use vitalrs::logging::{init_logging, log_error};
use vitalrs::{
    event_channel, ActivityType, MetricType, SeededRandom, SensorHub, SessionDriver,
    TrackingSession, TrackingState, VitalRsError,
};

/// vitalrs - Watch Activity Tracker CLI
///
/// Tracks sleep, stress, brushing, sports and more against a simulated watch,
/// and saves session summaries to a hosted or local record store.
#[derive(Parser)]
#[command(name = "vitalrs")]
#[command(author = "vitalrs Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Watch Activity Tracker CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List trackable activities
    Activities,

    /// Track an activity live
    Track {
        /// Activity to track (e.g. walking, sleep, tooth-brushing)
        activity: ActivityType,

        /// Stop automatically after this many seconds (Ctrl-C stops earlier)
        #[arg(short, long, default_value = "60")]
        seconds: u64,

        /// Seed for simulated values
        #[arg(long)]
        seed: Option<u64>,

        /// Save the summary for the logged-in user
        #[arg(long)]
        save: bool,
    },

    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Forget the signed-in user
    Logout,

    /// Show login state and store
    Status,

    /// List stored records
    Records {
        /// Output format (table, json, csv)
        #[arg(short = 'f', long, default_value = "table")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert a record typed by hand
    Insert {
        #[arg(long, default_value = "")]
        calories: String,

        #[arg(long, default_value = "")]
        distance: String,

        #[arg(long, default_value = "")]
        heart_rate: String,

        #[arg(long, default_value = "")]
        breathing: String,

        #[arg(long, default_value = "")]
        duration: String,
    },

    /// Configure application settings
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "")]
    icon: &'static str,
    #[tabled(rename = "Activity")]
    name: &'static str,
    #[tabled(rename = "Slug")]
    slug: &'static str,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Heart Rate")]
    heart_rate: String,
    #[tabled(rename = "Breathing")]
    breathing: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

impl From<&ActivityRecord> for RecordRow {
    fn from(stored: &ActivityRecord) -> Self {
        let record = &stored.record;
        RecordRow {
            id: stored.id,
            created_at: record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            calories: record.calories.clone(),
            distance: record.distance.clone(),
            heart_rate: record.heart_rate.clone(),
            breathing: record.breathing.clone(),
            duration: record.duration.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.with_verbosity(cli.verbose);
    init_logging(&log_config)?;

    if let Some(path) = &config.sampling.bundled_json {
        if let Err(err) = log_bundled_json(path) {
            tracing::warn!(error = %err, "Bundled JSON not loaded");
        }
    }

    match cli.command {
        Commands::Activities => list_activities(),
        Commands::Track {
            activity,
            seconds,
            seed,
            save,
        } => track(&config, activity, seconds, seed, save).await?,
        Commands::Login { email, password } => login(&config, &email, &password).await?,
        Commands::Logout => {
            let mut settings = LocalSettings::load(&config.settings_path)?;
            settings.logout();
            settings.save(&config.settings_path)?;
            println!("{}", "✓ Logged out".green());
        }
        Commands::Status => status(&config)?,
        Commands::Records { format, output } => records(&config, &format, output).await?,
        Commands::Insert {
            calories,
            distance,
            heart_rate,
            breathing,
            duration,
        } => {
            let entry = ManualEntry {
                calories,
                distance,
                heart_rate,
                breathing,
                duration,
            };
            insert(&config, entry).await?;
        }
        Commands::Config { init, show } => {
            let path = cli.config.unwrap_or_else(AppConfig::default_config_path);
            if init {
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&path)?;
                println!("{} {}", "✓ Wrote".green(), path.display());
            }
            if show || !init {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn list_activities() {
    let rows: Vec<ActivityRow> = ActivityType::all()
        .iter()
        .map(|activity| ActivityRow {
            icon: activity.icon(),
            name: activity.name(),
            slug: activity.slug(),
        })
        .collect();
    println!("{}", "Select Activity".bold());
    println!("{}", Table::new(rows));
}

fn open_store(config: &AppConfig) -> Result<Box<dyn RecordStore>> {
    Ok(match config.backend.store {
        StoreKind::Remote => Box::new(RestRecordStore::from_settings(&config.backend)),
        StoreKind::Local => Box::new(
            SqliteRecordStore::open(&config.backend.local_db_path, &config.backend.table)
                .with_context(|| {
                    format!(
                        "Failed to open local store: {}",
                        config.backend.local_db_path.display()
                    )
                })?,
        ),
    })
}

fn metric_line(state: &TrackingState) -> String {
    state
        .metrics
        .iter()
        .map(|(metric, value)| format!("{} {}", metric.label(), metric.format_value(value)))
        .collect::<Vec<_>>()
        .join("  ")
}

async fn track(
    config: &AppConfig,
    activity: ActivityType,
    seconds: u64,
    seed: Option<u64>,
    save: bool,
) -> Result<()> {
    let seed = seed.or(config.sampling.random_seed);
    let hub = SensorHub::simulated(&config.simulation, seed);
    let (sink, events) = event_channel();
    let session = TrackingSession::new(hub, sink)
        .with_random(Box::new(SeededRandom::from_optional_seed(seed)))
        .with_motion_interval(config.motion_interval());

    let (tracker, driver) = SessionDriver::spawn(session, events);

    if !tracker.request_health_authorization().await? {
        println!(
            "{}",
            "Health permissions are needed for tracking activities.".yellow()
        );
    }

    println!("{} {}", activity.icon(), activity.name().bold());
    tracker.start(activity).await?;

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(120));

    let mut updates = tracker.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = metric_line(&updates.borrow_and_update());
                progress.set_message(line);
            }
        }
    }
    progress.finish_and_clear();

    let outcome = tracker.stop().await?;
    let summary = outcome.summary.clone();
    let workout = outcome.workout.clone();
    drop(tracker);
    let _ = driver.await;

    match outcome.into_parts() {
        (true, _) => println!("{}", "✓ Activity Saved".green().bold()),
        (false, Some(err)) => {
            log_error("stop", &err);
            println!("{} {}", "✗".red(), err.user_message().red());
        }
        (false, None) => println!("{}", "Activity was not saved".yellow()),
    }

    if let Some(record) = &workout {
        println!(
            "  Workout: {:?}, {} s",
            record.activity_type,
            record.duration_seconds()
        );
    }

    let Some(summary) = summary else {
        return Ok(());
    };

    let rows: Vec<MetricRow> = summary
        .metrics
        .iter()
        .map(|(metric, value)| MetricRow {
            metric: metric.label(),
            value: metric.format_value(value),
        })
        .collect();
    if rows.is_empty() {
        println!("  No metrics recorded");
    } else {
        println!("{}", Table::new(rows));
    }
    println!(
        "  {}",
        MetricType::Duration
            .format_value(summary.duration_minutes())
            .dimmed()
    );

    if save {
        let settings = LocalSettings::load(&config.settings_path)?;
        let store = open_store(config)?;
        match gateway::persist_summary(store.as_ref(), &settings, &summary).await {
            Ok(_) => println!("{}", "✓ Summary stored".green()),
            Err(err) => {
                log_error("save", &err);
                println!("{} {}", "✗".red(), err.user_message().red());
            }
        }
    }

    Ok(())
}

async fn login(config: &AppConfig, email: &str, password: &str) -> Result<()> {
    let client = RestAuthClient::from_settings(&config.backend);
    match client.sign_in(email, password).await {
        Ok(user_id) => {
            let mut settings = LocalSettings::load(&config.settings_path)?;
            settings.login(user_id.to_string());
            settings.save(&config.settings_path)?;
            println!("{} {}", "✓ Logged in as".green(), user_id);
        }
        Err(err) => {
            log_error("login", &err);
            println!("{} {}", "✗".red(), err.user_message().red());
        }
    }
    Ok(())
}

fn status(config: &AppConfig) -> Result<()> {
    let settings = LocalSettings::load(&config.settings_path)?;
    match settings.active_user() {
        Some(user) => println!("{} {}", "Logged in as".green(), user),
        None => println!("{}", "Not logged in".yellow()),
    }
    let store = match config.backend.store {
        StoreKind::Remote => config.backend.url.clone(),
        StoreKind::Local => config.backend.local_db_path.display().to_string(),
    };
    println!("  Store: {:?} ({})", config.backend.store, store);
    println!("  Table: {}", config.backend.table);
    Ok(())
}

async fn records(config: &AppConfig, format: &str, output: Option<PathBuf>) -> Result<()> {
    let store = open_store(config)?;
    let records = store.select_all().await.map_err(VitalRsError::from)?;

    if format.eq_ignore_ascii_case("table") && output.is_none() {
        if records.is_empty() {
            println!("{}", "No records".yellow());
        } else {
            let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
            println!("{}", Table::new(rows));
        }
        return Ok(());
    }

    let format = match ExportFormat::from_str(format) {
        Ok(format) => format,
        Err(_) => output
            .as_ref()
            .and_then(ExportFormat::from_path)
            .unwrap_or(ExportFormat::Csv),
    };

    match output {
        Some(path) => {
            export::export_records(&records, format, &path)?;
            println!(
                "{} {} records to {}",
                "✓ Exported".green(),
                records.len(),
                path.display()
            );
        }
        None => print!("{}", export::render_records(&records, format)?),
    }
    Ok(())
}

async fn insert(config: &AppConfig, entry: ManualEntry) -> Result<()> {
    let settings = LocalSettings::load(&config.settings_path)?;
    let Some(user_id) = settings.active_user() else {
        let err = VitalRsError::from(vitalrs::error::GatewayError::NotLoggedIn);
        println!("{} {}", "✗".red(), err.user_message().red());
        return Ok(());
    };

    let record = match entry.into_record(user_id, Utc::now()) {
        Ok(record) => record,
        Err(err) => {
            println!("{}", err.user_message().yellow());
            return Ok(());
        }
    };

    let store = open_store(config)?;
    match store.insert(&record).await {
        Ok(()) => println!("{}", "✓ Record inserted".green()),
        Err(err) => {
            let err = VitalRsError::from(err);
            log_error("insert", &err);
            println!("{} {}", "✗".red(), err.user_message().red());
        }
    }
    Ok(())
}
