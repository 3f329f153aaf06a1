//! Streaming Admin - desktop administration tool for a streaming service database.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use eframe::egui;
use streaming_admin::config::{AppConfig, ConfigLoadResult};
use streaming_admin::db;
use streaming_admin::populate::{self, PopulateOptions};
use streaming_admin::profiles::ProfileStore;
use streaming_admin::ui::App;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Desktop administration tool for a streaming service database.
#[derive(Parser)]
#[command(name = "streaming-admin", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the admin GUI (default)
    Gui,
    /// Generate mock data through the JSON, Excel and direct sources
    Populate {
        /// Target database; defaults to the configured PostgreSQL server
        #[arg(long)]
        database_url: Option<String>,
        /// Directory for the JSON and Excel fixture files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Drop and recreate every table first
        #[arg(long)]
        reset: bool,
        /// Rows per table across all sources
        #[arg(long)]
        rows: Option<u32>,
        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check row counts and references without inserting anything
    Verify {
        /// Target database; defaults to the configured PostgreSQL server
        #[arg(long)]
        database_url: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging();

    tracing::info!("Streaming Admin starting...");

    // Determine config path based on mode
    let config_path = if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
        PathBuf::from("config.toml")
    } else {
        AppConfig::default_path()
    };
    tracing::info!("Config path: {:?}", config_path);

    let (config, config_error) = load_config(&config_path);

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => run_gui(config, config_error, &config_path),
        Command::Populate {
            database_url,
            data_dir,
            reset,
            rows,
            seed,
        } => {
            let mut options = PopulateOptions::from_config(&config.populate);
            if let Some(dir) = data_dir {
                options.data_dir = dir;
            }
            if let Some(rows) = rows {
                options.rows_per_table = rows;
            }
            options.reset = reset;
            options.seed = seed;
            let url = database_url.unwrap_or_else(|| config.database.connection_string());
            run_populate(&url, &options)
        }
        Command::Verify { database_url } => {
            let url = database_url.unwrap_or_else(|| config.database.connection_string());
            run_verify(&url, config.populate.min_rows)
        }
    }
}

/// Console output plus a daily log file in the data directory.
///
/// The returned guard flushes the file writer on drop.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer().with_target(false);

    let log_dir = AppConfig::data_dir().join("logs");
    match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "streaming-admin.log"));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry().with(env_filter).with(console).init();
            tracing::warn!("File logging disabled, cannot create {:?}: {}", log_dir, e);
            None
        }
    }
}

/// Load the config, writing defaults on first run.
fn load_config(path: &Path) -> (AppConfig, Option<String>) {
    match AppConfig::try_load(path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            (config, None)
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, writing defaults");
            let config = AppConfig::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Could not write default config: {}", e);
            }
            (config, None)
        }
        ConfigLoadResult::Invalid(e) => {
            tracing::warn!("Config invalid: {}", e);
            (AppConfig::default(), Some(format!("Config file is invalid, using defaults: {}", e)))
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create tokio runtime")
}

/// Run the admin GUI.
fn run_gui(config: AppConfig, config_error: Option<String>, config_path: &Path) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Streaming Admin")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    // Create tokio runtime for async operations
    let rt = runtime()?;

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let connections = ProfileStore::load_or_empty(&ProfileStore::default_path(config_dir));
    tracing::info!("{} saved connection(s)", connections.len());

    eframe::run_native(
        "Streaming Admin",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);

            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);

            let mut app = App::new(config, connections, rt);
            app.error_message = config_error;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}

/// Populate the target database and print a per-source summary.
fn run_populate(url: &str, options: &PopulateOptions) -> anyhow::Result<()> {
    let rt = runtime()?;

    rt.block_on(async {
        let conn = db::connect(url).await.context("Failed to connect to database")?;
        tracing::info!(
            "Populating {} rows per table (fixtures in {:?})",
            options.rows_per_table,
            options.data_dir
        );

        let summary = populate::populate(&conn, options).await?;

        for report in &summary.sources {
            println!("{:<8} {:>7} rows {:>7} ms", report.source.name(), report.rows, report.elapsed_ms);
        }
        println!("Total: {} rows", summary.total_rows());
        print_verification(&summary.verification);

        if !summary.verification.passed() {
            anyhow::bail!("Verification failed");
        }
        anyhow::Ok(())
    })
}

/// Verify an already populated database.
fn run_verify(url: &str, threshold: u64) -> anyhow::Result<()> {
    let rt = runtime()?;

    rt.block_on(async {
        let conn = db::connect(url).await.context("Failed to connect to database")?;
        let report = populate::verify(&conn, threshold).await?;
        print_verification(&report);

        if !report.passed() {
            anyhow::bail!("Verification failed");
        }
        anyhow::Ok(())
    })
}

fn print_verification(report: &populate::VerificationReport) {
    println!("Verification (threshold {}):", report.threshold);
    for line in report.lines() {
        println!("  {}", line);
    }
    println!("  {}", if report.passed() { "PASSED" } else { "FAILED" });
}
