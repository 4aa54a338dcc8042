use std::sync::{Arc, PoisonError};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odyssey::api::{self, AppContext};
use odyssey::config::AppConfig;
use odyssey::engine::Engine;
use odyssey::generator::HttpGenerator;
use odyssey::store::PersistentStore;

#[derive(Parser)]
#[command(name = "odyssey")]
#[command(about = "Progression engine and state store for the Odyssey learning dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the engine over HTTP
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print a summary of the stored progress
    Status,
    /// Delete all stored progress (onboarding will run again)
    Reset,
    /// Print the effective configuration
    Config {
        /// Write the config file back with defaults filled in (environment
        /// overrides are not saved)
        #[arg(long)]
        save: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "odyssey=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_store(config: &AppConfig) -> anyhow::Result<PersistentStore> {
    match &config.db_path {
        Some(path) => PersistentStore::open(path.clone()),
        None => PersistentStore::open_default(),
    }
}

async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting Odyssey engine on port {}", port);

    let store = open_store(&config)?;
    let engine = Engine::new(config.engine.clone(), store);

    let generator = HttpGenerator::new(config.generator_url.clone(), config.generator_key.clone());
    if !generator.is_configured() {
        tracing::warn!("ODYSSEY_GENERATOR_URL not set, project generation will fail");
    }

    let ctx = AppContext::new(engine, Arc::new(generator));
    let shared = ctx.shared_engine();
    let clock = api::spawn_clock(shared.clone(), config.tick());
    let app = api::create_router(ctx);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Odyssey listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    clock.abort();
    let report = shared.lock().unwrap_or_else(PoisonError::into_inner).flush();
    tracing::info!(written = report.written, failed = report.failed, "Final flush");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load();

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        Some(Commands::Status) => {
            let engine = Engine::new(config.engine.clone(), open_store(&config)?);
            let snapshot = engine.snapshot();
            println!("XP:            {}", snapshot.state.xp);
            println!("Roadmap:       {}%", snapshot.roadmap_progress);
            println!("{}", snapshot.mentor_context);
            match snapshot.task_sync_percent {
                Some(sync) => println!(
                    "Tasks:         {} ({}% complete)",
                    snapshot.state.project_tasks.len(),
                    sync
                ),
                None => println!("Tasks:         none"),
            }
            println!("Onboarded:     {}", snapshot.state.onboarding_completed);
            for entry in snapshot.state.logs.iter().rev().take(5) {
                println!("  [{}] {}", entry.timestamp, entry.text);
            }
        }
        Some(Commands::Reset) => {
            let mut store = open_store(&config)?;
            let removed = store.clear()?;
            println!("Removed {} stored values", removed);
        }
        Some(Commands::Config { save }) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                AppConfig::load_file().save()?;
                println!("Saved");
            }
        }
        None => serve(config, 3000).await?,
    }

    Ok(())
}
