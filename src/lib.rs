pub mod api;
pub mod clients;
pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

pub use config::Config;
use scheduler::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("daemon" | "-d" | "--daemon") => run_daemon(config).await,

        Some("check" | "-c" | "--check") => run_single_check(config).await,

        Some("init") => {
            let created = Config::create_default_if_missing()?;
            if created {
                println!("Default config written");
            } else {
                println!("Config already exists, leaving it alone");
            }
            Ok(())
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Rollcall - Campus Administration Backend");
    println!("Student records, attendance tracking and credential lifecycle");
    println!();
    println!("USAGE:");
    println!("  rollcall [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  daemon            Run the HTTP API and the scheduled jobs (default)");
    println!("  check             Run the maintenance jobs once and exit");
    println!("  init              Write a default config file if none exists");
    println!("  help              Show this help");
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Rollcall v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let state = Arc::new(SharedState::new(config.clone()).await?);

    let scheduler = Arc::new(Scheduler::new((*state).clone(), config.scheduler.clone()));
    let scheduler_handle = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = scheduler.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    let port = config.server.port;
    let app = api::router(Arc::clone(&state)).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API listening on http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    // Let the scheduler wind down its cron runner before the process exits.
    scheduler.stop().await;
    scheduler_handle.await.ok();
    server_handle.abort();
    info!("Daemon stopped");

    Ok(())
}

async fn run_single_check(config: Config) -> anyhow::Result<()> {
    info!("Running maintenance jobs once...");

    let state = SharedState::new(config.clone()).await?;
    let scheduler = Scheduler::new(state, config.scheduler);
    scheduler.run_once().await?;

    info!("Done");
    Ok(())
}
