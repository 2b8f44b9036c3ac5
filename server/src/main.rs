//! Portal backend - Entry Point
//!
//! API service for the client portal: authenticates callers, reports
//! deployment health across hosting platforms, and serves GitHub-backed
//! project data. Health check cadence is driven by an external scheduler
//! hitting the monitoring endpoints.

use std::env;

use portald::app::options::AppOptions;
use portald::app::run::run;
use portald::logs::{init_logging, LogOptions};
use portald::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    // Print version and exit
    let version = version_info();
    if args.iter().any(|a| a == "--version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: env::var("PORTAL_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default(),
        json_format: env::var("PORTAL_LOG_JSON").as_deref() == Ok("true"),
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    let options = AppOptions::from_env();
    info!("Running portald {} with options: {:?}", version.version, options);

    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the portal backend: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
