use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use vacaigent::models::print_progress;
use vacaigent::{
    AppState, Planners, Settings, TripPlan, TripRequest, VacaigentConfig, api, telemetry, web,
};

#[derive(Parser)]
#[command(name = "vacaigent", version, about = "AI-powered trip planner")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Plan a single trip and print the itinerary
    Plan {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start_date: NaiveDate,
        /// YYYY-MM-DD
        #[arg(long)]
        end_date: NaiveDate,
        #[arg(long)]
        interests: String,
        /// Use only the primary model
        #[arg(long)]
        no_fallback: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets may come from a .env file
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = Arc::new(
        VacaigentConfig::load_from_path(cli.config.clone())
            .context("Failed to load configuration")?,
    );
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let settings = Arc::new(Settings::global().clone());
    let planners = Planners::from_config(settings.clone(), config.clone())?;

    match cli.command {
        Command::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }

            let missing = settings.missing_required();
            if !missing.is_empty() {
                warn!(
                    "Missing API keys: {}. Planning requests will be rejected",
                    missing.join(", ")
                );
            }

            let state = AppState {
                settings,
                planner: planners.primary,
                ui_planner: planners.with_fallback,
                stream: config.stream.clone(),
            };
            web::run(&server, api::router(state)).await
        }
        Command::Plan {
            origin,
            destination,
            start_date,
            end_date,
            interests,
            no_fallback,
        } => {
            settings.require_keys()?;
            let trip = TripPlan::try_from(TripRequest {
                origin,
                destination,
                start_date,
                end_date,
                interests,
            })?;

            let planner = if no_fallback {
                planners.primary
            } else {
                planners.with_fallback
            };
            info!("Planning {} ({}) with {}", trip.destination, trip.dates, planner.name());

            let (tx, rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(print_progress(rx, std::io::stderr()));

            let result = planner.plan(&trip, Some(&tx)).await;
            drop(tx);
            match printer.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Failed to print progress: {}", e),
                Err(e) => warn!("Progress printer task failed: {}", e),
            }

            match result {
                Ok(output) => {
                    println!("{output}");
                    Ok(())
                }
                Err(e) => {
                    error!("Trip planning failed: {}", e);
                    Err(anyhow::anyhow!(e.user_message()))
                }
            }
        }
    }
}
