//! Burnin - Video Burn-in Compositor
//!
//! Command line entry point: loads configuration and job files and runs
//! burn-in renders through ffprobe and ffmpeg.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use burnin::burnins::{burnins_from_data, plan};
use burnin::cli::{Args, Commands};
use burnin::config::Config;
use burnin::job::Job;
use burnin::media::MediaProcessorFactory;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("burnin.toml").exists() {
                info!("Found burnin.toml in current directory, loading...");
                Config::from_file("burnin.toml")?
            } else {
                Config::default()
            }
        }
    };

    let media = MediaProcessorFactory::create_processor(config.media.clone());

    match args.command {
        Commands::Render { job, no_overwrite } => {
            info!("* Burnin script started");
            let mut job = Job::from_file(&job)?;
            if no_overwrite {
                job.overwrite = false;
            }

            media.check_availability().await?;
            burnins_from_data(media.as_ref(), &config, &job).await?;
            info!("* Burnin script has finished");
        }
        Commands::Command { job } => {
            let job = Job::from_file(&job)?;
            let streams = media.probe(&job.input).await?;
            let plan = plan(&config, &job, streams)?;
            println!("{}", plan.command().command_line());
        }
        Commands::Probe { input } => {
            let streams = media.probe(&input).await?;
            println!("{}", serde_json::to_string_pretty(&streams)?);
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            info!("Default configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".burnin").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "burnin.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("burnin.log").display()
    );

    Ok(())
}
