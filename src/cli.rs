use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render burn-ins described by a job file
    Render {
        /// Job description (JSON)
        #[arg(short, long)]
        job: PathBuf,

        /// Fail instead of replacing an existing output
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Print the ffmpeg command for a job without running it
    Command {
        /// Job description (JSON)
        #[arg(short, long)]
        job: PathBuf,
    },

    /// Show the streams ffprobe reports for a media file
    Probe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "burnin.toml")]
        output: PathBuf,
    },
}
