//! framepulse - frame-rate telemetry and benchmark runner
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use framepulse::{AppContext, HeadlessEvent};
use framepulse_core::logging;

/// framepulse - frame-rate telemetry and benchmark runner
#[derive(Parser, Debug)]
#[command(name = "framepulse")]
#[command(about = "Frame-rate telemetry and benchmark runner", long_about = None)]
struct Args {
    /// Directory holding config.toml, history and logs
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of <DIR>/config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed synthetic frames through a live aggregator and print snapshots
    Live {
        /// Number of frames to sample
        #[arg(long, default_value_t = 600)]
        frames: u64,
    },

    /// Run a timed benchmark and store its result
    Bench {
        /// Run length (default from config)
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Profile label for the result (default: current profile)
        #[arg(long)]
        profile: Option<String>,
    },

    /// List stored results, newest first
    History {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        profile: Option<String>,
    },

    /// Delete all stored results
    Clear,

    /// Show or set the current profile
    Profile {
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let data_dir = args.data_dir.unwrap_or_else(logging::default_data_dir);
    logging::init(&logging::log_directory(&data_dir))?;

    let ctx = AppContext::open(&data_dir, args.config.as_deref())?;

    let result = match args.command {
        Command::Live { frames } => framepulse::run_live(&ctx, frames).await.map(|_| ()),
        Command::Bench {
            duration_ms,
            profile,
        } => framepulse::run_bench(&ctx, duration_ms, profile)
            .await
            .map(|_| ()),
        Command::History { limit, profile } => {
            framepulse::run_history(&ctx, limit, profile.as_deref())
                .await
                .map(|_| ())
        }
        Command::Clear => framepulse::run_clear(&ctx).await,
        Command::Profile { name } => framepulse::run_profile(&ctx, name.as_deref())
            .await
            .map(|_| ()),
    };

    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
        HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
    }
    result?;

    Ok(())
}
