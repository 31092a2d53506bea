use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use commentwatch_common::{load_config, AppConfig};
use commentwatch_pipeline::{Pipeline, PromptTemplate};

#[derive(Parser)]
#[command(name = "commentwatch", about = "YouTube comment sentiment collector")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/commentwatch.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect, classify and store new comments
    Run {
        /// Repeat every N minutes instead of exiting after one pass
        #[arg(long)]
        every_minutes: Option<u64>,
    },
    /// Validate config and prompt, then print resolved paths
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("commentwatch=info,youtube_client=info,ai_client=info"));
    if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config_path = cli.config.canonicalize().with_context(|| {
        format!(
            "Config file not found: {}. Create one or specify --config <path>",
            cli.config.display()
        )
    })?;
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    info!(config = %config_path.display(), "Loading config");

    let file_config = load_config(&config_path)?;
    let prompt_path = file_config.prompt_path(config_dir);
    let template = PromptTemplate::load(&prompt_path)?;
    info!(prompt = %prompt_path.display(), "Prompt template loaded and validated");

    let app_config = AppConfig::from_env();
    let pipeline = Pipeline::from_config(&file_config, &app_config, config_dir, template)?;

    match cli.command {
        Command::Check => {
            let paths = pipeline.paths();
            info!(
                comments = %paths.comments.display(),
                stats = %paths.stats.display(),
                model = file_config.classification.model.as_str(),
                batch_size = file_config.classification.batch_size,
                "Config OK"
            );
        }
        Command::Run { every_minutes: None } => {
            let report = pipeline.run().await?;
            info!("{report}");
        }
        Command::Run {
            every_minutes: Some(minutes),
        } => {
            let period = Duration::from_secs(minutes.max(1) * 60);
            info!(minutes = minutes.max(1), "Running on a fixed schedule");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match pipeline.run().await {
                    Ok(report) => info!("{report}"),
                    Err(e) => error!(error = %format!("{e:#}"), "Run failed"),
                }
            }
        }
    }

    Ok(())
}
