use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use stadium_etl::{
    config::PipelineConfig,
    fetch,
    geocode::{NominatimGeocoder, RateLimitedGeocoder},
    mailbox::DirMailbox,
    pipeline,
};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "stadium_etl", about = "Wikipedia stadium list → geocoded CSV")]
struct Cli {
    /// Page holding the stadium table
    #[arg(long, global = true)]
    url: Option<String>,
    /// Directory for the CSV output
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Directory stages use to hand data to each other
    #[arg(long, global = true)]
    mailbox_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the page and publish the extracted rows
    Extract,
    /// Geocode and clean the extracted rows
    Transform,
    /// Write the transformed rows to a timestamped CSV
    Load,
    /// All three stages in one process, retrying extract on failure
    Run,
}

fn geocoder(cfg: &PipelineConfig) -> Result<RateLimitedGeocoder<NominatimGeocoder>> {
    Ok(RateLimitedGeocoder::new(
        NominatimGeocoder::new(&cfg.geocoder)?,
        cfg.geocoder.min_interval,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) configuration: defaults < env < flags ────────────────────
    let cli = Cli::parse();
    let mut cfg = PipelineConfig::from_env()?;
    if let Some(url) = cli.url {
        cfg.source_url = url;
    }
    if let Some(dir) = cli.output_dir {
        cfg.output_dir = dir;
    }
    if let Some(dir) = cli.mailbox_dir {
        cfg.mailbox_dir = dir;
    }
    info!(url = %cfg.source_url, out = %cfg.output_dir.display(), "startup");

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Commands::Extract => {
            let mailbox = DirMailbox::new(&cfg.mailbox_dir)?;
            let client = fetch::build_client(&cfg.fetch)?;
            let rows = pipeline::extract_stage(&client, &cfg.source_url, &mailbox).await?;
            info!(rows, "extract done");
        }
        Commands::Transform => {
            let mailbox = DirMailbox::new(&cfg.mailbox_dir)?;
            let rows = pipeline::transform_stage(&geocoder(&cfg)?, &mailbox).await?;
            info!(rows, "transform done");
        }
        Commands::Load => {
            let mailbox = DirMailbox::new(&cfg.mailbox_dir)?;
            let path = pipeline::load_stage(&mailbox, &cfg.output_dir, Local::now())?;
            info!(path = %path.display(), "load done");
        }
        Commands::Run => {
            let path = pipeline::run(&cfg, &geocoder(&cfg)?).await?;
            info!(path = %path.display(), "all done");
        }
    }

    Ok(())
}
