use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use delaywatch::config::{load_config, AppConfig};
use delaywatch::feeds::HttpSearchFetcher;
use delaywatch::notify::{DryRunNotifier, Notifier, SmsNotifier};
use delaywatch::poller::{CycleReport, PollSettings, Poller};

/// Text subscribers when transit delay chatter spikes.
#[derive(Parser)]
#[command(name = "delaywatch", version, about, long_about = None)]
struct Cli {
    /// Path to config file (defaults to <config dir>/delaywatch/delaywatch.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Log notifications instead of sending SMS
    #[arg(long)]
    dry_run: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "delaywatch=info",
        1 => "delaywatch=debug",
        _ => "delaywatch=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => fmt().with_env_filter(env_filter).with_target(false).init(),
        LogFormat::Json => fmt().json().with_env_filter(env_filter).init(),
    }
}

fn build_notifier(config: &AppConfig, dry_run: bool) -> Result<Box<dyn Notifier>> {
    if dry_run {
        return Ok(Box::new(DryRunNotifier));
    }
    let sms = SmsNotifier::from_config(&config.sms).context("failed to set up SMS notifier")?;
    Ok(Box::new(sms))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = load_config(cli.config.as_deref()).context("failed to load config")?;
    let notifier = build_notifier(&config, cli.dry_run)?;
    let fetcher = HttpSearchFetcher::new(config.search.url(), config.search.timeout());
    info!(url = fetcher.url(), notifier = notifier.id(), "starting delaywatch");

    let mut poller = Poller::new(Box::new(fetcher), notifier, PollSettings::from(&config));

    if cli.once {
        match poller.run_cycle(Utc::now()).await {
            CycleReport::FetchFailed(reason) => println!("Fetch failed: {}", reason),
            CycleReport::NoUpdates { max_id } => println!("No updates (max_id {}).", max_id),
            CycleReport::Processed(summary) => {
                println!(
                    "max_id {}: {} valid, {} delayed, {} notified",
                    summary.max_id, summary.valid, summary.delayed, summary.sent
                );
                if let Some(path) = summary.log_path {
                    println!("Wrote {}", path.display());
                }
            }
        }
        return Ok(());
    }

    poller.run().await;
    Ok(())
}
