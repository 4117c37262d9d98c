//! Binary entrypoint for the carousel.
//!
//! Wires the fetcher and presenter tasks together; all logic lives in the library crate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use reddit_carousel::config::Configuration;
use reddit_carousel::events::{ConfigUpdate, FetchOutcome};
use reddit_carousel::render::TextRenderer;
use reddit_carousel::tasks::{fetcher, presenter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "reddit-carousel",
    version,
    about = "Rotating carousel of link-aggregator posts"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("reddit_carousel={level}").parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", cli.config.display(), cfg);

    // Channels (small/bounded)
    let (config_tx, config_rx) = mpsc::channel::<ConfigUpdate>(4); // Presenter -> Fetcher
    let (outcome_tx, outcome_rx) = mpsc::channel::<FetchOutcome>(4); // Fetcher -> Presenter

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let client = fetcher::build_client(cfg.request_timeout).context("building HTTP client")?;
    let mut tasks = JoinSet::new();

    // Fetcher
    tasks.spawn({
        let base_url = cfg.base_url.clone();
        let cancel = cancel.clone();
        async move {
            fetcher::run(client, base_url, config_rx, outcome_tx, cancel)
                .await
                .context("fetcher task failed")
        }
    });

    // Presenter
    tasks.spawn({
        let options = presenter::PresenterOptions::from_config(&cfg);
        let update = cfg.config_update();
        let renderer = TextRenderer::new(std::io::stdout(), cfg.toggles.clone(), cfg.display_type);
        let cancel = cancel.clone();
        async move {
            presenter::run(options, update, config_tx, outcome_rx, renderer, cancel)
                .await
                .context("presenter task failed")
        }
    });

    // Either task ending stops the other.
    while let Some(res) = tasks.join_next().await {
        cancel.cancel();
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}
