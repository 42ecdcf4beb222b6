use anyhow::Context;
use clap::{value_parser, Arg, Command};
use std::path::PathBuf;
use tileguard_core::TileGrid;
use tileguard_service::{Config, DirectoryRepository, HttpTileFetcher, Watcher, WebhookDispatcher};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("tileguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches pixel-art patterns on a tiled canvas and reports defacement")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("Path to the YAML config file (falls back to $CONFIG_FILE)"),
        )
        .get_matches();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .or_else(|| std::env::var_os("CONFIG_FILE").map(PathBuf::from))
        .context("no config file given; pass --config or set CONFIG_FILE")?;
    let config = Config::load(&config_path)?;
    info!(config = %config_path.display(), "config loaded");

    let grid = TileGrid::STANDARD;
    let client = reqwest::Client::new();
    let repository = DirectoryRepository::new(&config.pattern_directory, grid);
    let fetcher = HttpTileFetcher::new(client.clone(), &config.tile_url);
    let dispatcher = WebhookDispatcher::new(client, &config.webhook_url);

    let mut watcher = Watcher::new(grid, repository, fetcher, dispatcher, config.remind_interval());
    watcher
        .bootstrap()
        .context("initial pattern load failed")?;

    info!("tileguard started");
    watcher
        .run(config.refresh_interval(), config.directory_refresh_interval())
        .await;
    Ok(())
}
