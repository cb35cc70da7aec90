use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brains::{Config, Server, Stores, app};

/// Humans and zombies over a versioned REST API.
#[derive(Debug, Parser)]
#[command(name = "brains", version, about)]
struct Args {
    /// TOML configuration file. Built-in defaults when omitted.
    #[arg(short, long, env = "BRAINS_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the configured bind address.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), brains::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    info!(
        namespace = %config.namespace,
        default_locale = %config.default_locale,
        versions = config.versions.len(),
        "configuration loaded",
    );

    let router = app::router(&config, &Stores::default());
    Server::bind(config.bind)
        .body_limit(config.body_limit)
        .serve(router)
        .await
}
