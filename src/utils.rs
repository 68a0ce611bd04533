use std::path::Path;

use color_eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::Config;

/// Install error reports and the log subscriber.
///
/// `RUST_LOG` wins over the default of `info` for the library and `target`.
pub fn init_logging(target: &str) -> Result<()> {
    color_eyre::install()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stereo_rig=info,{target}=info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();
    Ok(())
}

/// Load the layered configuration and log where it came from
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path)?;
    match path {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("Using default configuration"),
    }
    Ok(config)
}
