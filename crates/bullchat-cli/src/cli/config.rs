use std::path::Path;

use anyhow::{Context, Result};
use bullchat_core::{CoreConfig, Identity, Network};

/// Resolve the core configuration.
///
/// Priority: `--config` file, then the default config file if it exists,
/// then `BULLCHAT_*` environment variables. `--network` and `--identity`
/// are applied on top.
pub fn resolve_config(
    path: Option<&Path>,
    network: Option<&str>,
    identity: Option<&str>,
) -> Result<CoreConfig> {
    let mut config = match path {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => match CoreConfig::default_path().filter(|p| p.exists()) {
            Some(path) => CoreConfig::load(&path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?,
            None => CoreConfig::from_env().context("Invalid BULLCHAT_* environment")?,
        },
    };

    if let Some(network) = network {
        let network = Network::parse(network);
        if network != config.network {
            let defaults = CoreConfig::for_network(network);
            config.network = network;
            config.host = defaults.host;
            config.canister_id = defaults.canister_id;
        }
    }
    if let Some(identity) = identity.filter(|i| !i.trim().is_empty()) {
        config.identity = Some(Identity::new(identity.trim()));
    }

    Ok(config)
}
