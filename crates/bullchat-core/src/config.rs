use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    LOCAL_CANISTER_ID, LOCAL_HOST, MAINNET_CANISTER_ID, MAINNET_HOST, MESSAGE_WINDOW,
    POLL_INTERVAL, REQUEST_TIMEOUT,
};
use crate::error::ChatError;
use crate::models::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Local,
    #[serde(alias = "ic")]
    Mainnet,
}

impl Network {
    /// Anything other than "ic"/"mainnet" means a local replica.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ic" | "mainnet" => Network::Mainnet,
            _ => Network::Local,
        }
    }

    pub fn default_host(self) -> &'static str {
        match self {
            Network::Local => LOCAL_HOST,
            Network::Mainnet => MAINNET_HOST,
        }
    }

    pub fn default_canister_id(self) -> &'static str {
        match self {
            Network::Local => LOCAL_CANISTER_ID,
            Network::Mainnet => MAINNET_CANISTER_ID,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub network: Network,
    pub host: String,
    pub canister_id: String,
    /// Principal used for calls; `None` means anonymous
    pub identity: Option<Identity>,
    pub poll_interval: Duration,
    pub message_limit: u32,
    pub request_timeout: Duration,
}

/// On-disk shape: every field optional, layered over defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    network: Option<Network>,
    host: Option<String>,
    canister_id: Option<String>,
    identity: Option<String>,
    poll_interval_ms: Option<u64>,
    message_limit: Option<u32>,
    request_timeout_ms: Option<u64>,
}

impl CoreConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            host: network.default_host().to_string(),
            canister_id: network.default_canister_id().to_string(),
            identity: None,
            poll_interval: POLL_INTERVAL,
            message_limit: MESSAGE_WINDOW,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Build from `BULLCHAT_*` environment variables.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = lookup("BULLCHAT_NETWORK")
            .map(|v| Network::parse(&v))
            .unwrap_or(Network::Local);
        let mut config = Self::for_network(network);

        if let Some(host) = lookup("BULLCHAT_HOST").filter(|v| !v.is_empty()) {
            config.host = host;
        }
        if let Some(id) = lookup("BULLCHAT_CANISTER_ID").filter(|v| !v.is_empty()) {
            config.canister_id = id;
        }
        if let Some(identity) = lookup("BULLCHAT_IDENTITY").filter(|v| !v.is_empty()) {
            config.identity = Some(Identity::new(identity));
        }
        if let Some(ms) = lookup("BULLCHAT_POLL_MS") {
            let ms = parse_number::<u64>("BULLCHAT_POLL_MS", &ms)?;
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(limit) = lookup("BULLCHAT_MESSAGE_LIMIT") {
            config.message_limit = parse_number("BULLCHAT_MESSAGE_LIMIT", &limit)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file layered over the defaults of its network.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ChatError> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|e| ChatError::Config(e.to_string()))?;

        let mut config = Self::for_network(file.network.unwrap_or(Network::Local));
        if let Some(host) = file.host {
            config.host = host;
        }
        if let Some(id) = file.canister_id {
            config.canister_id = id;
        }
        config.identity = file.identity.map(Identity::new);
        if let Some(ms) = file.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(limit) = file.message_limit {
            config.message_limit = limit;
        }
        if let Some(ms) = file.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// `~/.config/bullchat/config.json` (platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bullchat").join("config.json"))
    }

    fn validate(&self) -> Result<(), ChatError> {
        if self.poll_interval.is_zero() {
            return Err(ChatError::Config("poll interval must be positive".into()));
        }
        if self.message_limit == 0 {
            return Err(ChatError::Config("message limit must be positive".into()));
        }
        if self.host.trim().is_empty() {
            return Err(ChatError::Config("host must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::for_network(Network::Local)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ChatError> {
    value
        .trim()
        .parse()
        .map_err(|_| ChatError::Config(format!("{key} must be a number, got {value:?}")))
}
