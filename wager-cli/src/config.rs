use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use wager_core::{Network, WagerConfig, DEFAULT_ESCROW_ACCOUNT};

const CONFIG_FILE: &str = "config.json";

/// Endpoint settings persisted in the data directory. Command flags win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub backend_url: String,
    pub default_network: Network,
    pub ledger_rpc_url: Option<String>,
    pub escrow_account: String,
    pub cancellation_seconds: u64,
    pub poll_interval_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000/api".to_string(),
            default_network: Network::Devnet,
            ledger_rpc_url: None,
            escrow_account: DEFAULT_ESCROW_ACCOUNT.to_string(),
            cancellation_seconds: 60,
            poll_interval_secs: 3,
        }
    }
}

impl CliConfig {
    /// Read `config.json` from the data directory, writing the defaults on first run.
    pub async fn load_or_init(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);

        if !path.exists() {
            let config = Self::default();
            let json = serde_json::to_string_pretty(&config)?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::debug!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Base wager configuration for `network`, before game-specific fields are set.
    pub fn wager_config(&self, network: Option<Network>) -> WagerConfig {
        let mut config = WagerConfig::new(network.unwrap_or(self.default_network));
        config.backend_url = self.backend_url.clone();
        config.escrow_account = self.escrow_account.clone();
        config.cancellation_seconds = self.cancellation_seconds;
        if let Some(url) = &self.ledger_rpc_url {
            config.ledger_rpc_url = url.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_first_load_writes_defaults() {
        let temp_dir = tempdir().unwrap();

        let config = CliConfig::load_or_init(temp_dir.path()).await.unwrap();
        assert!(temp_dir.path().join(CONFIG_FILE).exists());
        assert_eq!(config.escrow_account, DEFAULT_ESCROW_ACCOUNT);

        let reloaded = CliConfig::load_or_init(temp_dir.path()).await.unwrap();
        assert_eq!(reloaded.backend_url, config.backend_url);
    }

    #[tokio::test]
    async fn test_partial_file_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        tokio::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            r#"{ "backend_url": "https://wagers.example/api", "default_network": "mainnet" }"#,
        )
        .await
        .unwrap();

        let config = CliConfig::load_or_init(temp_dir.path()).await.unwrap();
        assert_eq!(config.backend_url, "https://wagers.example/api");
        assert_eq!(config.cancellation_seconds, 60);

        let wager = config.wager_config(None);
        assert_eq!(wager.network, Network::Mainnet);
        assert_eq!(wager.ledger_rpc_url, "https://api.mainnet-beta.solana.com");
        assert_eq!(wager.backend_url, "https://wagers.example/api");
    }
}
