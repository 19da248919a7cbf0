use crate::error::{CoreError, Result};
use crate::types::{Amount, GameType, Network, WagerIdentity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Custodial account every escrow transfer is sent to.
pub const DEFAULT_ESCROW_ACCOUNT: &str = "FAGSx7VdV8PZXfZs7n6NPYdt54uGHTykZ5WxzaUEaY91";

/// Embedder options for one wager session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerConfig {
    pub game_website_host: String,
    pub game_id: String,
    pub player_id: String,
    pub game_type: GameType,
    pub amount_bet: Amount,
    pub network: Network,
    pub cancellation_seconds: u64,
    pub blockchain_type: String,
    pub escrow_account: String,
    pub backend_url: String,
    pub ledger_rpc_url: String,
    pub confirmation_timeout: Duration,
    pub confirmation_poll_interval: Duration,
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            game_website_host: String::new(),
            game_id: String::new(),
            player_id: String::new(),
            game_type: GameType::Multiplayer,
            amount_bet: Amount::from_lamports(100_000_000), // 0.1
            network: Network::Devnet,
            cancellation_seconds: 60,
            blockchain_type: "solana".to_string(),
            escrow_account: DEFAULT_ESCROW_ACCOUNT.to_string(),
            backend_url: "http://localhost:3000/api".to_string(),
            ledger_rpc_url: "https://api.devnet.solana.com".to_string(),
            confirmation_timeout: Duration::from_secs(60),
            confirmation_poll_interval: Duration::from_millis(500),
        }
    }
}

impl WagerConfig {
    pub fn new(network: Network) -> Self {
        let mut config = Self::default();
        config.network = network;

        match network {
            Network::Devnet => {
                // keep defaults for devnet
            }
            Network::Mainnet => {
                config.ledger_rpc_url = "https://api.mainnet-beta.solana.com".to_string();
            }
        }

        config
    }

    pub fn with_game(
        mut self,
        game_website_host: impl Into<String>,
        game_id: impl Into<String>,
        player_id: impl Into<String>,
    ) -> Self {
        self.game_website_host = game_website_host.into();
        self.game_id = game_id.into();
        self.player_id = player_id.into();
        self
    }

    pub fn identity(&self) -> Result<WagerIdentity> {
        WagerIdentity::new(self.game_website_host.clone(), self.game_id.clone())
    }

    pub fn validate(&self) -> Result<()> {
        self.identity()?;

        if self.player_id.trim().is_empty() {
            return Err(CoreError::config("Player ID cannot be empty"));
        }

        if self.amount_bet.is_zero() {
            return Err(CoreError::config("Bet amount must be greater than 0"));
        }

        if self.escrow_account.is_empty() {
            return Err(CoreError::config("Escrow account cannot be empty"));
        }

        if self.backend_url.is_empty() {
            return Err(CoreError::config("Backend URL cannot be empty"));
        }

        if self.ledger_rpc_url.is_empty() {
            return Err(CoreError::config("Ledger RPC URL cannot be empty"));
        }

        if self.confirmation_poll_interval.is_zero() {
            return Err(CoreError::config(
                "Confirmation poll interval must be greater than 0",
            ));
        }

        Ok(())
    }
}
