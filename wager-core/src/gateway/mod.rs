pub mod http;

pub use http::HttpGateway;

use crate::error::GatewayError;
use crate::types::{Ack, Amount, EscrowReceipt, GameType, Network, WagerIdentity, WagerStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub game_website_host: String,
    pub game_id: String,
}

impl From<&WagerIdentity> for StatusRequest {
    fn from(identity: &WagerIdentity) -> Self {
        Self {
            game_website_host: identity.game_website_host().to_string(),
            game_id: identity.game_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWagerRequest {
    pub game_website_host: String,
    pub game_id: String,
    pub player_one_id: String,
    pub player_one_public_key: String,
    pub blockchain_type: String,
    pub amount_bet: String,
    pub signature_transaction_one: String,
    pub game_type: GameType,
    pub network: Network,
}

impl CreateWagerRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: &WagerIdentity,
        player_one_id: &str,
        player_one_public_key: &str,
        receipt: &EscrowReceipt,
        blockchain_type: &str,
        amount: Amount,
        game_type: GameType,
        network: Network,
    ) -> Self {
        Self {
            game_website_host: identity.game_website_host().to_string(),
            game_id: identity.game_id().to_string(),
            player_one_id: player_one_id.to_string(),
            player_one_public_key: player_one_public_key.to_string(),
            blockchain_type: blockchain_type.to_string(),
            amount_bet: amount.to_string(),
            signature_transaction_one: receipt.as_str().to_string(),
            game_type,
            network,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptWagerRequest {
    pub game_website_host: String,
    pub game_id: String,
    pub player_two_id: String,
    pub player_two_public_key: String,
    pub signature_transaction_two: String,
    pub blockchain_type: String,
    pub amount_bet: String,
}

impl AcceptWagerRequest {
    pub fn new(
        identity: &WagerIdentity,
        player_two_id: &str,
        player_two_public_key: &str,
        receipt: &EscrowReceipt,
        blockchain_type: &str,
        amount: Amount,
    ) -> Self {
        Self {
            game_website_host: identity.game_website_host().to_string(),
            game_id: identity.game_id().to_string(),
            player_two_id: player_two_id.to_string(),
            player_two_public_key: player_two_public_key.to_string(),
            signature_transaction_two: receipt.as_str().to_string(),
            blockchain_type: blockchain_type.to_string(),
            amount_bet: amount.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishWagerRequest {
    pub game_website_host: String,
    pub game_id: String,
    pub winner: String,
    pub winner_pub_key: String,
    pub is_equality: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_game_master_winner_solo_game: Option<bool>,
}

/// The backend holding authoritative wager status.
#[async_trait]
pub trait WagerGateway: Send + Sync {
    async fn query_status(&self, identity: &WagerIdentity) -> Result<WagerStatus, GatewayError>;

    async fn create_wager(&self, request: &CreateWagerRequest) -> Result<Ack, GatewayError>;

    async fn accept_wager(&self, request: &AcceptWagerRequest) -> Result<Ack, GatewayError>;

    async fn finish_wager(&self, request: &FinishWagerRequest) -> Result<Ack, GatewayError>;
}
