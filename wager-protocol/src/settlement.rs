use crate::error::{Result, WagerError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wager_core::{Ack, FinishWagerRequest, WagerGateway, WagerIdentity};

/// Terminal result of a game, shaped for the finish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub winner_id: String,
    pub winner_public_key: String,
    pub is_equality: bool,
    pub house_won_solo_game: Option<bool>,
}

impl SettlementOutcome {
    /// A multiplayer game with a single winner.
    pub fn winner(winner_id: impl Into<String>, winner_public_key: impl Into<String>) -> Self {
        Self {
            winner_id: winner_id.into(),
            winner_public_key: winner_public_key.into(),
            is_equality: false,
            house_won_solo_game: None,
        }
    }

    /// A multiplayer game that ended level.
    pub fn tie() -> Self {
        Self {
            winner_id: String::new(),
            winner_public_key: String::new(),
            is_equality: true,
            house_won_solo_game: None,
        }
    }

    /// A solo game against the house.
    pub fn solo(
        player_id: impl Into<String>,
        player_public_key: impl Into<String>,
        house_won: bool,
    ) -> Self {
        Self {
            winner_id: player_id.into(),
            winner_public_key: player_public_key.into(),
            is_equality: false,
            house_won_solo_game: Some(house_won),
        }
    }

    pub fn to_request(&self, identity: &WagerIdentity) -> FinishWagerRequest {
        FinishWagerRequest {
            game_website_host: identity.game_website_host().to_string(),
            game_id: identity.game_id().to_string(),
            winner: self.winner_id.clone(),
            winner_pub_key: self.winner_public_key.clone(),
            is_equality: self.is_equality,
            is_game_master_winner_solo_game: self.house_won_solo_game,
        }
    }
}

/// Submits the terminal outcome of a wager. Repeated reports are passed
/// through; the backend decides what a second finish means.
pub struct SettlementReporter {
    gateway: Arc<dyn WagerGateway>,
}

impl SettlementReporter {
    pub fn new(gateway: Arc<dyn WagerGateway>) -> Self {
        Self { gateway }
    }

    pub async fn report_outcome(
        &self,
        identity: &WagerIdentity,
        outcome: &SettlementOutcome,
    ) -> Result<Ack> {
        identity
            .validate()
            .map_err(|e| WagerError::InvalidIdentity(e.to_string()))?;

        let request = outcome.to_request(identity);
        let ack = self.gateway.finish_wager(&request).await?;

        tracing::info!(
            "Reported outcome for {}: winner='{}' equality={} house_won={:?}",
            identity,
            request.winner,
            request.is_equality,
            request.is_game_master_winner_solo_game
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeGateway};
    use serde_json::json;
    use wager_core::GatewayError;

    #[tokio::test]
    async fn test_ack_is_returned_unchanged() {
        let ack = Ack(json!({ "signature": "payout", "extra": [1, 2, 3] }));
        let gateway = Arc::new(FakeGateway::new().with_finish(Ok(ack.clone())));
        let reporter = SettlementReporter::new(gateway.clone());
        let identity = WagerIdentity::new("h", "g1").unwrap();

        let result = reporter
            .report_outcome(&identity, &SettlementOutcome::winner("p1", "pubkey"))
            .await
            .unwrap();

        assert_eq!(result, ack);
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Finish(request) => {
                assert_eq!(request.winner, "p1");
                assert_eq!(request.winner_pub_key, "pubkey");
                assert!(!request.is_equality);
                assert_eq!(request.is_game_master_winner_solo_game, None);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tie_and_solo_payloads() {
        let identity = WagerIdentity::new("h", "g1").unwrap();

        let tie = SettlementOutcome::tie().to_request(&identity);
        assert!(tie.is_equality);
        assert!(tie.winner.is_empty());

        let solo = SettlementOutcome::solo("p1", "pk", true).to_request(&identity);
        assert_eq!(solo.is_game_master_winner_solo_game, Some(true));
        assert!(!solo.is_equality);
    }

    #[tokio::test]
    async fn test_gateway_error_is_surfaced() {
        let gateway = Arc::new(
            FakeGateway::new().with_finish(Err(GatewayError::rejected(Some(400), "unknown game"))),
        );
        let reporter = SettlementReporter::new(gateway);
        let identity = WagerIdentity::new("h", "g1").unwrap();

        let err = reporter
            .report_outcome(&identity, &SettlementOutcome::tie())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WagerError::Gateway(GatewayError::rejected(Some(400), "unknown game"))
        );
    }

    #[tokio::test]
    async fn test_repeated_reports_are_not_deduplicated() {
        let gateway = Arc::new(FakeGateway::new());
        let reporter = SettlementReporter::new(gateway.clone());
        let identity = WagerIdentity::new("h", "g1").unwrap();
        let outcome = SettlementOutcome::winner("p1", "pk");

        reporter.report_outcome(&identity, &outcome).await.unwrap();
        reporter.report_outcome(&identity, &outcome).await.unwrap();
        assert_eq!(gateway.calls().len(), 2);
    }
}
