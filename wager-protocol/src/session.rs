use crate::error::{Result, WagerError};
use crate::settlement::{SettlementOutcome, SettlementReporter};
use crate::timer::{CancellationTimer, CancellationWindow};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wager_core::{
    AcceptWagerRequest, Ack, CreateWagerRequest, EscrowJournal, EscrowReceipt, GameType, Ledger,
    PlayerRole, Signer, WagerConfig, WagerGateway, WagerIdentity, WagerStatus,
};

/// Invoked once when the wager commits and the game may start.
pub type GameStartCallback = Box<dyn FnOnce(&WagerIdentity) + Send>;

/// Local view of the wager lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    CheckingStatus,
    CreatingWager,
    JoiningWager,
    WaitingForOpponent,
    Committed,
    Error(WagerError),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::CheckingStatus => f.write_str("checking status"),
            Self::CreatingWager => f.write_str("creating wager"),
            Self::JoiningWager => f.write_str("joining wager"),
            Self::WaitingForOpponent => f.write_str("waiting for opponent"),
            Self::Committed => f.write_str("committed"),
            Self::Error(err) => write!(f, "error ({})", err),
        }
    }
}

/// Result of a successful [`WagerSession::place_wager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WagerOutcome {
    /// First party escrowed and recorded; the cancellation window is running.
    WaitingForOpponent { receipt: EscrowReceipt },
    /// The wager is live and the game-start callback has fired.
    Committed {
        receipt: EscrowReceipt,
        role: PlayerRole,
    },
}

/// Why [`WagerSession::wait_for_opponent`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    OpponentJoined,
    CancellationUnlocked,
}

/// Session context for one participant and one wager identity.
///
/// Every action takes `&mut self`, so at most one ledger transfer or
/// gateway call is outstanding per session.
pub struct WagerSession {
    identity: WagerIdentity,
    config: WagerConfig,
    ledger: Arc<dyn Ledger>,
    gateway: Arc<dyn WagerGateway>,
    signer: Option<Arc<dyn Signer>>,
    journal: Option<Arc<EscrowJournal>>,
    timer: CancellationTimer,
    state: SessionState,
    escrowed: Option<(PlayerRole, EscrowReceipt)>,
    on_game_start: Option<GameStartCallback>,
}

impl WagerSession {
    pub fn new(
        config: WagerConfig,
        ledger: Arc<dyn Ledger>,
        gateway: Arc<dyn WagerGateway>,
    ) -> Result<Self> {
        config.validate()?;
        let identity = config.identity()?;

        Ok(Self {
            identity,
            config,
            ledger,
            gateway,
            signer: None,
            journal: None,
            timer: CancellationTimer::new(),
            state: SessionState::Idle,
            escrowed: None,
            on_game_start: None,
        })
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_journal(mut self, journal: Arc<EscrowJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn on_game_start<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&WagerIdentity) + Send + 'static,
    {
        self.on_game_start = Some(Box::new(callback));
        self
    }

    pub fn connect_signer(&mut self, signer: Arc<dyn Signer>) {
        tracing::info!("Signer {} connected", signer.public_key());
        self.signer = Some(signer);
    }

    pub fn disconnect_signer(&mut self) {
        self.signer = None;
    }

    pub fn identity(&self) -> &WagerIdentity {
        &self.identity
    }

    pub fn config(&self) -> &WagerConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Role and receipt of this session's successful escrow, if any.
    pub fn escrowed(&self) -> Option<&(PlayerRole, EscrowReceipt)> {
        self.escrowed.as_ref()
    }

    pub fn cancellation_window(&self) -> CancellationWindow {
        self.timer.window()
    }

    pub fn subscribe_countdown(&self) -> watch::Receiver<CancellationWindow> {
        self.timer.subscribe()
    }

    pub fn can_cancel(&self) -> bool {
        self.state == SessionState::WaitingForOpponent && self.timer.window().is_expired()
    }

    /// Create or join the wager, depending on what the backend reports.
    ///
    /// Allowed from `Idle` and from a non-critical `Error`. Failures move the
    /// session to `Error` and are returned; nothing is retried. A session whose
    /// escrow went unrecorded refuses to escrow again.
    pub async fn place_wager(&mut self) -> Result<WagerOutcome> {
        match &self.state {
            SessionState::Error(WagerError::FundsEscrowedRecordingFailed { receipt, .. }) => {
                return Err(WagerError::UnreconciledEscrow {
                    receipt: receipt.clone(),
                })
            }
            SessionState::Idle | SessionState::Error(_) => {}
            other => {
                return Err(WagerError::invalid_state(format!(
                    "cannot place a wager while {}",
                    other
                )))
            }
        }

        let result = self.run_placement().await;
        if let Err(err) = &result {
            if err.is_critical() {
                tracing::error!("{}: {}", self.identity, err);
            } else {
                tracing::warn!("{}: wager placement failed: {}", self.identity, err);
            }
            self.transition(SessionState::Error(err.clone()));
        }
        result
    }

    async fn run_placement(&mut self) -> Result<WagerOutcome> {
        self.transition(SessionState::CheckingStatus);
        let status = self.gateway.query_status(&self.identity).await?;
        tracing::info!("{}: backend status is {}", self.identity, status);

        match (self.config.game_type, status) {
            (_, WagerStatus::NotFound) => self.create_wager().await,
            (GameType::Multiplayer, WagerStatus::AwaitingSecondParty) => {
                if let Some((PlayerRole::PlayerOne, receipt)) = self.escrowed.clone() {
                    // Our own wager is still open; resume waiting without a second transfer.
                    tracing::info!(
                        "{}: already escrowed as player one ({}), resuming wait",
                        self.identity,
                        receipt
                    );
                    self.enter_waiting();
                    return Ok(WagerOutcome::WaitingForOpponent { receipt });
                }
                self.join_wager().await
            }
            (_, status) => Err(WagerError::WagerAlreadyResolved { status }),
        }
    }

    async fn create_wager(&mut self) -> Result<WagerOutcome> {
        self.transition(SessionState::CreatingWager);
        let signer = self.require_signer()?;
        self.ensure_reconciled().await?;

        let receipt = self
            .ledger
            .escrow_transfer(
                Some(signer.as_ref()),
                &self.config.escrow_account,
                self.config.amount_bet,
            )
            .await?;
        tracing::info!("{}: player one escrowed, receipt {}", self.identity, receipt);
        self.journal_transfer(PlayerRole::PlayerOne, &receipt).await;

        let request = CreateWagerRequest::new(
            &self.identity,
            &self.config.player_id,
            &signer.public_key(),
            &receipt,
            &self.config.blockchain_type,
            self.config.amount_bet,
            self.config.game_type,
            self.config.network,
        );

        if let Err(source) = self.gateway.create_wager(&request).await {
            return Err(WagerError::FundsEscrowedRecordingFailed {
                receipt,
                role: PlayerRole::PlayerOne,
                source,
            });
        }

        self.journal_recorded(&receipt).await;
        self.escrowed = Some((PlayerRole::PlayerOne, receipt.clone()));

        match self.config.game_type {
            GameType::Solo => {
                self.commit();
                Ok(WagerOutcome::Committed {
                    receipt,
                    role: PlayerRole::PlayerOne,
                })
            }
            GameType::Multiplayer => {
                self.enter_waiting();
                Ok(WagerOutcome::WaitingForOpponent { receipt })
            }
        }
    }

    async fn join_wager(&mut self) -> Result<WagerOutcome> {
        self.transition(SessionState::JoiningWager);
        let signer = self.require_signer()?;
        self.ensure_reconciled().await?;

        let receipt = self
            .ledger
            .escrow_transfer(
                Some(signer.as_ref()),
                &self.config.escrow_account,
                self.config.amount_bet,
            )
            .await?;
        tracing::info!("{}: player two escrowed, receipt {}", self.identity, receipt);
        self.journal_transfer(PlayerRole::PlayerTwo, &receipt).await;

        let request = AcceptWagerRequest::new(
            &self.identity,
            &self.config.player_id,
            &signer.public_key(),
            &receipt,
            &self.config.blockchain_type,
            self.config.amount_bet,
        );

        if let Err(source) = self.gateway.accept_wager(&request).await {
            return Err(WagerError::FundsEscrowedRecordingFailed {
                receipt,
                role: PlayerRole::PlayerTwo,
                source,
            });
        }

        self.journal_recorded(&receipt).await;
        self.escrowed = Some((PlayerRole::PlayerTwo, receipt.clone()));
        self.commit();

        Ok(WagerOutcome::Committed {
            receipt,
            role: PlayerRole::PlayerTwo,
        })
    }

    /// Poll the backend once. While waiting for an opponent, an `Accepted`
    /// status commits the wager.
    pub async fn refresh_status(&mut self) -> Result<WagerStatus> {
        let status = self.gateway.query_status(&self.identity).await?;

        if self.state == SessionState::WaitingForOpponent {
            match status {
                WagerStatus::Accepted => {
                    tracing::info!("{}: opponent joined", self.identity);
                    self.commit();
                }
                WagerStatus::Finished | WagerStatus::NotFound => {
                    tracing::warn!(
                        "{}: backend reports {} while waiting for opponent",
                        self.identity,
                        status
                    );
                    self.timer.disarm();
                    self.transition(SessionState::Error(if status == WagerStatus::Finished {
                        WagerError::WagerAlreadyResolved { status }
                    } else {
                        WagerError::invalid_state("backend lost the wager record")
                    }));
                }
                WagerStatus::AwaitingSecondParty => {}
            }
        }

        Ok(status)
    }

    /// Poll every `poll_interval` until the opponent joins or the
    /// cancellation window elapses. Failed polls are logged and polling goes on.
    pub async fn wait_for_opponent(&mut self, poll_interval: Duration) -> Result<WaitOutcome> {
        if self.state != SessionState::WaitingForOpponent {
            return Err(WagerError::invalid_state(format!(
                "cannot wait for an opponent while {}",
                self.state
            )));
        }

        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;

            if let Err(err) = self.refresh_status().await {
                tracing::warn!("{}: status poll failed: {}", self.identity, err);
            }

            match &self.state {
                SessionState::Committed => return Ok(WaitOutcome::OpponentJoined),
                SessionState::Error(err) => return Err(err.clone()),
                _ => {}
            }

            if self.timer.window().is_expired() {
                return Ok(WaitOutcome::CancellationUnlocked);
            }
        }
    }

    /// Stop waiting locally once the cancellation window has elapsed.
    ///
    /// Escrowed funds stay with the escrow account; the backend is not told.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state != SessionState::WaitingForOpponent {
            return Err(WagerError::invalid_state(format!(
                "nothing to cancel while {}",
                self.state
            )));
        }

        let window = self.timer.window();
        if !window.is_expired() {
            return Err(WagerError::CancelLocked {
                remaining_seconds: window.remaining_seconds(),
            });
        }

        self.timer.disarm();
        self.transition(SessionState::Idle);
        if let Some((_, receipt)) = &self.escrowed {
            tracing::warn!(
                "{}: cancelled locally, escrow {} was not reclaimed",
                self.identity,
                receipt
            );
        }
        Ok(())
    }

    /// Report the final outcome of a committed wager.
    pub async fn settle(&self, outcome: &SettlementOutcome) -> Result<Ack> {
        if self.state != SessionState::Committed {
            return Err(WagerError::invalid_state(format!(
                "cannot settle while {}",
                self.state
            )));
        }

        SettlementReporter::new(self.gateway.clone())
            .report_outcome(&self.identity, outcome)
            .await
    }

    fn require_signer(&self) -> Result<Arc<dyn Signer>> {
        self.signer.clone().ok_or(WagerError::SignerUnavailable)
    }

    /// Refuse to escrow while the journal holds an unrecorded receipt for this wager.
    async fn ensure_reconciled(&self) -> Result<()> {
        if let Some(journal) = &self.journal {
            let pending = journal.unrecorded_for(&self.identity).await?;
            if let Some(entry) = pending.into_iter().next() {
                return Err(WagerError::UnreconciledEscrow {
                    receipt: entry.receipt,
                });
            }
        }
        Ok(())
    }

    fn enter_waiting(&mut self) {
        self.transition(SessionState::WaitingForOpponent);
        self.timer.arm(self.config.cancellation_seconds);
    }

    fn commit(&mut self) {
        self.timer.disarm();
        self.transition(SessionState::Committed);

        if let Some(callback) = self.on_game_start.take() {
            tracing::info!("{}: starting game", self.identity);
            callback(&self.identity);
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("{}: {} -> {}", self.identity, self.state, next);
        self.state = next;
    }

    async fn journal_transfer(&self, role: PlayerRole, receipt: &EscrowReceipt) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal
                .record_transfer(&self.identity, role, self.config.amount_bet, receipt)
                .await
            {
                tracing::warn!("Failed to journal escrow receipt {}: {}", receipt, e);
            }
        }
    }

    async fn journal_recorded(&self, receipt: &EscrowReceipt) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.mark_recorded(receipt).await {
                tracing::warn!("Failed to mark escrow receipt {} recorded: {}", receipt, e);
            }
        }
    }
}

impl fmt::Debug for WagerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WagerSession")
            .field("identity", &self.identity)
            .field("state", &self.state)
            .field("has_signer", &self.signer.is_some())
            .field("escrowed", &self.escrowed)
            .field("timer", &self.timer)
            .finish()
    }
}
