use thiserror::Error;
use wager_core::{CoreError, EscrowReceipt, GatewayError, PlayerRole, TransferError, WagerStatus};

pub type Result<T> = std::result::Result<T, WagerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WagerError {
    #[error("No connected signer. Reconnect your wallet and try again")]
    SignerUnavailable,

    #[error("Escrow transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Backend error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Wager cannot be joined, backend reports it {status}")]
    WagerAlreadyResolved { status: WagerStatus },

    #[error("Funds escrowed as {role} (receipt {receipt}) but the backend did not record them: {source}")]
    FundsEscrowedRecordingFailed {
        receipt: EscrowReceipt,
        role: PlayerRole,
        source: GatewayError,
    },

    #[error("Escrow {receipt} for this wager was never recorded by the backend; reconcile it before wagering again")]
    UnreconciledEscrow { receipt: EscrowReceipt },

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Cancellation unlocks in {remaining_seconds}s")]
    CancelLocked { remaining_seconds: u64 },

    #[error("Invalid wager identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WagerError {
    /// Funds left the participant without a backend record.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::FundsEscrowedRecordingFailed { .. })
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

impl From<CoreError> for WagerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transfer(e) => Self::Transfer(e),
            CoreError::Gateway(e) => Self::Gateway(e),
            other => Self::Config(other.to_string()),
        }
    }
}
