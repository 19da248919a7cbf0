use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure of an escrow transfer on the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("No connected signer is available")]
    NotConnected,

    #[error("Ledger network error: {0}")]
    Network(String),

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

impl TransferError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Failure reported by, or while talking to, the wager backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend rejected request{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP 409 is what the backend answers to a second creation of the same wager.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Rejected { status: Some(409), .. })
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Key error: {0}")]
    Key(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Signer not found: {name}")]
    SignerNotFound { name: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl CoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }
}

// conversion from dialoguer::Error
impl From<dialoguer::Error> for CoreError {
    fn from(err: dialoguer::Error) -> Self {
        CoreError::Dialog(err.to_string())
    }
}
