//! Wager core - collaborators of the wager lifecycle protocol
//!
//! This library provides the data model shared by both wager participants,
//! the ledger client that escrows funds, the HTTP gateway to the wager
//! backend, and local storage for signers and escrow receipts.

pub mod config;
pub mod error;
pub mod gateway;
pub mod keys;
pub mod ledger;
pub mod storage;
pub mod types;

pub use config::{WagerConfig, DEFAULT_ESCROW_ACCOUNT};
pub use error::{CoreError, GatewayError, Result, TransferError};
pub use gateway::{
    AcceptWagerRequest, CreateWagerRequest, FinishWagerRequest, HttpGateway, WagerGateway,
};
pub use keys::{MnemonicSigner, SignerManager};
pub use ledger::{Ledger, RpcLedger, SignedTransfer, Signer, TransferMessage};
pub use storage::{EscrowJournal, JournalEntry, Storage};
pub use types::{
    Ack, Amount, EscrowReceipt, GameType, Network, PlayerRole, WagerIdentity, WagerStatus,
};
