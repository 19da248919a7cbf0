pub mod rpc;
pub mod wire;

pub use rpc::RpcLedger;

use crate::error::TransferError;
use crate::types::{Amount, EscrowReceipt};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Unsigned value transfer from a payer to the escrow account.
///
/// Addresses and the blockhash are base58 strings as the ledger reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub from: String,
    pub to: String,
    pub lamports: u64,
    pub recent_blockhash: String,
}

impl TransferMessage {
    /// Serialized system-program transfer message a signer commits to.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransferError> {
        let from = wire::decode_key(&self.from, "payer")?;
        let to = wire::decode_key(&self.to, "escrow account")?;
        let blockhash = wire::decode_key(&self.recent_blockhash, "blockhash")?;

        if from == to {
            return Err(TransferError::rejected(
                "Payer and escrow account must differ",
            ));
        }

        Ok(wire::transfer_message(&from, &to, self.lamports, &blockhash))
    }
}

/// A transfer message together with the payer's ed25519 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    signature: [u8; 64],
    message: Vec<u8>,
}

impl SignedTransfer {
    pub fn new(signature: [u8; 64], message: Vec<u8>) -> Self {
        Self { signature, message }
    }

    /// Base58 signature, which is also the transaction id on the ledger.
    pub fn signature(&self) -> String {
        wire::encode_key(&self.signature)
    }

    pub fn message_bytes(&self) -> &[u8] {
        &self.message
    }

    pub fn to_wire(&self) -> Vec<u8> {
        wire::signed_transaction(&self.signature, &self.message)
    }

    /// Base64 wire transaction as `sendTransaction` expects it.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_wire())
    }
}

/// Minimal capability of a connected account.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Base58 account address.
    fn public_key(&self) -> String;

    /// Sign a transfer. A signer that declines returns [`TransferError::Rejected`].
    async fn sign(&self, message: &TransferMessage) -> Result<SignedTransfer, TransferError>;
}

/// Executes escrow transfers. No retries happen at this layer.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn escrow_transfer(
        &self,
        signer: Option<&dyn Signer>,
        escrow_account: &str,
        amount: Amount,
    ) -> Result<EscrowReceipt, TransferError>;
}
