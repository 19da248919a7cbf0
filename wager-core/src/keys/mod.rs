pub mod manager;

pub use manager::SignerManager;

use crate::error::{CoreError, Result, TransferError};
use crate::ledger::{wire, SignedTransfer, Signer, TransferMessage};
use async_trait::async_trait;
use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signer as _, SigningKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;

/// m/44'/501'/0'/0', every level hardened.
const DERIVATION_PATH: [u32; 4] = [44, 501, 0, 0];

pub fn generate_mnemonic() -> Result<String> {
    let mut rng = bip39::rand::thread_rng();
    let mnemonic = Mnemonic::generate_in_with(&mut rng, Language::English, 24)
        .map_err(|e| CoreError::internal(format!("Failed to generate mnemonic: {}", e)))?;
    Ok(mnemonic.to_string())
}

/// SLIP-0010 ed25519 private key for a hardened `path` below `seed`.
pub fn derive_ed25519(seed: &[u8], path: &[u32]) -> Result<[u8; 32]> {
    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| CoreError::key(format!("Failed to derive master key: {}", e)))?;
    mac.update(seed);
    let master = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&master[..32]);
    chain_code.copy_from_slice(&master[32..]);

    for index in path {
        let mut mac = HmacSha512::new_from_slice(&chain_code)
            .map_err(|e| CoreError::key(format!("Failed to derive child key: {}", e)))?;
        mac.update(&[0]);
        mac.update(&key);
        mac.update(&(index | HARDENED).to_be_bytes());
        let child = mac.finalize().into_bytes();

        key.copy_from_slice(&child[..32]);
        chain_code.copy_from_slice(&child[32..]);
    }

    Ok(key)
}

pub fn mnemonic_to_signing_key(mnemonic: &str) -> Result<SigningKey> {
    let mnemonic = Mnemonic::parse_in(Language::English, mnemonic)
        .map_err(|e| CoreError::key(format!("Invalid mnemonic: {}", e)))?;

    let seed = mnemonic.to_seed("");
    let secret = derive_ed25519(&seed, &DERIVATION_PATH)?;
    Ok(SigningKey::from_bytes(&secret))
}

/// Local signer backed by a mnemonic-derived ed25519 key, the same account a
/// browser wallet derives from that mnemonic.
pub struct MnemonicSigner {
    name: String,
    signing_key: SigningKey,
}

impl MnemonicSigner {
    pub fn from_mnemonic(name: impl Into<String>, mnemonic: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            signing_key: mnemonic_to_signing_key(mnemonic)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MnemonicSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicSigner")
            .field("name", &self.name)
            .field("public_key", &self.public_key())
            .finish()
    }
}

#[async_trait]
impl Signer for MnemonicSigner {
    fn public_key(&self) -> String {
        wire::encode_key(self.signing_key.verifying_key().as_bytes())
    }

    async fn sign(
        &self,
        message: &TransferMessage,
    ) -> std::result::Result<SignedTransfer, TransferError> {
        if message.from != self.public_key() {
            return Err(TransferError::rejected(format!(
                "Signer '{}' cannot sign for payer {}",
                self.name, message.from
            )));
        }

        let bytes = message.to_bytes()?;
        let signature = self.signing_key.sign(&bytes);

        Ok(SignedTransfer::new(signature.to_bytes(), bytes))
    }
}
