use crate::error::{CoreError, Result};
use crate::keys::{generate_mnemonic, MnemonicSigner};
use crate::ledger::Signer;
use crate::storage::encryption::{open, seal};
use crate::storage::{SignerData, SignerStore, Storage};
use chrono::Utc;
use std::sync::Arc;

/// Creates, imports and unlocks password-protected local signers.
pub struct SignerManager {
    storage: Arc<Storage>,
}

impl SignerManager {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Create a signer from a fresh mnemonic. Returns the signer and the mnemonic.
    pub async fn create_signer(&self, name: &str, password: &str) -> Result<(MnemonicSigner, String)> {
        let mnemonic = generate_mnemonic()?;
        let signer = self.import_signer(name, &mnemonic, password).await?;
        Ok((signer, mnemonic))
    }

    pub async fn import_signer(
        &self,
        name: &str,
        mnemonic: &str,
        password: &str,
    ) -> Result<MnemonicSigner> {
        let store = SignerStore::new(&self.storage);
        if store.signer_exists(name).await? {
            return Err(CoreError::config(format!(
                "Signer '{}' already exists",
                name
            )));
        }

        if password.is_empty() {
            return Err(CoreError::config("Password cannot be empty"));
        }

        let signer = MnemonicSigner::from_mnemonic(name, mnemonic)?;
        let data = SignerData {
            name: name.to_string(),
            public_key: signer.public_key(),
            created_at: Utc::now(),
            sealed_seed: seal(mnemonic.as_bytes(), password)?,
        };

        store.save_signer(&data).await?;

        tracing::info!("Stored signer '{}' ({})", name, data.public_key);
        Ok(signer)
    }

    pub async fn load_signer(&self, name: &str, password: &str) -> Result<MnemonicSigner> {
        let store = SignerStore::new(&self.storage);
        let data = store
            .load_signer(name)
            .await?
            .ok_or_else(|| CoreError::SignerNotFound {
                name: name.to_string(),
            })?;

        let mnemonic = open(&data.sealed_seed, password)?;
        let mnemonic = String::from_utf8(mnemonic)
            .map_err(|e| CoreError::key(format!("Stored mnemonic is not UTF-8: {}", e)))?;

        let signer = MnemonicSigner::from_mnemonic(name, &mnemonic)?;
        if signer.public_key() != data.public_key {
            return Err(CoreError::key(format!(
                "Signer '{}' does not match its stored public key",
                name
            )));
        }

        Ok(signer)
    }

    pub async fn list_signers(&self) -> Result<Vec<(String, String)>> {
        let store = SignerStore::new(&self.storage);
        Ok(store
            .list_signers()
            .await?
            .into_iter()
            .map(|(name, public_key, _)| (name, public_key))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_and_unlock_signer() {
        let temp_dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&temp_dir.path().join("wager.db")).await.unwrap());
        let manager = SignerManager::new(storage);

        let (signer, _mnemonic) = manager.create_signer("alice", "pw").await.unwrap();
        assert_eq!(signer.name(), "alice");

        let loaded = manager.load_signer("alice", "pw").await.unwrap();
        assert_eq!(loaded.public_key(), signer.public_key());

        assert!(manager.load_signer("alice", "wrong").await.is_err());
        assert!(matches!(
            manager.load_signer("bob", "pw").await,
            Err(CoreError::SignerNotFound { .. })
        ));
        assert!(manager.create_signer("alice", "pw").await.is_err());

        let listed = manager.list_signers().await.unwrap();
        assert_eq!(listed, vec![("alice".to_string(), signer.public_key())]);
    }
}
