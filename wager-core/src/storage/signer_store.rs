use crate::error::Result;
use crate::storage::encryption::SealedSecret;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerData {
    pub name: String,
    pub public_key: String,
    pub created_at: DateTime<Utc>,
    pub sealed_seed: SealedSecret,
}

pub struct SignerStore<'a> {
    storage: &'a Storage,
}

impl<'a> SignerStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_signer(&self, signer: &SignerData) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT INTO signers (name, public_key, created_at, encrypted_seed)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                signer.name,
                signer.public_key,
                signer.created_at.timestamp(),
                serde_json::to_string(&signer.sealed_seed)?,
            ],
        )?;

        Ok(())
    }

    pub async fn load_signer(&self, name: &str) -> Result<Option<SignerData>> {
        let conn = self.storage.get_connection().await;

        let row = conn
            .query_row(
                "SELECT name, public_key, created_at, encrypted_seed FROM signers WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((name, public_key, created_at, sealed)) => Ok(Some(SignerData {
                name,
                public_key,
                created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
                sealed_seed: serde_json::from_str(&sealed)?,
            })),
            None => Ok(None),
        }
    }

    /// Name, public key and creation time of every stored signer.
    pub async fn list_signers(&self) -> Result<Vec<(String, String, DateTime<Utc>)>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT name, public_key, created_at FROM signers ORDER BY created_at DESC, name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                DateTime::from_timestamp(row.get::<_, i64>(2)?, 0).unwrap_or_else(Utc::now),
            ))
        })?;

        let mut signers = Vec::new();
        for signer in rows {
            signers.push(signer?);
        }

        Ok(signers)
    }

    pub async fn signer_exists(&self, name: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM signers WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}
