pub mod encryption;
pub mod journal;
pub mod signer_store;

pub use journal::{EscrowJournal, JournalEntry};
pub use signer_store::{SignerData, SignerStore};

use crate::error::{CoreError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    /// Storage that lives only as long as the process.
    pub async fn in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Signers table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS signers (
                name TEXT PRIMARY KEY,
                public_key TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                encrypted_seed TEXT NOT NULL
            )",
            [],
        )?;

        // Escrow receipts, recorded or not
        conn.execute(
            "CREATE TABLE IF NOT EXISTS escrow_journal (
                id TEXT PRIMARY KEY,
                game_website_host TEXT NOT NULL,
                game_id TEXT NOT NULL,
                role TEXT NOT NULL,
                amount INTEGER NOT NULL,
                receipt TEXT UNIQUE NOT NULL,
                recorded INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                recorded_at INTEGER
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
