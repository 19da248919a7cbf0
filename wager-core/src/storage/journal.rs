use crate::error::Result;
use crate::storage::Storage;
use crate::types::{Amount, EscrowReceipt, PlayerRole, WagerIdentity};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One escrow transfer that left the participant's account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub game_website_host: String,
    pub game_id: String,
    pub role: PlayerRole,
    pub amount: Amount,
    pub receipt: EscrowReceipt,
    pub recorded: bool,
    pub created_at: DateTime<Utc>,
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Local record of escrow receipts and whether the backend acknowledged them.
///
/// Entries still unrecorded are the evidence needed to reconcile funds that
/// were escrowed without a backend record.
pub struct EscrowJournal {
    storage: Arc<Storage>,
}

impl EscrowJournal {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn record_transfer(
        &self,
        identity: &WagerIdentity,
        role: PlayerRole,
        amount: Amount,
        receipt: &EscrowReceipt,
    ) -> Result<JournalEntry> {
        let entry = JournalEntry {
            id: Uuid::new_v4().to_string(),
            game_website_host: identity.game_website_host().to_string(),
            game_id: identity.game_id().to_string(),
            role,
            amount,
            receipt: receipt.clone(),
            recorded: false,
            created_at: Utc::now(),
            recorded_at: None,
        };

        let conn = self.storage.get_connection().await;
        conn.execute(
            "INSERT INTO escrow_journal (id, game_website_host, game_id, role, amount, receipt, recorded, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                entry.id,
                entry.game_website_host,
                entry.game_id,
                entry.role.as_str(),
                entry.amount.to_lamports() as i64,
                entry.receipt.as_str(),
                entry.created_at.timestamp(),
            ],
        )?;

        tracing::debug!("Journaled escrow receipt {} for {}", receipt, identity);
        Ok(entry)
    }

    pub async fn mark_recorded(&self, receipt: &EscrowReceipt) -> Result<bool> {
        let conn = self.storage.get_connection().await;
        let updated = conn.execute(
            "UPDATE escrow_journal SET recorded = 1, recorded_at = ?1 WHERE receipt = ?2",
            params![Utc::now().timestamp(), receipt.as_str()],
        )?;
        Ok(updated > 0)
    }

    pub async fn entries(&self) -> Result<Vec<JournalEntry>> {
        self.query("SELECT * FROM escrow_journal ORDER BY created_at DESC", [])
            .await
    }

    /// Receipts the backend never acknowledged.
    pub async fn unrecorded(&self) -> Result<Vec<JournalEntry>> {
        self.query(
            "SELECT * FROM escrow_journal WHERE recorded = 0 ORDER BY created_at DESC",
            [],
        )
        .await
    }

    /// Unacknowledged receipts for one wager.
    pub async fn unrecorded_for(&self, identity: &WagerIdentity) -> Result<Vec<JournalEntry>> {
        self.query(
            "SELECT * FROM escrow_journal
             WHERE recorded = 0 AND game_website_host = ?1 AND game_id = ?2
             ORDER BY created_at DESC",
            params![identity.game_website_host(), identity.game_id()],
        )
        .await
    }

    async fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<JournalEntry>> {
        let conn = self.storage.get_connection().await;
        let mut stmt = conn.prepare(sql)?;

        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>("id")?,
                row.get::<_, String>("game_website_host")?,
                row.get::<_, String>("game_id")?,
                row.get::<_, String>("role")?,
                row.get::<_, i64>("amount")?,
                row.get::<_, String>("receipt")?,
                row.get::<_, bool>("recorded")?,
                row.get::<_, i64>("created_at")?,
                row.get::<_, Option<i64>>("recorded_at")?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, host, game_id, role, amount, receipt, recorded, created_at, recorded_at) =
                row?;
            entries.push(JournalEntry {
                id,
                game_website_host: host,
                game_id,
                role: role.parse()?,
                amount: Amount::from_lamports(amount as u64),
                receipt: EscrowReceipt::new(receipt),
                recorded,
                created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
                recorded_at: recorded_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            });
        }

        Ok(entries)
    }
}
