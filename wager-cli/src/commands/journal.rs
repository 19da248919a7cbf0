use comfy_table::{presets::UTF8_FULL, Table};
use wager_core::{EscrowJournal, EscrowReceipt};

pub async fn handle_journal_command(unrecorded: bool, journal: &EscrowJournal) -> anyhow::Result<()> {
    let entries = if unrecorded {
        journal.unrecorded().await?
    } else {
        journal.entries().await?
    };

    if entries.is_empty() {
        println!("No escrow transfers found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Wager", "Role", "Amount", "Receipt", "Recorded", "Escrowed at"]);

    for entry in &entries {
        table.add_row(vec![
            format!("{}/{}", entry.game_website_host, entry.game_id),
            entry.role.to_string(),
            entry.amount.to_string(),
            entry.receipt.to_string(),
            if entry.recorded { "yes" } else { "NO" }.to_string(),
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", table);

    let missing = entries.iter().filter(|e| !e.recorded).count();
    if missing > 0 {
        println!();
        println!(
            "{} transfer(s) escrowed without a backend record. Keep these receipts to reclaim funds.",
            missing
        );
    }

    Ok(())
}

pub async fn handle_reconcile_command(receipt: &str, journal: &EscrowJournal) -> anyhow::Result<()> {
    let receipt = EscrowReceipt::new(receipt);
    if !journal.mark_recorded(&receipt).await? {
        anyhow::bail!("No journal entry with receipt {}", receipt);
    }

    tracing::info!("Escrow receipt {} marked as reconciled", receipt);
    println!("Receipt {} marked as recorded.", receipt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wager_core::{Amount, PlayerRole, Storage, WagerIdentity};

    #[tokio::test]
    async fn test_reconcile_marks_only_known_receipts() {
        let storage = Arc::new(Storage::in_memory().await.unwrap());
        let journal = EscrowJournal::new(storage);
        let identity = WagerIdentity::new("chess.example", "g1").unwrap();
        journal
            .record_transfer(
                &identity,
                PlayerRole::PlayerOne,
                Amount::from_lamports(10),
                &EscrowReceipt::new("sigA"),
            )
            .await
            .unwrap();

        assert!(handle_reconcile_command("missing", &journal).await.is_err());
        assert_eq!(journal.unrecorded_for(&identity).await.unwrap().len(), 1);

        handle_reconcile_command("sigA", &journal).await.unwrap();
        assert!(journal.unrecorded_for(&identity).await.unwrap().is_empty());
    }
}
