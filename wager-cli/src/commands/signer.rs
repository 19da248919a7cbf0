use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Password;
use wager_core::{CoreError, Signer, SignerManager};

#[derive(Subcommand)]
pub enum SignerCommands {
    /// Create a signer from a fresh mnemonic
    Create {
        /// Signer name
        name: String,
    },
    /// Import a signer from a mnemonic
    Import {
        /// Signer name
        name: String,
        /// Mnemonic phrase (will prompt if not provided)
        #[arg(short, long)]
        mnemonic: Option<String>,
    },
    /// List stored signers
    List,
}

pub async fn handle_signer_command(
    cmd: SignerCommands,
    manager: &SignerManager,
) -> anyhow::Result<()> {
    match cmd {
        SignerCommands::Create { name } => {
            let password = new_password()?;

            println!("Creating signer '{}'...", name);
            let (signer, mnemonic) = manager.create_signer(&name, &password).await?;

            println!("Signer created successfully!");
            println!();
            println!("IMPORTANT: Save your mnemonic phrase securely!");
            println!("Mnemonic: {}", mnemonic);
            println!();
            println!("  Name: {}", signer.name());
            println!("  Public key: {}", signer.public_key());
        }

        SignerCommands::Import { name, mnemonic } => {
            let mnemonic = match mnemonic {
                Some(m) => m,
                None => Password::new()
                    .with_prompt("Enter mnemonic phrase")
                    .interact()
                    .map_err(|e| CoreError::dialog(e.to_string()))?,
            };
            let password = new_password()?;

            let signer = manager.import_signer(&name, mnemonic.trim(), &password).await?;
            println!("Signer imported successfully!");
            println!("  Name: {}", signer.name());
            println!("  Public key: {}", signer.public_key());
        }

        SignerCommands::List => {
            let signers = manager.list_signers().await?;

            if signers.is_empty() {
                println!("No signers found.");
                println!("Create one with: wager signer create <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Public key"]);
            for (name, public_key) in signers {
                table.add_row(vec![name, public_key]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}

fn new_password() -> anyhow::Result<String> {
    let password = Password::new()
        .with_prompt("Signer password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()
        .map_err(|e| CoreError::dialog(e.to_string()))?;
    Ok(password)
}

pub fn unlock_password(name: &str) -> anyhow::Result<String> {
    let password = Password::new()
        .with_prompt(format!("Password for signer '{}'", name))
        .interact()
        .map_err(|e| CoreError::dialog(e.to_string()))?;
    Ok(password)
}
