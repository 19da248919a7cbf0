mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wager_core::{CoreError, EscrowJournal, SignerManager, Storage};
use wager_protocol::WagerError;

#[derive(Parser)]
#[command(name = "wager")]
#[command(about = "Escrowed wagers for two players or a solo player against the house")]
#[command(version)]
struct Cli {
    /// Data directory for signers, journal and config
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Signer management commands
    #[command(subcommand)]
    Signer(commands::SignerCommands),

    /// Create or join a wager and wait for it to commit
    Play(commands::PlayArgs),

    /// Show the backend status of a wager
    Status {
        /// Host of the game website
        host: String,
        /// Game ID
        game_id: String,
    },

    /// Report the outcome of a finished game
    Finish(commands::FinishArgs),

    /// List escrow transfers made from this machine
    Journal {
        /// Only show transfers the backend never recorded
        #[arg(short, long)]
        unrecorded: bool,

        /// Mark a receipt as settled with the backend so the wager can be placed again
        #[arg(long, value_name = "RECEIPT", conflicts_with = "unrecorded")]
        reconcile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "wager={l},wager_core={l},wager_protocol={l}",
            l = log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wager")
    });
    tokio::fs::create_dir_all(&data_dir).await?;

    let cli_config = CliConfig::load_or_init(&data_dir).await?;
    let storage = Arc::new(Storage::new(&data_dir.join("wager.db")).await?);

    let result = match cli.command {
        Commands::Signer(cmd) => {
            let manager = SignerManager::new(storage);
            commands::handle_signer_command(cmd, &manager).await
        }
        Commands::Play(args) => commands::handle_play_command(args, &cli_config, storage).await,
        Commands::Status { host, game_id } => {
            commands::handle_status_command(&host, &game_id, &cli_config).await
        }
        Commands::Finish(args) => commands::handle_finish_command(args, &cli_config).await,
        Commands::Journal {
            unrecorded,
            reconcile,
        } => {
            let journal = EscrowJournal::new(storage);
            match reconcile {
                Some(receipt) => commands::handle_reconcile_command(&receipt, &journal).await,
                None => commands::handle_journal_command(unrecorded, &journal).await,
            }
        }
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

fn report_error(err: &anyhow::Error) {
    if let Some(wager_err) = err.downcast_ref::<WagerError>() {
        match wager_err {
            WagerError::FundsEscrowedRecordingFailed {
                receipt,
                role,
                source,
            } => {
                eprintln!("========================================");
                eprintln!("CRITICAL: funds escrowed but not recorded");
                eprintln!("========================================");
                eprintln!("Role: {}", role);
                eprintln!("Receipt: {}", receipt);
                eprintln!("Backend error: {}", source);
                eprintln!("Keep this receipt. 'wager journal --unrecorded' lists it again.");
            }
            WagerError::UnreconciledEscrow { receipt } => {
                eprintln!("Error: Escrow {} for this wager was never recorded", receipt);
                eprintln!("Settle it with the backend, then run 'wager journal --reconcile {}'", receipt);
            }
            WagerError::SignerUnavailable => {
                eprintln!("Error: No signer connected");
                eprintln!("Use 'wager signer list' to see available signers");
            }
            WagerError::WagerAlreadyResolved { status } => {
                eprintln!("Error: This wager cannot be joined (backend status: {})", status);
            }
            WagerError::CancelLocked { remaining_seconds } => {
                eprintln!("Error: Cancel unlocks in {}s", remaining_seconds);
            }
            WagerError::Transfer(e) => {
                eprintln!("Error: Escrow transfer failed, no funds were recorded: {}", e);
            }
            WagerError::Gateway(e) => {
                eprintln!("Error: Wager backend: {}", e);
            }
            _ => {
                eprintln!("Error: {}", wager_err);
            }
        }
        return;
    }

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::SignerNotFound { name }) => {
            eprintln!("Error: Signer '{}' not found", name);
            eprintln!("Use 'wager signer list' to see available signers");
        }
        Some(CoreError::Encryption(_)) => {
            eprintln!("Error: Could not unlock signer. Check the password");
        }
        _ => {
            eprintln!("Error: {:#}", err);
        }
    }
}
