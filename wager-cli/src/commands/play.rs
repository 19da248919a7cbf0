use crate::commands::signer::unlock_password;
use crate::config::CliConfig;
use clap::Args;
use dialoguer::Confirm;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wager_core::{
    Amount, CoreError, EscrowJournal, GameType, HttpGateway, Network, RpcLedger, SignerManager,
    Storage,
};
use wager_protocol::{SessionState, WagerOutcome, WagerSession, WaitOutcome};

#[derive(Args)]
pub struct PlayArgs {
    /// Host of the game website
    pub host: String,
    /// Game ID shared by both players
    pub game_id: String,
    /// Your player ID
    #[arg(short, long)]
    pub player: String,
    /// Signer used for the escrow transfer
    #[arg(short, long)]
    pub signer: String,
    /// Play alone against the house
    #[arg(long)]
    pub solo: bool,
    /// Stake in ledger units
    #[arg(short, long, default_value_t = 0.1)]
    pub amount: f64,
    /// Ledger network (devnet, mainnet)
    #[arg(short, long)]
    pub network: Option<Network>,
    /// Seconds before an unanswered wager can be cancelled locally
    #[arg(long)]
    pub cancel_after: Option<u64>,
}

pub async fn handle_play_command(
    args: PlayArgs,
    cli_config: &CliConfig,
    storage: Arc<Storage>,
) -> anyhow::Result<()> {
    let mut config = cli_config
        .wager_config(args.network)
        .with_game(&args.host, &args.game_id, &args.player);
    config.amount_bet = Amount::from_units(args.amount)?;
    config.game_type = if args.solo {
        GameType::Solo
    } else {
        GameType::Multiplayer
    };
    if let Some(seconds) = args.cancel_after {
        config.cancellation_seconds = seconds;
    }

    let password = unlock_password(&args.signer)?;
    let signer = SignerManager::new(storage.clone())
        .load_signer(&args.signer, &password)
        .await?;

    let ledger = Arc::new(RpcLedger::new(&config)?);
    let gateway = Arc::new(HttpGateway::new(&config)?);
    let journal = Arc::new(EscrowJournal::new(storage));

    println!(
        "Placing {} wager of {} on {} as '{}'...",
        config.game_type, config.amount_bet, config.network, config.player_id
    );

    let mut session = WagerSession::new(config, ledger, gateway)?
        .with_signer(Arc::new(signer))
        .with_journal(journal)
        .on_game_start(|identity| {
            println!();
            println!("Wager committed. Game {} can start!", identity);
        });

    match session.place_wager().await? {
        WagerOutcome::Committed { receipt, role } => {
            println!("Escrowed as {} (receipt {})", role, receipt);
            return Ok(());
        }
        WagerOutcome::WaitingForOpponent { receipt } => {
            println!("Escrowed as player one (receipt {})", receipt);
            println!("Waiting for an opponent to join...");
        }
    }

    let poll_interval = Duration::from_secs(cli_config.poll_interval_secs.max(1));
    let countdown = spawn_countdown(&session);
    let result = wait_or_cancel(&mut session, poll_interval).await;
    countdown.abort();
    result
}

async fn wait_or_cancel(session: &mut WagerSession, poll_interval: Duration) -> anyhow::Result<()> {
    match session.wait_for_opponent(poll_interval).await? {
        WaitOutcome::OpponentJoined => return Ok(()),
        WaitOutcome::CancellationUnlocked => {}
    }

    println!();
    let cancel = Confirm::new()
        .with_prompt("No opponent yet. Stop waiting? Escrowed funds are not returned automatically")
        .default(false)
        .interact()
        .map_err(|e| CoreError::dialog(e.to_string()))?;

    if cancel {
        session.cancel()?;
        if let Some((role, receipt)) = session.escrowed() {
            println!("Stopped waiting. Escrow {} ({}) stays with the escrow account.", receipt, role);
        }
        return Ok(());
    }

    println!("Still waiting for an opponent...");
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        if let Err(e) = session.refresh_status().await {
            tracing::warn!("Status poll failed: {}", e);
        }

        match session.state() {
            SessionState::Committed => return Ok(()),
            SessionState::Error(e) => return Err(e.clone().into()),
            _ => {}
        }
    }
}

fn spawn_countdown(session: &WagerSession) -> tokio::task::JoinHandle<()> {
    let mut rx = session.subscribe_countdown();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let window = *rx.borrow_and_update();
            if window.total_seconds() == 0 {
                break;
            }
            print!(
                "\rCancel unlocks in {:>3}s",
                window.remaining_seconds()
            );
            let _ = std::io::stdout().flush();
            if window.is_expired() {
                println!();
                break;
            }
        }
    })
}
