use crate::config::CliConfig;
use clap::Args;
use std::sync::Arc;
use wager_core::{HttpGateway, WagerIdentity};
use wager_protocol::{SettlementOutcome, SettlementReporter};

#[derive(Args)]
pub struct FinishArgs {
    /// Host of the game website
    pub host: String,
    /// Game ID to settle
    pub game_id: String,
    /// Winning player ID (the player's ID for solo games)
    #[arg(long, required_unless_present = "tie", conflicts_with = "tie")]
    pub winner: Option<String>,
    /// Winner's public key
    #[arg(long, required_unless_present = "tie", conflicts_with = "tie")]
    pub winner_key: Option<String>,
    /// The game ended level
    #[arg(long)]
    pub tie: bool,
    /// Solo game: whether the house won
    #[arg(long, conflicts_with = "tie")]
    pub solo_house_won: Option<bool>,
}

pub async fn handle_finish_command(args: FinishArgs, cli_config: &CliConfig) -> anyhow::Result<()> {
    let identity = WagerIdentity::new(&args.host, &args.game_id)?;
    let gateway = Arc::new(HttpGateway::with_base_url(&cli_config.backend_url)?);

    let outcome = if args.tie {
        SettlementOutcome::tie()
    } else {
        let winner = args.winner.unwrap_or_default();
        let winner_key = args.winner_key.unwrap_or_default();
        match args.solo_house_won {
            Some(house_won) => SettlementOutcome::solo(winner, winner_key, house_won),
            None => SettlementOutcome::winner(winner, winner_key),
        }
    };

    let ack = SettlementReporter::new(gateway)
        .report_outcome(&identity, &outcome)
        .await?;

    println!("Outcome reported for {}", identity);
    println!("{}", serde_json::to_string_pretty(&ack.into_inner())?);
    Ok(())
}
