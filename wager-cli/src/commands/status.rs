use crate::config::CliConfig;
use wager_core::{HttpGateway, WagerGateway, WagerIdentity, WagerStatus};

pub async fn handle_status_command(
    host: &str,
    game_id: &str,
    cli_config: &CliConfig,
) -> anyhow::Result<()> {
    let identity = WagerIdentity::new(host, game_id)?;
    let gateway = HttpGateway::with_base_url(&cli_config.backend_url)?;

    let status = gateway.query_status(&identity).await?;

    println!("Wager {}: {}", identity, status);
    match status {
        WagerStatus::NotFound => println!("No wager recorded yet; the first player creates it."),
        WagerStatus::AwaitingSecondParty => println!("Open for a second player to join."),
        WagerStatus::Accepted => println!("Both stakes recorded; the game is live."),
        WagerStatus::Finished => println!("Outcome already reported."),
    }

    Ok(())
}
