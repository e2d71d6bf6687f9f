use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Context, Error};

/// Check if the bot is running
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command called by {}", ctx.author().name);
    ctx.send(poise::CreateReply::default()
        .content("Pong! Bot is working!")
        .ephemeral(true))
        .await?;
    Ok(())
}

/// Show help information
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Bot Commands")
        .description("Available commands:")
        .field("/check_in", "Check in as available for the current match day (`ci`)", false)
        .field("/check_out", "Take yourself off the availability list (`co`)", false)
        .field("/check_availability", "Show who's checked in for a tier (`ca`)", false)
        .field("/tier_list", "List the tiers set up in this server", false)
        .field("/list_teams", "List the teams set up in this server", false)
        .field("/teams", "List teams for a franchise, tier, or prefix", false)
        .field("/roster", "Show a team's roster", false)
        .field("/free_agents", "List free agents in a tier", false)
        .field("/add_team, /add_tier, /clear_availability, ...", "Admin commands (Manage Server)", false)
        .color(0x3498db);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}
