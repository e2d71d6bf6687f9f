use tracing::info;

use crate::error::BotError;
use crate::{Context, Error};

/// List the tiers set up in this server
#[poise::command(prefix_command, slash_command, guild_only, aliases("tierList"))]
pub async fn tier_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;
    let tiers = manager.tiers(guild_id).await;

    if tiers.is_empty() {
        ctx.say("No tiers set up in this server.").await?;
    } else {
        ctx.say(format!("Tiers set up in this server: {}", tiers.join(", ")))
            .await?;
    }
    Ok(())
}

/// Add a tier
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("addTier")
)]
pub async fn add_tier(
    ctx: Context<'_>,
    #[description = "Tier name"] tier_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    info!("add_tier '{}' called by {}", tier_name, ctx.author().name);

    let manager = ctx.data().team_manager.read().await;
    match manager.add_tier(guild_id, &tier_name).await {
        Ok(true) => {
            ctx.say("Done.").await?;
        }
        Ok(false) => {
            ctx.say(format!("`{}` is already a tier.", tier_name.trim()))
                .await?;
        }
        Err(e @ BotError::Validation { .. }) => {
            ctx.say(format!(":x: {}", e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Remove a tier
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("removeTier")
)]
pub async fn remove_tier(
    ctx: Context<'_>,
    #[description = "Tier name"]
    #[autocomplete = "super::tier_autocomplete"]
    tier_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    info!("remove_tier '{}' called by {}", tier_name, ctx.author().name);

    let manager = ctx.data().team_manager.read().await;
    match manager.remove_tier(guild_id, &tier_name).await {
        Ok(_) => {
            ctx.say("Done.").await?;
        }
        Err(BotError::TierNotFound { .. }) => {
            ctx.say(format!("{} does not seem to be a tier.", tier_name))
                .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
