use tracing::info;

use crate::error::BotError;
use crate::{Context, Error};

/// List the franchise roles in this server
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn franchises(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;
    let roles = manager.franchise_roles(ctx.http(), guild_id).await?;

    if roles.is_empty() {
        ctx.say("No franchise roles found in this server.").await?;
        return Ok(());
    }

    let mut message = String::from("```Franchises:");
    for role in &roles {
        message.push_str(&format!("\n\t{}", role.name));
    }
    message.push_str("```");
    ctx.say(message).await?;
    Ok(())
}

/// List teams for a franchise, tier, or franchise prefix
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn teams(
    ctx: Context<'_>,
    #[rest]
    #[description = "Franchise name, tier, or prefix"]
    query: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;

    // Franchise prefix
    if let Some(gm) = manager.gm_for_prefix(guild_id, &query).await {
        match manager.franchise_role_for_gm(ctx.http(), guild_id, &gm).await {
            Ok(role) => {
                let entries = manager
                    .teams_with_tiers_for_franchise(ctx.http(), guild_id, role.id.get())
                    .await?;
                ctx.say(format_team_list(&role.name, &entries)).await?;
            }
            Err(BotError::FranchiseNotFound { .. }) => {
                ctx.say(format!(":x: Franchise role not found for {}", gm))
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }

    // Tier
    let tier = manager
        .tiers(guild_id)
        .await
        .into_iter()
        .find(|t| t.eq_ignore_ascii_case(&query));
    if let Some(tier) = tier {
        let entries = manager
            .teams_with_gms_for_tier(ctx.http(), guild_id, &tier)
            .await?;
        ctx.say(format_team_list(&format!("{} teams", tier), &entries))
            .await?;
        return Ok(());
    }

    // Franchise name
    match manager
        .franchise_role_from_name(ctx.http(), guild_id, &query)
        .await
    {
        Ok(role) => {
            let entries = manager
                .teams_with_tiers_for_franchise(ctx.http(), guild_id, role.id.get())
                .await?;
            ctx.say(format_team_list(&role.name, &entries)).await?;
        }
        Err(BotError::FranchiseNotFound { .. }) => {
            ctx.say(format!(
                "No franchise, tier, or prefix with name: {}",
                query
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Show a team's roster
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn roster(
    ctx: Context<'_>,
    #[rest]
    #[description = "Team name"]
    team_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;

    match manager.match_team_name(guild_id, &team_name).await {
        crate::matching::TeamMatch::Exact(team) => {
            match manager.format_roster(ctx.http(), guild_id, &team).await {
                Ok(block) => {
                    ctx.say(block).await?;
                }
                Err(BotError::TeamRolesMissing { .. }) | Err(BotError::RoleNotFound { .. }) => {
                    ctx.say(format!("No franchise and tier roles set up for {}", team))
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        crate::matching::TeamMatch::Suggestions(suggestions) => {
            let mut message = format!("No team with name: {}", team_name);
            if !suggestions.is_empty() {
                message.push_str("\nDo you mean one of these teams:");
                for suggestion in &suggestions {
                    message.push_str(&format!(" `{}`", suggestion));
                }
            }
            ctx.say(message).await?;
        }
    }
    Ok(())
}

/// Show the franchise and tier roles a team maps to
#[poise::command(prefix_command, slash_command, guild_only, aliases("teamRoles"))]
pub async fn team_roles(
    ctx: Context<'_>,
    #[rest]
    #[description = "Team name"]
    team_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;

    match manager.roles_for_team(ctx.http(), guild_id, &team_name).await {
        Ok((franchise, tier)) => {
            ctx.say(format!(
                "Franchise role for {0} = {1}\nTier role for {0} = {2}",
                team_name, franchise.name, tier.name
            ))
            .await?;
        }
        Err(BotError::TeamNotFound { .. }) => {
            ctx.say(format!("No team with name: {}", team_name)).await?;
        }
        Err(BotError::TeamRolesMissing { .. }) | Err(BotError::RoleNotFound { .. }) => {
            ctx.say(format!(
                "No franchise and tier roles set up for {}",
                team_name
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// List the teams set up in this server
#[poise::command(prefix_command, slash_command, guild_only, aliases("listTeams"))]
pub async fn list_teams(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;
    let teams = manager.teams(guild_id).await;

    if teams.is_empty() {
        ctx.say("No teams set up in this server.").await?;
    } else {
        ctx.say(format!("Teams set up in this server: {}", teams.join(", ")))
            .await?;
    }
    Ok(())
}

/// List free agents in a tier
#[poise::command(prefix_command, slash_command, guild_only, aliases("freeAgents"))]
pub async fn free_agents(
    ctx: Context<'_>,
    #[description = "Tier name"]
    #[autocomplete = "super::tier_autocomplete"]
    tier_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let manager = ctx.data().team_manager.read().await;

    let Some(tier) = manager.match_tier_name(guild_id, &tier_name).await else {
        ctx.say(format!("No tier with name: {}", tier_name)).await?;
        return Ok(());
    };

    match manager.free_agents(ctx.http(), guild_id, &tier).await {
        Ok(lines) if lines.is_empty() => {
            ctx.say(format!("No free agents in the {} tier.", tier)).await?;
        }
        Ok(lines) => {
            let mut message = format!("```{} Free Agents:", tier);
            for line in &lines {
                message.push_str(&format!("\n\t{}", line));
            }
            message.push_str("```");
            ctx.say(message).await?;
        }
        Err(BotError::RoleNotFound { name }) => {
            ctx.say(format!("No free agent role with name: {}", name))
                .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Show the teams you are on
#[poise::command(prefix_command, slash_command, guild_only, aliases("teamsForUser"))]
pub async fn teams_for_user(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not resolve you as a server member")?;

    let manager = ctx.data().team_manager.read().await;
    let teams = manager
        .teams_for_member(ctx.http(), guild_id, &member)
        .await?;

    if teams.is_empty() {
        ctx.say("You are not on any team in this server.").await?;
    } else {
        ctx.say(format!("Your teams: {}", teams.join(", "))).await?;
    }
    Ok(())
}

/// Add a team and map it to a franchise and tier
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("addTeam")
)]
pub async fn add_team(
    ctx: Context<'_>,
    #[description = "Team name"] team_name: String,
    #[description = "GM name"] gm_name: String,
    #[description = "Tier name"] tier: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    info!("add_team '{}' called by {}", team_name, ctx.author().name);

    let manager = ctx.data().team_manager.read().await;
    match manager
        .add_team(ctx.http(), guild_id, &team_name, &gm_name, &tier)
        .await
    {
        Ok(()) => {
            ctx.say("Done.").await?;
        }
        Err(e @ BotError::Validation { .. }) => {
            ctx.say(format!(":x: {}", e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Add several teams at once; each entry is a `team,gm,tier` triple,
/// entries separated by `;`
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("addTeams")
)]
pub async fn add_teams(
    ctx: Context<'_>,
    #[rest]
    #[description = "Teams to add: `name,gm,tier; name,gm,tier; ...`"]
    teams_to_add: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;

    let triples = match parse_team_triples(&teams_to_add) {
        Ok(triples) => triples,
        Err(message) => {
            ctx.say(format!(":x: {}", message)).await?;
            return Ok(());
        }
    };
    if triples.is_empty() {
        ctx.say("No teams provided.").await?;
        return Ok(());
    }

    let manager = ctx.data().team_manager.read().await;
    let mut added = 0;
    let mut lines = Vec::new();
    for (team, gm, tier) in &triples {
        match manager.add_team(ctx.http(), guild_id, team, gm, tier).await {
            Ok(()) => {
                added += 1;
                lines.push(format!("Added team: {}", team));
            }
            Err(e @ BotError::Validation { .. }) => {
                lines.push(format!("Error adding team {}: {}", team, e));
            }
            Err(e) => return Err(e.into()),
        }
    }
    lines.push(format!("Added {} team(s).", added));
    ctx.say(lines.join("\n")).await?;
    Ok(())
}

/// Remove a team
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("removeTeam")
)]
pub async fn remove_team(
    ctx: Context<'_>,
    #[rest]
    #[description = "Team name"]
    team_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;
    info!("remove_team '{}' called by {}", team_name, ctx.author().name);

    let manager = ctx.data().team_manager.read().await;
    match manager.remove_team(guild_id, &team_name).await {
        Ok(_) => {
            ctx.say("Done.").await?;
        }
        Err(BotError::TeamNotFound { .. }) => {
            ctx.say(format!("{} does not seem to be a team.", team_name))
                .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Set the franchise prefix for a GM
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("setFranchisePrefix")
)]
pub async fn set_franchise_prefix(
    ctx: Context<'_>,
    #[description = "GM name"] gm_name: String,
    #[description = "Franchise prefix"] prefix: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;

    let manager = ctx.data().team_manager.read().await;
    match manager
        .set_franchise_prefix(guild_id, &gm_name, &prefix)
        .await
    {
        Ok(()) => {
            ctx.say("Done.").await?;
        }
        Err(e @ BotError::Validation { .. }) => {
            ctx.say(format!(":x: {}", e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Remove a GM's franchise prefix
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD",
    aliases("removeFranchisePrefix")
)]
pub async fn remove_franchise_prefix(
    ctx: Context<'_>,
    #[description = "GM name"] gm_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a server")?;

    let manager = ctx.data().team_manager.read().await;
    match manager.remove_franchise_prefix(guild_id, &gm_name).await {
        Ok(_) => {
            ctx.say("Done.").await?;
        }
        Err(BotError::PrefixNotFound { .. }) => {
            ctx.say(format!("No prefix set for GM: {}", gm_name)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn format_team_list(header: &str, entries: &[(String, String)]) -> String {
    let mut message = format!("```{}:", header);
    for (team, annotation) in entries {
        message.push_str(&format!("\n\t{} ({})", team, annotation));
    }
    message.push_str("```");
    message
}

/// Parse `team,gm,tier` triples separated by `;`. Empty entries are
/// skipped; a malformed entry fails the whole batch.
fn parse_team_triples(input: &str) -> std::result::Result<Vec<(String, String, String)>, String> {
    let mut triples = Vec::new();
    for (index, entry) in input.split(';').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let parts: Vec<&str> = entry.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!(
                "Entry {} is not a `team,gm,tier` triple: `{}`",
                index + 1,
                entry
            ));
        }
        triples.push((
            parts[0].to_string(),
            parts[1].to_string(),
            parts[2].to_string(),
        ));
    }
    Ok(triples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_team_triples() {
        let triples =
            parse_team_triples("Derechos,Shamu,Challenger; Barbarians,Snipe,Challenger").unwrap();
        assert_eq!(
            triples,
            vec![
                (
                    "Derechos".to_string(),
                    "Shamu".to_string(),
                    "Challenger".to_string()
                ),
                (
                    "Barbarians".to_string(),
                    "Snipe".to_string(),
                    "Challenger".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_parse_team_triples_skips_empty_entries() {
        let triples = parse_team_triples("Derechos,Shamu,Challenger;").unwrap();
        assert_eq!(triples.len(), 1);
        assert!(parse_team_triples("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_team_triples_rejects_malformed_entries() {
        let err = parse_team_triples("Derechos,Shamu").unwrap_err();
        assert!(err.contains("Entry 1"));
        let err = parse_team_triples("Derechos,Shamu,Challenger; Barbarians,Snipe").unwrap_err();
        assert!(err.contains("Entry 2"));
    }

    #[test]
    fn test_format_team_list() {
        let entries = vec![
            ("Derechos".to_string(), "Challenger".to_string()),
            ("Tidal Wave".to_string(), "Elite".to_string()),
        ];
        let message = format_team_list("The Ocean (Shamu)", &entries);
        assert!(message.starts_with("```The Ocean (Shamu):"));
        assert!(message.contains("\n\tDerechos (Challenger)"));
        assert!(message.contains("\n\tTidal Wave (Elite)"));
        assert!(message.ends_with("```"));
    }
}
