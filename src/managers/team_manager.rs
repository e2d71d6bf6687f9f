use poise::serenity_prelude::{GuildId, Http, Member, Role, RoleId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::matching::{self, TeamMatch};
use crate::state::{SharedLeagueState, TeamRoles};

/// Role name of a franchise's general manager.
pub const GM_ROLE: &str = "General Manager";

/// Role name marking a team captain.
pub const CAPTAIN_ROLE: &str = "Captain";

/// Role name marking a player on injured reserve.
pub const IR_ROLE: &str = "IR";

/// Role name marking a permanent free agent.
pub const PERM_FA_ROLE: &str = "PermFA";

/// Suffix of per-tier free-agent role names (`<Tier>FA`).
const FA_ROLE_SUFFIX: &str = "FA";

/// Manages the team/tier/franchise directory and resolves it against the
/// guild's live role set. Role lookups re-fetch on every operation; only
/// names and role IDs are persisted.
pub struct TeamManager {
    state: SharedLeagueState,
    state_path: String,
}

impl TeamManager {
    pub fn new(state: SharedLeagueState, state_path: String) -> Self {
        Self { state, state_path }
    }

    // --- directory reads -------------------------------------------------

    pub async fn tiers(&self, guild_id: GuildId) -> Vec<String> {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .map(|g| g.tiers.clone())
            .unwrap_or_default()
    }

    pub async fn teams(&self, guild_id: GuildId) -> Vec<String> {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .map(|g| g.teams.clone())
            .unwrap_or_default()
    }

    pub async fn match_day(&self, guild_id: GuildId) -> String {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .map(|g| g.match_day.clone())
            .unwrap_or_else(|| crate::state::GuildLeague::default().match_day)
    }

    pub async fn franchise_prefixes(&self, guild_id: GuildId) -> HashMap<String, String> {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .map(|g| g.franchise_prefixes.clone())
            .unwrap_or_default()
    }

    /// GM whose franchise prefix matches `prefix` case-insensitively
    pub async fn gm_for_prefix(&self, guild_id: GuildId, prefix: &str) -> Option<String> {
        let state = self.state.read().await;
        state.guild(&guild_id.to_string()).and_then(|g| {
            g.franchise_prefixes
                .iter()
                .find(|(_, p)| p.eq_ignore_ascii_case(prefix))
                .map(|(gm, _)| gm.clone())
        })
    }

    /// Resolve a team name: exact first, fuzzy suggestions otherwise
    pub async fn match_team_name(&self, guild_id: GuildId, input: &str) -> TeamMatch {
        let teams = self.teams(guild_id).await;
        matching::match_team_name(input, &teams)
    }

    /// Resolve a tier name: exact first, best fuzzy candidate otherwise
    pub async fn match_tier_name(&self, guild_id: GuildId, input: &str) -> Option<String> {
        let tiers = self.tiers(guild_id).await;
        matching::match_tier_name(input, &tiers)
    }

    // --- directory mutations ---------------------------------------------

    /// Append a tier; `false` if one with the same name already exists
    pub async fn add_tier(&self, guild_id: GuildId, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BotError::Validation {
                errors: vec!["Tier name not found.".to_string()],
            });
        }

        let mut state = self.state.write().await;
        if !state.guild_mut(&guild_id.to_string()).add_tier(name) {
            return Ok(false);
        }
        state.save(&self.state_path).await?;
        info!("Added tier '{}' in guild {}", name, guild_id);
        Ok(true)
    }

    /// Remove a tier, returning the stored name
    pub async fn remove_tier(&self, guild_id: GuildId, name: &str) -> Result<String> {
        let mut state = self.state.write().await;
        let removed = state
            .guild_mut(&guild_id.to_string())
            .remove_tier(name)
            .ok_or_else(|| BotError::TierNotFound {
                name: name.to_string(),
            })?;
        state.save(&self.state_path).await?;
        info!("Removed tier '{}' in guild {}", removed, guild_id);
        Ok(removed)
    }

    /// Validate and record a team. All input problems are collected before
    /// reporting; nothing is persisted unless every check passes.
    pub async fn add_team(
        &self,
        http: &Http,
        guild_id: GuildId,
        team_name: &str,
        gm_name: &str,
        tier: &str,
    ) -> Result<()> {
        let team_name = team_name.trim();
        let gm_name = gm_name.trim();
        let tier = tier.trim();

        let roles = guild_id.roles(http).await?;

        let franchise_role = if gm_name.is_empty() {
            None
        } else {
            franchise_role_for_gm(&roles, gm_name)
        };
        let tier_role = role_named(&roles, tier);

        let errors = validate_team_input(
            team_name,
            gm_name,
            franchise_role.is_some(),
            tier_role.is_some(),
        );

        let pair = match (franchise_role, tier_role) {
            (Some(franchise_role), Some(tier_role)) if errors.is_empty() => TeamRoles {
                franchise_role: franchise_role.id.get(),
                tier_role: tier_role.id.get(),
            },
            _ => return Err(BotError::Validation { errors }),
        };

        let mut state = self.state.write().await;
        if !state.guild_mut(&guild_id.to_string()).add_team(team_name, pair) {
            return Err(BotError::Validation {
                errors: vec![format!("Team {} already exists.", team_name)],
            });
        }
        state.save(&self.state_path).await?;
        info!("Added team '{}' in guild {}", team_name, guild_id);
        Ok(())
    }

    /// Remove a team and its role mapping, returning the stored name
    pub async fn remove_team(&self, guild_id: GuildId, name: &str) -> Result<String> {
        let mut state = self.state.write().await;
        let removed = state
            .guild_mut(&guild_id.to_string())
            .remove_team(name)
            .ok_or_else(|| BotError::TeamNotFound {
                name: name.to_string(),
            })?;
        state.save(&self.state_path).await?;
        info!("Removed team '{}' in guild {}", removed, guild_id);
        Ok(removed)
    }

    pub async fn set_franchise_prefix(
        &self,
        guild_id: GuildId,
        gm_name: &str,
        prefix: &str,
    ) -> Result<()> {
        let gm_name = gm_name.trim();
        let prefix = prefix.trim();

        let mut errors = Vec::new();
        if gm_name.is_empty() {
            errors.push("GM name not found.".to_string());
        }
        if prefix.is_empty() {
            errors.push("Prefix not found.".to_string());
        }
        if !errors.is_empty() {
            return Err(BotError::Validation { errors });
        }

        let mut state = self.state.write().await;
        state
            .guild_mut(&guild_id.to_string())
            .franchise_prefixes
            .insert(gm_name.to_string(), prefix.to_string());
        state.save(&self.state_path).await?;
        info!("Set prefix '{}' for GM '{}' in guild {}", prefix, gm_name, guild_id);
        Ok(())
    }

    /// Remove a GM's prefix, returning the removed value
    pub async fn remove_franchise_prefix(
        &self,
        guild_id: GuildId,
        gm_name: &str,
    ) -> Result<String> {
        let mut state = self.state.write().await;
        let removed = state
            .guild_mut(&guild_id.to_string())
            .franchise_prefixes
            .remove(gm_name)
            .ok_or_else(|| BotError::PrefixNotFound {
                gm: gm_name.to_string(),
            })?;
        state.save(&self.state_path).await?;
        info!("Removed prefix for GM '{}' in guild {}", gm_name, guild_id);
        Ok(removed)
    }

    pub async fn set_match_day(&self, guild_id: GuildId, day: &str) -> Result<()> {
        let day = day.trim();
        if day.is_empty() {
            return Err(BotError::Validation {
                errors: vec!["Match day not found.".to_string()],
            });
        }

        let mut state = self.state.write().await;
        state.guild_mut(&guild_id.to_string()).match_day = day.to_string();
        state.save(&self.state_path).await?;
        info!("Set match day '{}' in guild {}", day, guild_id);
        Ok(())
    }

    // --- live role resolution --------------------------------------------

    /// Find a guild role by name, case-insensitively
    pub async fn find_role_by_name(
        &self,
        http: &Http,
        guild_id: GuildId,
        name: &str,
    ) -> Result<Role> {
        let roles = guild_id.roles(http).await?;
        role_named(&roles, name)
            .cloned()
            .ok_or_else(|| BotError::RoleNotFound {
                name: name.to_string(),
            })
    }

    /// The per-tier free-agent role (`<Tier>FA`), if the guild has one
    pub async fn find_fa_role(
        &self,
        http: &Http,
        guild_id: GuildId,
        tier: &str,
    ) -> Result<Role> {
        self.find_role_by_name(http, guild_id, &format!("{}{}", tier, FA_ROLE_SUFFIX))
            .await
    }

    /// All guild roles whose display name follows the franchise grammar,
    /// sorted by name. Roles that don't parse are skipped.
    pub async fn franchise_roles(&self, http: &Http, guild_id: GuildId) -> Result<Vec<Role>> {
        let roles = guild_id.roles(http).await?;
        let mut franchises: Vec<Role> = roles
            .values()
            .filter(|role| matching::parse_franchise_role(&role.name).is_some())
            .cloned()
            .collect();
        franchises.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(franchises)
    }

    /// The franchise role whose parsed GM name matches `gm_name`
    pub async fn franchise_role_for_gm(
        &self,
        http: &Http,
        guild_id: GuildId,
        gm_name: &str,
    ) -> Result<Role> {
        let roles = guild_id.roles(http).await?;
        franchise_role_for_gm(&roles, gm_name)
            .cloned()
            .ok_or_else(|| BotError::FranchiseNotFound {
                name: gm_name.to_string(),
            })
    }

    /// The franchise role whose parsed franchise name matches `franchise_name`
    pub async fn franchise_role_from_name(
        &self,
        http: &Http,
        guild_id: GuildId,
        franchise_name: &str,
    ) -> Result<Role> {
        let roles = guild_id.roles(http).await?;
        roles
            .values()
            .find(|role| {
                matching::parse_franchise_role(&role.name)
                    .is_some_and(|label| label.franchise.eq_ignore_ascii_case(franchise_name))
            })
            .cloned()
            .ok_or_else(|| BotError::FranchiseNotFound {
                name: franchise_name.to_string(),
            })
    }

    /// Resolve a stored team to its live franchise and tier roles
    pub async fn roles_for_team(
        &self,
        http: &Http,
        guild_id: GuildId,
        team: &str,
    ) -> Result<(Role, Role)> {
        let pair = self.stored_roles_for_team(guild_id, team).await?;
        let roles = guild_id.roles(http).await?;
        let franchise = live_role(&roles, pair.franchise_role)?;
        let tier = live_role(&roles, pair.tier_role)?;
        Ok((franchise, tier))
    }

    /// The stored role-ID pair for a team
    pub async fn stored_roles_for_team(
        &self,
        guild_id: GuildId,
        team: &str,
    ) -> Result<TeamRoles> {
        let state = self.state.read().await;
        let guild = state
            .guild(&guild_id.to_string())
            .ok_or_else(|| BotError::TeamNotFound {
                name: team.to_string(),
            })?;
        let stored = guild.team_named(team).ok_or_else(|| BotError::TeamNotFound {
            name: team.to_string(),
        })?;
        guild
            .roles_for_team(stored)
            .ok_or_else(|| BotError::TeamRolesMissing {
                team: stored.to_string(),
            })
    }

    /// Teams mapped to a franchise role, each with its tier role's name.
    /// Teams whose tier role no longer exists are skipped.
    pub async fn teams_with_tiers_for_franchise(
        &self,
        http: &Http,
        guild_id: GuildId,
        franchise_role_id: u64,
    ) -> Result<Vec<(String, String)>> {
        let stored = self.stored_team_pairs(guild_id).await;
        let roles = guild_id.roles(http).await?;

        let mut out = Vec::new();
        for (team, pair) in stored {
            if pair.franchise_role != franchise_role_id {
                continue;
            }
            match roles.get(&RoleId::new(pair.tier_role)) {
                Some(tier_role) => out.push((team, tier_role.name.clone())),
                None => debug!("Tier role {} for team '{}' is gone", pair.tier_role, team),
            }
        }
        Ok(out)
    }

    /// Teams whose tier role is named `tier`, each with its GM's name.
    /// Teams whose franchise role is gone or unparsable are skipped.
    pub async fn teams_with_gms_for_tier(
        &self,
        http: &Http,
        guild_id: GuildId,
        tier: &str,
    ) -> Result<Vec<(String, String)>> {
        let stored = self.stored_team_pairs(guild_id).await;
        let roles = guild_id.roles(http).await?;

        let mut out = Vec::new();
        for (team, pair) in stored {
            let tier_matches = roles
                .get(&RoleId::new(pair.tier_role))
                .is_some_and(|r| r.name.eq_ignore_ascii_case(tier));
            if !tier_matches {
                continue;
            }
            let gm = roles
                .get(&RoleId::new(pair.franchise_role))
                .and_then(|r| matching::parse_franchise_role(&r.name))
                .map(|label| label.gm);
            match gm {
                Some(gm) => out.push((team, gm)),
                None => debug!(
                    "Franchise role {} for team '{}' is gone or unparsable",
                    pair.franchise_role, team
                ),
            }
        }
        Ok(out)
    }

    /// The tier whose free-agent role the member holds, if any
    pub async fn free_agent_tier(
        &self,
        http: &Http,
        guild_id: GuildId,
        member: &Member,
    ) -> Result<Option<String>> {
        let tiers = self.tiers(guild_id).await;
        let roles = guild_id.roles(http).await?;
        for tier in tiers {
            if let Some(fa_role) = role_named(&roles, &format!("{}{}", tier, FA_ROLE_SUFFIX)) {
                if member.roles.contains(&fa_role.id) {
                    return Ok(Some(tier));
                }
            }
        }
        Ok(None)
    }

    /// The stored tier whose role the member currently holds, if any
    pub async fn current_tier(
        &self,
        http: &Http,
        guild_id: GuildId,
        member: &Member,
    ) -> Result<Option<String>> {
        let tiers = self.tiers(guild_id).await;
        let roles = guild_id.roles(http).await?;
        for role_id in &member.roles {
            if let Some(role) = roles.get(role_id) {
                if let Some(tier) = tiers.iter().find(|t| t.eq_ignore_ascii_case(&role.name)) {
                    return Ok(Some(tier.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Teams the member is on, derived from their franchise role plus each
    /// tier role they hold
    pub async fn teams_for_member(
        &self,
        http: &Http,
        guild_id: GuildId,
        member: &Member,
    ) -> Result<Vec<String>> {
        let roles = guild_id.roles(http).await?;
        let franchise_role = member
            .roles
            .iter()
            .filter_map(|rid| roles.get(rid))
            .find(|role| matching::parse_franchise_role(&role.name).is_some());
        let Some(franchise_role) = franchise_role else {
            return Ok(Vec::new());
        };

        let state = self.state.read().await;
        let Some(guild) = state.guild(&guild_id.to_string()) else {
            return Ok(Vec::new());
        };

        let mut teams = Vec::new();
        for role_id in &member.roles {
            let Some(role) = roles.get(role_id) else {
                continue;
            };
            if guild.tier_named(&role.name).is_none() {
                continue;
            }
            if let Some(team) = guild.team_for_roles(franchise_role.id.get(), role_id.get()) {
                teams.push(team.to_string());
            }
        }
        Ok(teams)
    }

    /// Format a team's roster as a code block: GM first, then tier members,
    /// with captain and injured-reserve annotations
    pub async fn format_roster(
        &self,
        http: &Http,
        guild_id: GuildId,
        team: &str,
    ) -> Result<String> {
        let pair = self.stored_roles_for_team(guild_id, team).await?;
        let roles = guild_id.roles(http).await?;
        let franchise_role = live_role(&roles, pair.franchise_role)?;
        let tier_role = live_role(&roles, pair.tier_role)?;

        let members = guild_id.members(http, None, None).await?;

        let mut gm_line = None;
        let mut member_lines = Vec::new();
        for member in &members {
            if !member.roles.contains(&franchise_role.id) {
                continue;
            }
            let captain = member_has_role_named(member, &roles, CAPTAIN_ROLE);
            let ir = member_has_role_named(member, &roles, IR_ROLE);
            if member_has_role_named(member, &roles, GM_ROLE) {
                gm_line = Some(format_roster_entry(member.display_name(), &["GM"], captain, ir));
            } else if member.roles.contains(&tier_role.id) {
                member_lines.push(format_roster_entry(member.display_name(), &[], captain, ir));
            }
        }

        Ok(format_roster_block(
            team,
            &tier_role.name,
            gm_line.as_deref(),
            &member_lines,
        ))
    }

    /// Members holding the tier's free-agent role, flagging permanent FAs
    pub async fn free_agents(
        &self,
        http: &Http,
        guild_id: GuildId,
        tier: &str,
    ) -> Result<Vec<String>> {
        let fa_role = self.find_fa_role(http, guild_id, tier).await?;
        let roles = guild_id.roles(http).await?;
        let members = guild_id.members(http, None, None).await?;

        let mut lines = Vec::new();
        for member in &members {
            if !member.roles.contains(&fa_role.id) {
                continue;
            }
            let mut line = member.display_name().to_string();
            if member_has_role_named(member, &roles, PERM_FA_ROLE) {
                line.push_str(" (Permanent FA)");
            }
            lines.push(line);
        }
        Ok(lines)
    }

    async fn stored_team_pairs(&self, guild_id: GuildId) -> Vec<(String, TeamRoles)> {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .map(|g| {
                g.teams
                    .iter()
                    .filter_map(|team| {
                        g.team_roles.get(team).map(|pair| (team.clone(), *pair))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Collect every add-team input problem instead of stopping at the first.
/// A missing franchise role is only reported when a GM name was given.
fn validate_team_input(
    team_name: &str,
    gm_name: &str,
    franchise_found: bool,
    tier_found: bool,
) -> Vec<String> {
    let mut errors = Vec::new();
    if team_name.is_empty() {
        errors.push("Team name not found.".to_string());
    }
    if gm_name.is_empty() {
        errors.push("GM name not found.".to_string());
    } else if !franchise_found {
        errors.push(format!("Franchise role not found for {}.", gm_name));
    }
    if !tier_found {
        errors.push("Tier role not found.".to_string());
    }
    errors
}

fn role_named<'a>(roles: &'a HashMap<RoleId, Role>, name: &str) -> Option<&'a Role> {
    roles.values().find(|r| r.name.eq_ignore_ascii_case(name))
}

fn franchise_role_for_gm<'a>(roles: &'a HashMap<RoleId, Role>, gm_name: &str) -> Option<&'a Role> {
    roles.values().find(|role| {
        matching::parse_franchise_role(&role.name).is_some_and(|label| label.gm == gm_name)
    })
}

fn live_role(roles: &HashMap<RoleId, Role>, role_id: u64) -> crate::error::Result<Role> {
    roles
        .get(&RoleId::new(role_id))
        .cloned()
        .ok_or_else(|| BotError::RoleNotFound {
            name: format!("role id {}", role_id),
        })
}

fn member_has_role_named(
    member: &Member,
    roles: &HashMap<RoleId, Role>,
    name: &str,
) -> bool {
    member
        .roles
        .iter()
        .any(|rid| roles.get(rid).is_some_and(|r| r.name.eq_ignore_ascii_case(name)))
}

/// One roster line: display name plus pipe-joined annotations
fn format_roster_entry(name: &str, base_tags: &[&str], captain: bool, ir: bool) -> String {
    let mut tags: Vec<&str> = base_tags.to_vec();
    if captain {
        tags.push("C");
    }
    if ir {
        tags.push("IR");
    }
    if tags.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, tags.join("|"))
    }
}

fn format_roster_block(
    team: &str,
    tier: &str,
    gm: Option<&str>,
    members: &[String],
) -> String {
    let mut message = format!("```\n{} ({}):\n", team, tier);
    if let Some(gm) = gm {
        message.push_str(&format!("  {}\n", gm));
    }
    for line in members {
        message.push_str(&format!("  {}\n", line));
    }
    if members.is_empty() {
        message.push_str("  No known members.");
    }
    message.push_str("```\n");
    message
}

/// Shared team manager type
pub type SharedTeamManager = Arc<tokio::sync::RwLock<TeamManager>>;

pub fn create_shared_team_manager(
    state: SharedLeagueState,
    state_path: String,
) -> SharedTeamManager {
    Arc::new(tokio::sync::RwLock::new(TeamManager::new(state, state_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_collects_every_problem() {
        let errors = validate_team_input("", "", false, false);
        assert_eq!(
            errors,
            vec![
                "Team name not found.".to_string(),
                "GM name not found.".to_string(),
                "Tier role not found.".to_string(),
            ]
        );

        let errors = validate_team_input("Derechos", "Shamu", false, true);
        assert_eq!(errors, vec!["Franchise role not found for Shamu.".to_string()]);

        assert!(validate_team_input("Derechos", "Shamu", true, true).is_empty());
    }

    #[test]
    fn test_format_roster_entry_annotations() {
        assert_eq!(format_roster_entry("Shamu", &["GM"], false, false), "Shamu (GM)");
        assert_eq!(format_roster_entry("Shamu", &["GM"], true, false), "Shamu (GM|C)");
        assert_eq!(format_roster_entry("Snipe", &[], false, true), "Snipe (IR)");
        assert_eq!(format_roster_entry("Snipe", &[], false, false), "Snipe");
    }

    #[test]
    fn test_format_roster_block_with_members() {
        let members = vec!["Snipe (C)".to_string(), "Wave".to_string()];
        let block = format_roster_block("Derechos", "Challenger", Some("Shamu (GM)"), &members);
        assert!(block.starts_with("```\nDerechos (Challenger):\n"));
        assert!(block.contains("  Shamu (GM)\n"));
        assert!(block.contains("  Snipe (C)\n"));
        assert!(block.contains("  Wave\n"));
        assert!(!block.contains("No known members."));
    }

    #[test]
    fn test_format_roster_block_without_members() {
        let block = format_roster_block("Derechos", "Challenger", Some("Shamu (GM)"), &[]);
        assert!(block.contains("No known members."));
    }
}
