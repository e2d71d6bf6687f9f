use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Match day used before an admin sets one.
const DEFAULT_MATCH_DAY: &str = "1";

/// Persistent league directory: tiers, teams, and their role mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeagueState {
    /// Schema version
    pub version: u32,

    /// Per-guild directory (guild ID -> data)
    pub guilds: HashMap<String, GuildLeague>,
}

impl Default for LeagueState {
    fn default() -> Self {
        Self {
            version: 1,
            guilds: HashMap::new(),
        }
    }
}

impl LeagueState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from file or create new
    pub async fn load(path: &str) -> crate::error::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| crate::error::BotError::StateParse {
                    path: path.to_string(),
                    source: e,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(crate::error::BotError::StateLoad {
                path: path.to_string(),
                source: e,
            }),
        }
    }

    /// Save to file atomically
    pub async fn save(&self, path: &str) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        let temp_path = format!("{}.tmp", path);
        tokio::fs::write(&temp_path, &content).await.map_err(|e| {
            crate::error::BotError::StateSave {
                path: path.to_string(),
                source: e,
            }
        })?;

        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            crate::error::BotError::StateSave {
                path: path.to_string(),
                source: e,
            }
        })?;

        Ok(())
    }

    /// Get guild data (read-only)
    pub fn guild(&self, guild_id: &str) -> Option<&GuildLeague> {
        self.guilds.get(guild_id)
    }

    /// Get or create guild data
    pub fn guild_mut(&mut self, guild_id: &str) -> &mut GuildLeague {
        self.guilds.entry(guild_id.to_string()).or_default()
    }
}

/// The role-ID pair a team maps to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TeamRoles {
    pub franchise_role: u64,
    pub tier_role: u64,
}

/// Directory data for a single guild
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuildLeague {
    /// Ordered tier names; unique case-insensitively
    pub tiers: Vec<String>,

    /// Ordered team names; unique case-insensitively
    pub teams: Vec<String>,

    /// Team name -> role-ID pair
    pub team_roles: HashMap<String, TeamRoles>,

    /// GM name -> franchise prefix
    pub franchise_prefixes: HashMap<String, String>,

    /// Current match day key
    pub match_day: String,
}

impl Default for GuildLeague {
    fn default() -> Self {
        Self {
            tiers: Vec::new(),
            teams: Vec::new(),
            team_roles: HashMap::new(),
            franchise_prefixes: HashMap::new(),
            match_day: DEFAULT_MATCH_DAY.to_string(),
        }
    }
}

impl GuildLeague {
    /// Stored tier name matching `name` case-insensitively
    pub fn tier_named(&self, name: &str) -> Option<&str> {
        self.tiers
            .iter()
            .find(|t| t.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Stored team name matching `name` case-insensitively
    pub fn team_named(&self, name: &str) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Append a tier; `false` if one with the same name already exists
    pub fn add_tier(&mut self, name: &str) -> bool {
        if self.tier_named(name).is_some() {
            return false;
        }
        self.tiers.push(name.to_string());
        true
    }

    /// Remove a tier, returning the stored name if it existed
    pub fn remove_tier(&mut self, name: &str) -> Option<String> {
        let stored = self.tier_named(name)?.to_string();
        self.tiers.retain(|t| t != &stored);
        Some(stored)
    }

    /// Record a team and its role pair; `false` on a duplicate name
    pub fn add_team(&mut self, name: &str, roles: TeamRoles) -> bool {
        if self.team_named(name).is_some() {
            return false;
        }
        self.teams.push(name.to_string());
        self.team_roles.insert(name.to_string(), roles);
        true
    }

    /// Remove a team and its role mapping, returning the stored name
    pub fn remove_team(&mut self, name: &str) -> Option<String> {
        let stored = self.team_named(name)?.to_string();
        self.teams.retain(|t| t != &stored);
        self.team_roles.remove(&stored);
        Some(stored)
    }

    /// Role-ID pair for a team, resolved case-insensitively
    pub fn roles_for_team(&self, name: &str) -> Option<TeamRoles> {
        let stored = self.team_named(name)?;
        self.team_roles.get(stored).copied()
    }

    /// Team whose stored role pair matches the given role IDs
    pub fn team_for_roles(&self, franchise_role: u64, tier_role: u64) -> Option<&str> {
        self.teams
            .iter()
            .find(|team| {
                self.team_roles.get(*team).is_some_and(|r| {
                    r.franchise_role == franchise_role && r.tier_role == tier_role
                })
            })
            .map(String::as_str)
    }
}

/// Shared league state type
pub type SharedLeagueState = Arc<tokio::sync::RwLock<LeagueState>>;

pub fn create_shared_league_state(state: LeagueState) -> SharedLeagueState {
    Arc::new(tokio::sync::RwLock::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_names_unique_case_insensitively() {
        let mut guild = GuildLeague::default();
        assert!(guild.add_tier("Elite"));
        assert!(!guild.add_tier("elite"));
        assert_eq!(guild.tiers, vec!["Elite".to_string()]);

        assert_eq!(guild.remove_tier("ELITE"), Some("Elite".to_string()));
        assert!(guild.tiers.is_empty());
        assert_eq!(guild.remove_tier("Elite"), None);
    }

    #[test]
    fn test_remove_team_drops_role_mapping() {
        let mut guild = GuildLeague::default();
        let roles = TeamRoles {
            franchise_role: 11,
            tier_role: 22,
        };
        assert!(guild.add_team("Derechos", roles));
        assert!(!guild.add_team("derechos", roles));

        assert_eq!(guild.roles_for_team("DERECHOS"), Some(roles));
        assert_eq!(guild.team_for_roles(11, 22), Some("Derechos"));

        assert_eq!(guild.remove_team("derechos"), Some("Derechos".to_string()));
        assert!(guild.teams.is_empty());
        assert!(guild.team_roles.is_empty());
        assert_eq!(guild.roles_for_team("Derechos"), None);
    }

    #[test]
    fn test_guild_scoping_round_trips_through_json() {
        let mut state = LeagueState::new();
        let guild = state.guild_mut("100");
        guild.add_tier("Challenger");
        guild.add_team(
            "Barbarians",
            TeamRoles {
                franchise_role: 1,
                tier_role: 2,
            },
        );
        guild.match_day = "3".to_string();
        state.guild_mut("200").add_tier("Elite");

        let json = serde_json::to_string(&state).unwrap();
        let back: LeagueState = serde_json::from_str(&json).unwrap();

        assert_eq!(back.guild("100").unwrap().teams, vec!["Barbarians"]);
        assert_eq!(back.guild("100").unwrap().match_day, "3");
        assert_eq!(back.guild("200").unwrap().tiers, vec!["Elite"]);
        assert!(back.guild("300").is_none());
    }
}
