use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Persistent match-day check-in lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvailabilityState {
    /// Schema version
    pub version: u32,

    /// Per-guild lists (guild ID -> match day -> tier -> user IDs)
    pub guilds: HashMap<String, GuildAvailability>,
}

impl Default for AvailabilityState {
    fn default() -> Self {
        Self {
            version: 1,
            guilds: HashMap::new(),
        }
    }
}

impl AvailabilityState {
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

    /// Get guild lists (read-only)
    pub fn guild(&self, guild_id: &str) -> Option<&GuildAvailability> {
        self.guilds.get(guild_id)
    }

    /// Get or create guild lists
    pub fn guild_mut(&mut self, guild_id: &str) -> &mut GuildAvailability {
        self.guilds.entry(guild_id.to_string()).or_default()
    }
}

/// Check-in lists for a single guild
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GuildAvailability {
    /// Match day -> tier -> checked-in user IDs
    pub days: HashMap<String, HashMap<String, Vec<u64>>>,
}

impl GuildAvailability {
    /// User IDs checked in for a (match day, tier); empty if absent.
    /// Reads never materialize missing keys.
    pub fn checked_in(&self, match_day: &str, tier: &str) -> &[u64] {
        self.days
            .get(match_day)
            .and_then(|tiers| tiers.get(tier))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_checked_in(&self, match_day: &str, tier: &str, user_id: u64) -> bool {
        self.checked_in(match_day, tier).contains(&user_id)
    }

    /// Append a user; idempotent, `false` if already present
    pub fn check_in(&mut self, match_day: &str, tier: &str, user_id: u64) -> bool {
        let list = self
            .days
            .entry(match_day.to_string())
            .or_default()
            .entry(tier.to_string())
            .or_default();
        if list.contains(&user_id) {
            return false;
        }
        list.push(user_id);
        true
    }

    /// Remove a user; `false` if not present. Absence is a no-op, never
    /// an inconsistent store.
    pub fn check_out(&mut self, match_day: &str, tier: &str, user_id: u64) -> bool {
        let Some(list) = self
            .days
            .get_mut(match_day)
            .and_then(|tiers| tiers.get_mut(tier))
        else {
            return false;
        };
        let before = list.len();
        list.retain(|id| *id != user_id);
        list.len() != before
    }

    /// Reset one tier's list for a match day
    pub fn clear_tier(&mut self, match_day: &str, tier: &str) {
        self.days
            .entry(match_day.to_string())
            .or_default()
            .insert(tier.to_string(), Vec::new());
    }

    /// Reset a whole match day
    pub fn clear_day(&mut self, match_day: &str) {
        self.days.insert(match_day.to_string(), HashMap::new());
    }

    /// Reset every match day
    pub fn clear_all(&mut self) {
        self.days.clear();
    }
}

/// Shared availability state type
pub type SharedAvailabilityState = Arc<tokio::sync::RwLock<AvailabilityState>>;

pub fn create_shared_availability_state(state: AvailabilityState) -> SharedAvailabilityState {
    Arc::new(tokio::sync::RwLock::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_is_idempotent() {
        let mut guild = GuildAvailability::default();
        assert!(guild.check_in("1", "Elite", 42));
        assert!(!guild.check_in("1", "Elite", 42));
        assert_eq!(guild.checked_in("1", "Elite"), &[42]);
    }

    #[test]
    fn test_check_out_of_absent_user_is_a_noop() {
        let mut guild = GuildAvailability::default();
        assert!(!guild.check_out("1", "Elite", 42));

        guild.check_in("1", "Elite", 42);
        guild.check_in("1", "Elite", 43);
        assert!(!guild.check_out("1", "Elite", 99));
        assert_eq!(guild.checked_in("1", "Elite"), &[42, 43]);

        assert!(guild.check_out("1", "Elite", 42));
        assert_eq!(guild.checked_in("1", "Elite"), &[43]);
    }

    #[test]
    fn test_reads_do_not_materialize_keys() {
        let guild = GuildAvailability::default();
        assert!(guild.checked_in("1", "Elite").is_empty());
        assert!(guild.days.is_empty());
    }

    #[test]
    fn test_clear_scopes() {
        let mut guild = GuildAvailability::default();
        guild.check_in("1", "Elite", 1);
        guild.check_in("1", "Challenger", 2);
        guild.check_in("2", "Elite", 3);

        guild.clear_tier("1", "Elite");
        assert!(guild.checked_in("1", "Elite").is_empty());
        assert_eq!(guild.checked_in("1", "Challenger"), &[2]);

        guild.clear_day("1");
        assert!(guild.checked_in("1", "Challenger").is_empty());
        assert_eq!(guild.checked_in("2", "Elite"), &[3]);

        guild.clear_all();
        assert!(guild.checked_in("2", "Elite").is_empty());
        assert!(guild.days.is_empty());
    }

    #[test]
    fn test_guild_scoping_round_trips_through_json() {
        let mut state = AvailabilityState::new();
        state.guild_mut("100").check_in("1", "Elite", 42);
        state.guild_mut("200").check_in("1", "Elite", 43);

        let json = serde_json::to_string(&state).unwrap();
        let back: AvailabilityState = serde_json::from_str(&json).unwrap();

        assert_eq!(back.guild("100").unwrap().checked_in("1", "Elite"), &[42]);
        assert_eq!(back.guild("200").unwrap().checked_in("1", "Elite"), &[43]);
        assert!(back.guild("300").is_none());
    }
}
