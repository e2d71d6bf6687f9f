use dashmap::DashMap;
use poise::serenity_prelude::{GuildId, UserId};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::error::Result;
use crate::state::SharedAvailabilityState;

/// An in-flight check-in/check-out confirmation dialog
#[derive(Debug, Clone)]
pub struct PendingDialog {
    pub user_id: UserId,
    pub match_day: String,
    pub tier: String,
    pub started_at: u64,
}

/// Manages the match-day availability store. Every mutation holds the
/// store's write guard across the read-modify-write and the save, so
/// concurrent check-ins in the same tier serialize instead of racing.
pub struct AvailabilityManager {
    state: SharedAvailabilityState,
    state_path: String,

    /// In-flight dialogs (user -> state); at most one per user
    pending: DashMap<UserId, PendingDialog>,
}

impl AvailabilityManager {
    pub fn new(state: SharedAvailabilityState, state_path: String) -> Self {
        Self {
            state,
            state_path,
            pending: DashMap::new(),
        }
    }

    /// User IDs checked in for a (match day, tier)
    pub async fn checked_in(&self, guild_id: GuildId, match_day: &str, tier: &str) -> Vec<u64> {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .map(|g| g.checked_in(match_day, tier).to_vec())
            .unwrap_or_default()
    }

    pub async fn is_checked_in(
        &self,
        guild_id: GuildId,
        match_day: &str,
        tier: &str,
        user_id: UserId,
    ) -> bool {
        let state = self.state.read().await;
        state
            .guild(&guild_id.to_string())
            .is_some_and(|g| g.is_checked_in(match_day, tier, user_id.get()))
    }

    /// Record a check-in; `false` if the user was already on the list
    pub async fn check_in(
        &self,
        guild_id: GuildId,
        match_day: &str,
        tier: &str,
        user_id: UserId,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let added = state
            .guild_mut(&guild_id.to_string())
            .check_in(match_day, tier, user_id.get());
        if added {
            state.save(&self.state_path).await?;
            info!(
                "User {} checked in for match day {} tier {} in guild {}",
                user_id, match_day, tier, guild_id
            );
        }
        Ok(added)
    }

    /// Record a check-out; `false` if the user was not on the list
    pub async fn check_out(
        &self,
        guild_id: GuildId,
        match_day: &str,
        tier: &str,
        user_id: UserId,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let removed = state
            .guild_mut(&guild_id.to_string())
            .check_out(match_day, tier, user_id.get());
        if removed {
            state.save(&self.state_path).await?;
            info!(
                "User {} checked out of match day {} tier {} in guild {}",
                user_id, match_day, tier, guild_id
            );
        }
        Ok(removed)
    }

    /// Reset one tier's list for a match day
    pub async fn clear_tier(&self, guild_id: GuildId, match_day: &str, tier: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .guild_mut(&guild_id.to_string())
            .clear_tier(match_day, tier);
        state.save(&self.state_path).await?;
        info!(
            "Cleared availability for match day {} tier {} in guild {}",
            match_day, tier, guild_id
        );
        Ok(())
    }

    /// Reset a whole match day
    pub async fn clear_day(&self, guild_id: GuildId, match_day: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.guild_mut(&guild_id.to_string()).clear_day(match_day);
        state.save(&self.state_path).await?;
        info!(
            "Cleared availability for match day {} in guild {}",
            match_day, guild_id
        );
        Ok(())
    }

    /// Reset the guild's entire store
    pub async fn clear_all(&self, guild_id: GuildId) -> Result<()> {
        let mut state = self.state.write().await;
        state.guild_mut(&guild_id.to_string()).clear_all();
        state.save(&self.state_path).await?;
        info!("Cleared all availability in guild {}", guild_id);
        Ok(())
    }

    /// Claim the user's dialog slot; `false` if one is already in flight
    pub fn begin_dialog(&self, user_id: UserId, match_day: &str, tier: &str) -> bool {
        if self.pending.contains_key(&user_id) {
            return false;
        }
        self.pending.insert(
            user_id,
            PendingDialog {
                user_id,
                match_day: match_day.to_string(),
                tier: tier.to_string(),
                started_at: current_timestamp(),
            },
        );
        debug!("Started confirmation dialog for user {}", user_id);
        true
    }

    /// Release the user's dialog slot
    pub fn end_dialog(&self, user_id: UserId) {
        self.pending.remove(&user_id);
        debug!("Ended confirmation dialog for user {}", user_id);
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Shared availability manager type
pub type SharedAvailabilityManager = Arc<tokio::sync::RwLock<AvailabilityManager>>;

pub fn create_shared_availability_manager(
    state: SharedAvailabilityState,
    state_path: String,
) -> SharedAvailabilityManager {
    Arc::new(tokio::sync::RwLock::new(AvailabilityManager::new(
        state, state_path,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_shared_availability_state, AvailabilityState};

    fn manager() -> AvailabilityManager {
        AvailabilityManager::new(
            create_shared_availability_state(AvailabilityState::new()),
            "unused".to_string(),
        )
    }

    #[test]
    fn test_one_dialog_per_user() {
        let manager = manager();
        let user = UserId::new(42);

        assert!(manager.begin_dialog(user, "1", "Elite"));
        assert!(!manager.begin_dialog(user, "1", "Elite"));

        manager.end_dialog(user);
        assert!(manager.begin_dialog(user, "2", "Challenger"));
    }

    #[test]
    fn test_dialogs_are_independent_across_users() {
        let manager = manager();
        assert!(manager.begin_dialog(UserId::new(1), "1", "Elite"));
        assert!(manager.begin_dialog(UserId::new(2), "1", "Elite"));
    }
}
