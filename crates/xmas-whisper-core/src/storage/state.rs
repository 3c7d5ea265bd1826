//! Typed access to the persisted calendar records.
//!
//! Each record lives under its own key so the profile, the card history and
//! the notification bookkeeping have independent lifecycles. Reads never fail
//! the caller: missing or corrupt values degrade to defaults and are logged.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::KvStore;
use crate::content::CardHistory;
use crate::error::StorageError;
use crate::notify::Permission;

pub const USER_DESCRIPTION_KEY: &str = "user_description";
pub const CARD_HISTORY_KEY: &str = "card_history";
pub const LAST_NOTIFICATION_KEY: &str = "last_notification_date";
pub const NOTIFICATION_PERMISSION_KEY: &str = "notification_permission";

/// The free-text self description collected at onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub description: String,
}

impl UserProfile {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Onboarding is complete once a non-blank description exists.
    pub fn is_onboarded(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Handle over the key-value backend; cheap to clone.
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn KvStore>,
}

impl StateStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn load_profile(&self) -> UserProfile {
        match self.kv.get(USER_DESCRIPTION_KEY) {
            Ok(Some(description)) => UserProfile { description },
            Ok(None) => UserProfile::default(),
            Err(e) => {
                warn!(error = %e, "failed to read user profile, treating as empty");
                UserProfile::default()
            }
        }
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.kv.set(USER_DESCRIPTION_KEY, &profile.description)
    }

    /// Reset leaves the card history untouched.
    pub fn clear_profile(&self) -> Result<(), StorageError> {
        self.kv.remove(USER_DESCRIPTION_KEY)
    }

    pub fn load_history(&self) -> CardHistory {
        let raw = match self.kv.get(CARD_HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CardHistory::default(),
            Err(e) => {
                warn!(error = %e, "failed to read card history, starting empty");
                return CardHistory::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "failed to parse card history, starting empty");
                CardHistory::default()
            }
        }
    }

    pub fn save_history(&self, history: &CardHistory) -> Result<(), StorageError> {
        let json = serde_json::to_string(history)
            .map_err(|e| StorageError::QueryFailed(format!("serialize card history: {e}")))?;
        self.kv.set(CARD_HISTORY_KEY, &json)
    }

    pub fn clear_history(&self) -> Result<(), StorageError> {
        self.kv.remove(CARD_HISTORY_KEY)
    }

    pub fn last_notified(&self) -> Option<String> {
        match self.kv.get(LAST_NOTIFICATION_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to read last notification date");
                None
            }
        }
    }

    pub fn set_last_notified(&self, date_key: &str) -> Result<(), StorageError> {
        self.kv.set(LAST_NOTIFICATION_KEY, date_key)
    }

    pub fn permission(&self) -> Permission {
        match self.kv.get(NOTIFICATION_PERMISSION_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Permission::Default,
            Err(e) => {
                warn!(error = %e, "failed to read notification permission");
                Permission::Default
            }
        }
    }

    pub fn set_permission(&self, permission: Permission) -> Result<(), StorageError> {
        self.kv.set(NOTIFICATION_PERMISSION_KEY, permission.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CardContent;
    use crate::storage::MemoryStore;

    fn store() -> (Arc<MemoryStore>, StateStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), StateStore::new(kv))
    }

    #[test]
    fn profile_reset_keeps_history() {
        let (_, state) = store();
        state.save_profile(&UserProfile::new("tired engineer")).unwrap();
        let mut history = CardHistory::default();
        history.insert(1, CardContent::fallback());
        state.save_history(&history).unwrap();

        state.clear_profile().unwrap();
        assert!(!state.load_profile().is_onboarded());
        assert_eq!(state.load_history(), history);
    }

    #[test]
    fn corrupt_history_loads_empty() {
        let (kv, state) = store();
        kv.set(CARD_HISTORY_KEY, "{not json").unwrap();
        assert!(state.load_history().is_empty());
    }

    #[test]
    fn permission_defaults_and_round_trips() {
        let (kv, state) = store();
        assert_eq!(state.permission(), Permission::Default);
        state.set_permission(Permission::Granted).unwrap();
        assert_eq!(state.permission(), Permission::Granted);
        kv.set(NOTIFICATION_PERMISSION_KEY, "bogus").unwrap();
        assert_eq!(state.permission(), Permission::Default);
    }

    #[test]
    fn blank_profile_is_not_onboarded() {
        assert!(!UserProfile::new("   ").is_onboarded());
        assert!(UserProfile::new("student").is_onboarded());
    }
}
