//! Cached gamification and statistics data from the session API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Last known profile, badges and statistics.
///
/// Fields are opaque JSON passed through from the session API; `None` means
/// the data was never fetched successfully.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSummary {
    pub profile: Option<Value>,
    pub badges: Option<Value>,
    pub statistics: Option<Value>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl RemoteSummary {
    /// Take every field `newer` carries; keep ours where it has nothing
    pub fn merge(&mut self, newer: RemoteSummary) {
        if newer.profile.is_some() {
            self.profile = newer.profile;
        }
        if newer.badges.is_some() {
            self.badges = newer.badges;
        }
        if newer.statistics.is_some() {
            self.statistics = newer.statistics;
        }
        if newer.refreshed_at.is_some() {
            self.refreshed_at = newer.refreshed_at;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.badges.is_none() && self.statistics.is_none()
    }
}
