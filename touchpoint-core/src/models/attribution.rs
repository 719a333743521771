use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::referrer::ORGANIC_SOURCE;

/// A single credited touch: the session it came from and its marketing tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub session_id: String,
    pub source: String,
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Touch {
    pub fn is_organic(&self) -> bool {
        self.source == ORGANIC_SOURCE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub user_id: String,
    pub activation_session_id: String,
    pub activation_time: DateTime<Utc>,
    pub first_touch: Touch,
    pub last_touch: Touch,
    pub window_sessions: usize,
    pub marketing_sessions: usize,
}
