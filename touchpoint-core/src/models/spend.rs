use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the ad-platform spend table (one ad, one day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpend {
    pub date: NaiveDate,
    pub source: String,
    pub campaign_id: String,
    #[serde(default)]
    pub campaign_name: String,
    pub adset_id: String,
    #[serde(default)]
    pub adset_name: String,
    pub ad_id: String,
    #[serde(default)]
    pub ad_name: String,
    pub spend: f64,
}

/// Aggregated cost per activation for one granularity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpaRow {
    pub key: String,
    pub spend: f64,
    pub activations: u64,
    pub cost_per_activation: Option<f64>,
}
