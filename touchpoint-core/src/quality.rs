//! Data-quality checks over a session set, its spend table and its
//! attribution output

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{AttributionResult, CampaignSpend, Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub sessions: usize,
    pub activations: usize,
    pub spend_rows: usize,
    /// Distinct `campaign_id` values in the spend table.
    pub campaigns: usize,
    pub attributions: usize,
    pub marketing_attributions: usize,
    /// Every activation produced exactly one attribution row.
    pub consistent: bool,
}

pub fn check_quality(
    sessions: &[Session],
    spend: &[CampaignSpend],
    results: &[AttributionResult],
) -> QualityReport {
    let activations = sessions.iter().filter(|s| s.activated).count();
    let campaigns = spend
        .iter()
        .map(|row| row.campaign_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let marketing_attributions = results
        .iter()
        .filter(|r| !r.first_touch.is_organic())
        .count();
    let consistent = activations == results.len();

    if !consistent {
        tracing::warn!(
            "Data correlation issue: {} activations vs {} attributions",
            activations,
            results.len()
        );
    }

    QualityReport {
        sessions: sessions.len(),
        activations,
        spend_rows: spend.len(),
        campaigns,
        attributions: results.len(),
        marketing_attributions,
        consistent,
    }
}
