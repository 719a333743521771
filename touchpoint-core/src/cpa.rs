//! Cost per activation
//!
//! CPA(key) = Σ spend(key) / activations credited to key
//!
//! Activations are credited through one touch of each attribution result
//! (last touch by default). Organic touches carry no spend and are never
//! credited. Keys depend on the granularity:
//!   Daily    → `YYYY-MM-DD` (activation date / spend date, UTC)
//!   Source   → `source`
//!   Campaign → `source/campaign`
//!   Ad       → `source/campaign/adset/ad`

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{AttributionResult, CampaignSpend, CpaRow, Touch};

/// Placeholder for a missing identifier inside a key.
const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Daily,
    Campaign,
    Source,
    Ad,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "campaign" => Ok(Self::Campaign),
            "source" => Ok(Self::Source),
            "ad" => Ok(Self::Ad),
            other => Err(format!(
                "unknown granularity '{}' (expected daily, campaign, source or ad)",
                other
            )),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Daily => "daily",
            Self::Campaign => "campaign",
            Self::Source => "source",
            Self::Ad => "ad",
        };
        f.write_str(name)
    }
}

/// Which touch of an attribution result receives the activation credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchModel {
    FirstTouch,
    #[default]
    LastTouch,
}

impl FromStr for TouchModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first_touch" | "first-touch" => Ok(Self::FirstTouch),
            "last" | "last_touch" | "last-touch" => Ok(Self::LastTouch),
            other => Err(format!("unknown touch model '{}' (expected first or last)", other)),
        }
    }
}

impl TouchModel {
    fn pick<'a>(&self, result: &'a AttributionResult) -> &'a Touch {
        match self {
            Self::FirstTouch => &result.first_touch,
            Self::LastTouch => &result.last_touch,
        }
    }
}

/// Totals across every row of a CPA breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpaSummary {
    pub total_spend: f64,
    pub total_activations: u64,
    pub cost_per_activation: Option<f64>,
}

#[derive(Debug, Default)]
struct Bucket {
    spend: f64,
    activations: u64,
}

/// Aggregate spend and credited activations per key, ordered by key.
pub fn compute_cpa(
    spend: &[CampaignSpend],
    results: &[AttributionResult],
    granularity: Granularity,
    model: TouchModel,
) -> Vec<CpaRow> {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for row in spend {
        buckets.entry(spend_key(row, granularity)).or_default().spend += row.spend;
    }

    let mut uncredited = 0usize;
    for result in results {
        let touch = model.pick(result);
        if touch.is_organic() {
            uncredited += 1;
            continue;
        }
        buckets
            .entry(touch_key(result, touch, granularity))
            .or_default()
            .activations += 1;
    }

    tracing::debug!(
        %granularity,
        keys = buckets.len(),
        uncredited,
        "Aggregated cost per activation"
    );

    buckets
        .into_iter()
        .map(|(key, bucket)| CpaRow {
            key,
            spend: bucket.spend,
            activations: bucket.activations,
            cost_per_activation: ratio(bucket.spend, bucket.activations),
        })
        .collect()
}

pub fn summarize(rows: &[CpaRow]) -> CpaSummary {
    let total_spend: f64 = rows.iter().map(|r| r.spend).sum();
    let total_activations: u64 = rows.iter().map(|r| r.activations).sum();
    CpaSummary {
        total_spend,
        total_activations,
        cost_per_activation: ratio(total_spend, total_activations),
    }
}

fn ratio(spend: f64, activations: u64) -> Option<f64> {
    (activations > 0).then(|| spend / activations as f64)
}

fn spend_key(row: &CampaignSpend, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => row.date.format("%Y-%m-%d").to_string(),
        Granularity::Source => row.source.clone(),
        Granularity::Campaign => format!("{}/{}", row.source, row.campaign_id),
        Granularity::Ad => format!(
            "{}/{}/{}/{}",
            row.source, row.campaign_id, row.adset_id, row.ad_id
        ),
    }
}

fn touch_key(result: &AttributionResult, touch: &Touch, granularity: Granularity) -> String {
    let id = |v: &Option<String>| v.as_deref().unwrap_or(MISSING).to_string();
    match granularity {
        Granularity::Daily => result.activation_time.format("%Y-%m-%d").to_string(),
        Granularity::Source => touch.source.clone(),
        Granularity::Campaign => format!("{}/{}", touch.source, id(&touch.campaign_id)),
        Granularity::Ad => format!(
            "{}/{}/{}/{}",
            touch.source,
            id(&touch.campaign_id),
            id(&touch.adset_id),
            id(&touch.ad_id)
        ),
    }
}
