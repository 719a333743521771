//! Synthetic sessions and campaign spend
//!
//! Produces demo data for the attribution and CPA pipelines. All randomness
//! comes from the caller's RNG and all timestamps are relative to the
//! caller's `now`, so a seeded `StdRng` and a fixed instant reproduce the
//! same dataset.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GeneratorConfig;
use crate::error::TouchpointError;
use crate::models::{CampaignSpend, Session};

pub const SOURCES: [&str; 4] = ["google", "facebook", "linkedin", "twitter"];
pub const CAMPAIGNS: [&str; 4] = ["brand_awareness", "lead_gen", "retargeting", "conversion"];
pub const DEVICES: [&str; 3] = ["mobile", "desktop", "tablet"];

const MIN_DAILY_SPEND: f64 = 50.0;
const MAX_DAILY_SPEND: f64 = 550.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticData {
    pub sessions: Vec<Session>,
    pub campaign_spend: Vec<CampaignSpend>,
}

/// Generate sessions and the matching spend table.
pub fn generate<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SyntheticData, TouchpointError> {
    let sessions = generate_sessions(config, now, rng)?;
    let campaign_spend = generate_campaign_spend(config, now.date_naive(), rng)?;

    tracing::info!(
        sessions = sessions.len(),
        activations = sessions.iter().filter(|s| s.activated).count(),
        spend_rows = campaign_spend.len(),
        "Generated synthetic dataset"
    );

    Ok(SyntheticData {
        sessions,
        campaign_spend,
    })
}

/// Generate `session_count` sessions spread over the last `history_days`.
///
/// Each user activates at most once.
pub fn generate_sessions<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<Session>, TouchpointError> {
    config.validate()?;
    let landing = landing_url(config)?;
    let history_ms = Duration::days(i64::from(config.history_days)).num_milliseconds();

    let mut activated_users: HashSet<String> = HashSet::new();
    let mut sessions = Vec::with_capacity(config.session_count);

    for i in 0..config.session_count {
        let user_id = format!("user_{:04}", rng.gen_range(0..config.user_count));
        let device = DEVICES[rng.gen_range(0..DEVICES.len())];
        let offset_ms = rng.gen_range(0..=history_ms);
        let timestamp = now - Duration::milliseconds(offset_ms);

        let referrer = if rng.gen_bool(config.marketing_rate) {
            marketing_referrer(&landing, config, rng)
        } else {
            landing.to_string()
        };

        let wants_activation = rng.gen_bool(config.activation_rate);
        let activated = wants_activation && activated_users.insert(user_id.clone());

        sessions.push(Session {
            session_id: format!("sess_{:06}", i),
            user_id,
            timestamp,
            referrer,
            activated,
            device_type: Some(device.to_string()),
        });
    }

    Ok(sessions)
}

/// Generate one spend row per source × campaign × adset × day.
pub fn generate_campaign_spend<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    today: NaiveDate,
    rng: &mut R,
) -> Result<Vec<CampaignSpend>, TouchpointError> {
    config.validate()?;
    let mut rows = Vec::new();

    for source in SOURCES {
        for campaign in CAMPAIGNS {
            let campaign_name = format!("{} Campaign", title_case(campaign));
            for adset in 0..config.adsets_per_campaign {
                for day in 0..config.history_days {
                    let ad = rng.gen_range(0..config.ads_per_adset);
                    let spend = rng.gen_range(MIN_DAILY_SPEND..MAX_DAILY_SPEND);
                    rows.push(CampaignSpend {
                        date: today - Duration::days(i64::from(day)),
                        source: source.to_string(),
                        campaign_id: campaign.to_string(),
                        campaign_name: campaign_name.clone(),
                        adset_id: format!("adset_{}", adset),
                        adset_name: format!("AdSet {}", adset + 1),
                        ad_id: format!("ad_{}_{}", adset, ad),
                        ad_name: format!("Ad {}-{}", adset + 1, ad),
                        spend: (spend * 100.0).round() / 100.0,
                    });
                }
            }
        }
    }

    Ok(rows)
}

fn landing_url(config: &GeneratorConfig) -> Result<Url, TouchpointError> {
    Url::parse(&config.landing_url).map_err(|e| {
        TouchpointError::InvalidConfig(format!(
            "generator.landing_url {:?} is not a valid URL: {}",
            config.landing_url, e
        ))
    })
}

fn marketing_referrer<R: Rng + ?Sized>(landing: &Url, config: &GeneratorConfig, rng: &mut R) -> String {
    let source = SOURCES[rng.gen_range(0..SOURCES.len())];
    let campaign = CAMPAIGNS[rng.gen_range(0..CAMPAIGNS.len())];
    let adset = rng.gen_range(0..config.adsets_per_campaign);
    let ad = rng.gen_range(0..config.ads_per_adset);

    let mut url = landing.clone();
    url.query_pairs_mut()
        .append_pair("utm_source", source)
        .append_pair("utm_campaign", campaign)
        .append_pair("utm_adset", &format!("adset_{}", adset))
        .append_pair("utm_ad", &format!("ad_{}_{}", adset, ad));
    url.to_string()
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referrer::parse_referrer;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            session_count: 200,
            user_count: 40,
            history_days: 10,
            adsets_per_campaign: 2,
            ads_per_adset: 3,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let config = small_config();
        let a = generate(&config, fixed_now(), &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate(&config, fixed_now(), &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(a.sessions, b.sessions);
        assert_eq!(a.campaign_spend, b.campaign_spend);
    }

    #[test]
    fn test_different_seed_different_data() {
        let config = small_config();
        let a = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(1)).unwrap();
        let b = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(2)).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_at_most_one_activation_per_user() {
        let config = GeneratorConfig {
            activation_rate: 0.5,
            ..small_config()
        };
        let sessions = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(3)).unwrap();

        let mut seen = HashSet::new();
        for s in sessions.iter().filter(|s| s.activated) {
            assert!(seen.insert(s.user_id.clone()), "user {} activated twice", s.user_id);
        }
        assert!(!seen.is_empty());
    }

    #[test]
    fn test_full_activation_rate_activates_every_user_once() {
        let config = GeneratorConfig {
            activation_rate: 1.0,
            ..small_config()
        };
        let sessions = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(4)).unwrap();

        let users: HashSet<&str> = sessions.iter().map(|s| s.user_id.as_str()).collect();
        let activations = sessions.iter().filter(|s| s.activated).count();
        assert_eq!(users.len(), activations);
    }

    #[test]
    fn test_sessions_within_history_and_ids_formatted() {
        let config = small_config();
        let now = fixed_now();
        let sessions = generate_sessions(&config, now, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(sessions.len(), 200);
        assert_eq!(sessions[0].session_id, "sess_000000");
        for s in &sessions {
            assert!(s.timestamp <= now);
            assert!(s.timestamp >= now - Duration::days(10));
            assert!(s.user_id.starts_with("user_") && s.user_id.len() == 9);
        }
    }

    #[test]
    fn test_marketing_referrers_round_trip_through_parser() {
        let config = GeneratorConfig {
            marketing_rate: 1.0,
            ..small_config()
        };
        let sessions = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(6)).unwrap();

        for s in &sessions {
            let tags = parse_referrer(&s.referrer);
            assert!(SOURCES.contains(&tags.source.as_str()));
            assert!(CAMPAIGNS.contains(&tags.campaign_id.as_deref().unwrap()));
            let adset = tags.adset_id.unwrap();
            assert!(tags.ad_id.unwrap().starts_with(&adset.replace("adset", "ad")));
        }
    }

    #[test]
    fn test_zero_marketing_rate_all_organic() {
        let config = GeneratorConfig {
            marketing_rate: 0.0,
            ..small_config()
        };
        let sessions = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(8)).unwrap();

        assert!(sessions.iter().all(|s| parse_referrer(&s.referrer).is_organic()));
    }

    #[test]
    fn test_spend_table_shape() {
        let config = small_config();
        let today = fixed_now().date_naive();
        let rows = generate_campaign_spend(&config, today, &mut StdRng::seed_from_u64(9)).unwrap();

        // 4 sources × 4 campaigns × 2 adsets × 10 days
        assert_eq!(rows.len(), 320);
        assert!(rows.iter().all(|r| r.spend >= MIN_DAILY_SPEND && r.spend <= MAX_DAILY_SPEND));
        assert!(rows.iter().all(|r| r.date <= today && r.date > today - Duration::days(10)));
        assert_eq!(rows[0].campaign_name, "Brand Awareness Campaign");
        assert_eq!(rows[0].adset_name, "AdSet 1");
    }

    #[test]
    fn test_invalid_landing_url_rejected() {
        let config = GeneratorConfig {
            landing_url: "not a url".to_string(),
            ..small_config()
        };
        let err = generate_sessions(&config, fixed_now(), &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, TouchpointError::InvalidConfig(_)));
    }

    #[test]
    fn test_unbounded_history_rejected_before_generating() {
        let config = GeneratorConfig {
            session_count: 50,
            history_days: 200_000_000,
            ..small_config()
        };

        let err = generate(&config, fixed_now(), &mut StdRng::seed_from_u64(10)).unwrap_err();
        assert!(matches!(err, TouchpointError::InvalidConfig(_)));

        let today = fixed_now().date_naive();
        let err = generate_campaign_spend(&config, today, &mut StdRng::seed_from_u64(10)).unwrap_err();
        assert!(err.to_string().contains("history_days"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("lead_gen"), "Lead Gen");
        assert_eq!(title_case("conversion"), "Conversion");
    }
}
