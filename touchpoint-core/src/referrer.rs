//! Referrer classification
//!
//! Reads the UTM tags off a session's referrer URL and decides whether the
//! session is a marketing touch or organic traffic:
//! - `utm_source` present and non-blank → marketing, tagged with that source
//! - `utm_source` absent, blank, or literally `organic` → organic
//! - unparseable referrers → organic (never an error)
//!
//! Only the first occurrence of each parameter is considered.

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

/// Source label for sessions without marketing tags.
pub const ORGANIC_SOURCE: &str = "organic";

/// Base used to resolve relative referrers such as `/landing?utm_source=x`.
const RELATIVE_BASE: &str = "https://referrer.invalid/";

/// Marketing tags extracted from a referrer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchSource {
    pub source: String,
    pub campaign_id: Option<String>,
    pub adset_id: Option<String>,
    pub ad_id: Option<String>,
}

impl TouchSource {
    pub fn organic() -> Self {
        Self {
            source: ORGANIC_SOURCE.to_string(),
            campaign_id: None,
            adset_id: None,
            ad_id: None,
        }
    }

    pub fn is_organic(&self) -> bool {
        self.source == ORGANIC_SOURCE
    }
}

/// Classify a referrer URL.
pub fn parse_referrer(referrer: &str) -> TouchSource {
    let trimmed = referrer.trim();
    if trimmed.is_empty() {
        return TouchSource::organic();
    }

    let url = match parse_url(trimmed) {
        Some(url) => url,
        None => {
            tracing::debug!(referrer = trimmed, "Unparseable referrer, treating as organic");
            return TouchSource::organic();
        }
    };

    let mut source = None;
    let mut campaign_id = None;
    let mut adset_id = None;
    let mut ad_id = None;

    for (key, value) in url.query_pairs() {
        let slot = match &*key {
            "utm_source" => &mut source,
            "utm_campaign" => &mut campaign_id,
            "utm_adset" => &mut adset_id,
            "utm_ad" => &mut ad_id,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    let source = match source.as_deref().and_then(non_blank) {
        Some(s) if !s.eq_ignore_ascii_case(ORGANIC_SOURCE) => s.to_string(),
        _ => return TouchSource::organic(),
    };

    TouchSource {
        source,
        campaign_id: campaign_id.as_deref().and_then(non_blank).map(str::to_string),
        adset_id: adset_id.as_deref().and_then(non_blank).map(str::to_string),
        ad_id: ad_id.as_deref().and_then(non_blank).map(str::to_string),
    }
}

fn parse_url(input: &str) -> Option<Url> {
    match Url::parse(input) {
        Ok(url) => Some(url),
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).ok()?.join(input).ok()
        }
        Err(_) => None,
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
