//! First-touch / last-touch attribution over a trailing window
//!
//! For every user with an activation session at time `T`:
//! 1. Window `W` = the user's sessions with timestamps in `[T - window, T]`
//! 2. If `W` holds any marketing-tagged session, only those are candidates
//! 3. Otherwise every session in `W` is a candidate (organic journey)
//! 4. First touch = earliest candidate, last touch = latest candidate
//!
//! Candidates are ordered by timestamp with a stable sort, so sessions that
//! share a timestamp keep their input order.

use std::collections::BTreeMap;

use chrono::Duration;

use crate::config::AttributionConfig;
use crate::error::TouchpointError;
use crate::models::{AttributionResult, Session, Touch};
use crate::referrer::{parse_referrer, TouchSource};

// ============================================================================
// PUBLIC API
// ============================================================================

/// Resolve one `AttributionResult` per activated user.
///
/// Results are ordered by `user_id`. Users without an activation session are
/// skipped; a user with more than one activation session is rejected.
pub fn resolve_attribution(
    sessions: &[Session],
    config: &AttributionConfig,
) -> Result<Vec<AttributionResult>, TouchpointError> {
    config.validate()?;
    let window = config.window();
    let by_user = partition_by_user(sessions);
    let mut results = Vec::new();

    for (user_id, user_sessions) in &by_user {
        let activation = match find_activation(user_id, user_sessions)? {
            Some(a) => a,
            None => continue,
        };
        let result = resolve_user(user_id, activation, user_sessions.iter().copied(), window)?;
        results.push(result);
    }

    let marketing = results.iter().filter(|r| !r.first_touch.is_organic()).count();
    tracing::info!(
        "Attribution resolved: {} activated users ({} marketing, {} organic) from {} sessions across {} users",
        results.len(),
        marketing,
        results.len() - marketing,
        sessions.len(),
        by_user.len()
    );

    Ok(results)
}

/// Resolve first/last touch for a single user given their activation session.
///
/// `sessions` are the user's candidate sessions; the activation session is
/// normally among them. Fails with `InvalidInput` when a session belongs to a
/// different user or when no session falls inside the window.
pub fn resolve_user<'a, I>(
    user_id: &str,
    activation: &Session,
    sessions: I,
    window: Duration,
) -> Result<AttributionResult, TouchpointError>
where
    I: IntoIterator<Item = &'a Session>,
{
    let activation_time = activation.timestamp;
    let window_start = activation_time.checked_sub_signed(window).ok_or_else(|| {
        TouchpointError::invalid_input(
            user_id,
            format!(
                "window of {} days before {} is out of range",
                window.num_days(),
                activation_time.to_rfc3339()
            ),
        )
    })?;

    let mut in_window: Vec<(&Session, TouchSource)> = Vec::new();
    for session in sessions {
        if session.user_id != user_id {
            return Err(TouchpointError::invalid_input(
                user_id,
                format!(
                    "session {} belongs to user {}",
                    session.session_id, session.user_id
                ),
            ));
        }
        if session.timestamp >= window_start && session.timestamp <= activation_time {
            in_window.push((session, parse_referrer(&session.referrer)));
        }
    }

    let window_sessions = in_window.len();
    let marketing_sessions = in_window.iter().filter(|(_, t)| !t.is_organic()).count();

    let mut candidates: Vec<&(&Session, TouchSource)> = if marketing_sessions > 0 {
        in_window.iter().filter(|(_, t)| !t.is_organic()).collect()
    } else {
        in_window.iter().collect()
    };
    candidates.sort_by_key(|(s, _)| s.timestamp);

    let (first, last) = match (candidates.first(), candidates.last()) {
        (Some(first), Some(last)) => (to_touch(first), to_touch(last)),
        _ => {
            return Err(TouchpointError::invalid_input(
                user_id,
                format!(
                    "no sessions within {} days before activation at {}",
                    window.num_days(),
                    activation_time.to_rfc3339()
                ),
            ))
        }
    };

    tracing::debug!(
        user_id,
        first_touch = %first.source,
        last_touch = %last.source,
        window_sessions,
        marketing_sessions,
        "Resolved user attribution"
    );

    Ok(AttributionResult {
        user_id: user_id.to_string(),
        activation_session_id: activation.session_id.clone(),
        activation_time,
        first_touch: first,
        last_touch: last,
        window_sessions,
        marketing_sessions,
    })
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

/// Group sessions by user, keeping input order within each user.
fn partition_by_user(sessions: &[Session]) -> BTreeMap<&str, Vec<&Session>> {
    let mut by_user: BTreeMap<&str, Vec<&Session>> = BTreeMap::new();
    for session in sessions {
        by_user.entry(session.user_id.as_str()).or_default().push(session);
    }
    by_user
}

fn find_activation<'a>(
    user_id: &str,
    sessions: &[&'a Session],
) -> Result<Option<&'a Session>, TouchpointError> {
    let mut activations = sessions.iter().filter(|s| s.activated);
    let first = activations.next().copied();
    let extra = activations.count();
    if extra > 0 {
        return Err(TouchpointError::invalid_input(
            user_id,
            format!("{} activation sessions, expected at most one", extra + 1),
        ));
    }
    Ok(first)
}

fn to_touch((session, tags): &(&Session, TouchSource)) -> Touch {
    Touch {
        session_id: session.session_id.clone(),
        source: tags.source.clone(),
        campaign_id: tags.campaign_id.clone(),
        adset_id: tags.adset_id.clone(),
        ad_id: tags.ad_id.clone(),
        timestamp: session.timestamp,
    }
}

// ============================================================================
// TESTS
// ============================================================================
