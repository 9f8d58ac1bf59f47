//! Sports mirror records
//!
//! Rows of the sports mirror tables and the mapping from live-score feed
//! items onto `sport_events` upserts.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Formats a timestamp the way every timestamp column is stored.
///
/// Fixed-width RFC 3339 in UTC so that string comparison orders by time.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// == Event Status ==
/// Lifecycle state of a sport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Live,
    Halftime,
    Finished,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Live => "live",
            EventStatus::Halftime => "halftime",
            EventStatus::Finished => "finished",
        }
    }

    /// Parses a stored status column, unknown values read as upcoming.
    pub fn from_column(value: &str) -> Self {
        match value {
            "live" => EventStatus::Live,
            "halftime" => EventStatus::Halftime,
            "finished" => EventStatus::Finished,
            _ => EventStatus::Upcoming,
        }
    }

    /// Derives the status from a feed item's `strStatus` / `strProgress`.
    pub fn from_feed(status: Option<&str>, progress: Option<&str>) -> Self {
        match status {
            Some("Match Finished") => EventStatus::Finished,
            Some("Halftime") => EventStatus::Halftime,
            _ if progress.is_some_and(|p| !p.is_empty()) => EventStatus::Live,
            _ => EventStatus::Upcoming,
        }
    }
}

/// League row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub sport_type: String,
    pub country: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

/// Streaming provider row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingProvider {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub available_regions: Vec<String>,
    pub is_active: bool,
}

/// Broadcasting right joined with its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingOption {
    pub id: String,
    pub event_id: String,
    pub provider_id: String,
    /// `None` means available everywhere
    pub available_regions: Option<Vec<String>>,
    pub stream_url: Option<String>,
    pub is_active: bool,
    pub provider: Option<StreamingProvider>,
}

/// Sport event with its league and streaming options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportEvent {
    pub id: String,
    pub external_api_id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_team_logo: Option<String>,
    pub away_team_logo: Option<String>,
    pub sport_type: String,
    pub league_id: Option<String>,
    pub start_time: Option<String>,
    pub status: EventStatus,
    pub home_score: i64,
    pub away_score: i64,
    pub period: Option<String>,
    pub time_in_period: Option<String>,
    pub venue: Option<String>,
    pub region: Option<String>,
    pub last_synced_at: Option<String>,
    pub updated_at: Option<String>,
    pub league: Option<League>,
    pub streaming_options: Vec<StreamingOption>,
}

// == Event Upsert ==
/// Columns written when mirroring an external event, keyed by `external_api_id`.
///
/// `None` columns keep whatever the row already holds.
#[derive(Debug, Clone, PartialEq)]
pub struct EventUpsert {
    pub external_api_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_logo: Option<String>,
    pub away_team_logo: Option<String>,
    pub sport_type: Option<String>,
    pub start_time: Option<String>,
    pub status: EventStatus,
    pub home_score: i64,
    pub away_score: i64,
    pub period: Option<String>,
    pub time_in_period: Option<String>,
    pub venue: Option<String>,
    pub synced_at: String,
}

impl EventUpsert {
    /// Maps a live-score feed item onto an upsert.
    ///
    /// Accepts both TheSportsDB field names (`idEvent`, `strHomeTeam`, ...)
    /// and already-normalised names (`id`, `home_team`, ...). Returns `None`
    /// when the item carries no external id or no team names.
    pub fn from_feed(item: &Value, now: DateTime<Utc>) -> Option<Self> {
        let external_api_id = text(item, &["idEvent", "id"])?;
        let home_team = text(item, &["strHomeTeam", "home_team"])?;
        let away_team = text(item, &["strAwayTeam", "away_team"])?;

        let progress = text(item, &["strProgress"]);
        let status = match text(item, &["status"]).as_deref() {
            Some(explicit @ ("upcoming" | "live" | "halftime" | "finished")) => {
                EventStatus::from_column(explicit)
            }
            _ => EventStatus::from_feed(
                text(item, &["strStatus"]).as_deref(),
                progress.as_deref(),
            ),
        };

        let start_time = text(item, &["strTimestamp", "start_time"])
            .or_else(|| text(item, &["dateEvent"]))
            .map(|raw| normalize_start_time(&raw));

        Some(Self {
            external_api_id,
            home_team,
            away_team,
            home_team_logo: text(item, &["strHomeTeamBadge", "home_team_logo"]),
            away_team_logo: text(item, &["strAwayTeamBadge", "away_team_logo"]),
            sport_type: text(item, &["strSport", "sport_type"]).map(|s| s.to_lowercase()),
            start_time,
            status,
            home_score: score(item, &["intHomeScore", "home_score"]),
            away_score: score(item, &["intAwayScore", "away_score"]),
            period: progress.clone(),
            time_in_period: progress,
            venue: text(item, &["strVenue", "venue"]),
            synced_at: timestamp(now),
        })
    }
}

/// First non-empty string (or number rendered as string) under any of `keys`.
fn text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn score(item: &Value, keys: &[&str]) -> i64 {
    text(item, keys)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Brings feed start times into the stored timestamp format when parseable.
fn normalize_start_time(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return timestamp(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return timestamp(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return timestamp(midnight.and_utc());
        }
    }
    raw.to_string()
}
