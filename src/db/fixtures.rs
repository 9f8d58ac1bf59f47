//! Row builders shared by unit tests.

use crate::models::records::{EventStatus, League, SportEvent, StreamingProvider};

pub(crate) fn sample_event(id: &str, status: EventStatus, start_time: &str) -> SportEvent {
    SportEvent {
        id: id.to_string(),
        external_api_id: Some(format!("ext-{}", id)),
        home_team: format!("Home {}", id),
        away_team: format!("Away {}", id),
        home_team_logo: None,
        away_team_logo: None,
        sport_type: "football".to_string(),
        league_id: None,
        start_time: Some(start_time.to_string()),
        status,
        home_score: 0,
        away_score: 0,
        period: None,
        time_in_period: None,
        venue: None,
        region: None,
        last_synced_at: None,
        updated_at: None,
        league: None,
        streaming_options: Vec::new(),
    }
}

pub(crate) fn sample_league(id: &str, name: &str, sport_type: &str, is_active: bool) -> League {
    League {
        id: id.to_string(),
        name: name.to_string(),
        sport_type: sport_type.to_string(),
        country: None,
        logo_url: None,
        is_active,
    }
}

pub(crate) fn sample_provider(id: &str, name: &str, regions: &[&str]) -> StreamingProvider {
    StreamingProvider {
        id: id.to_string(),
        name: name.to_string(),
        logo_url: None,
        website_url: None,
        available_regions: regions.iter().map(|r| r.to_string()).collect(),
        is_active: true,
    }
}
