//! Sport event queries and the live-score upsert.

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::catalog::{league_by_id, streaming_options_for};
use super::Database;
use crate::error::Result;
use crate::models::records::{timestamp, EventStatus, EventUpsert, SportEvent};

const EVENT_COLUMNS: &str = "id, external_api_id, home_team, away_team, home_team_logo, \
     away_team_logo, sport_type, league_id, start_time, status, home_score, away_score, \
     period, time_in_period, venue, region, last_synced_at, updated_at";

// == Event Query ==
/// Filter over `sport_events`, always ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Any of these statuses; empty means no status filter
    pub statuses: Vec<EventStatus>,
    pub sport_type: Option<String>,
    pub league_id: Option<String>,
    /// Events in this region or without a region
    pub region: Option<String>,
    /// Inclusive lower bound on `start_time`
    pub from: Option<String>,
    /// Inclusive upper bound on `start_time`
    pub to: Option<String>,
    /// Case-insensitive substring of either team name
    pub team_search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

impl EventQuery {
    fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<SqlValue> = Vec::new();

        if !self.statuses.is_empty() {
            let placeholders = vec!["?"; self.statuses.len()].join(", ");
            clauses.push(format!("status IN ({})", placeholders));
            args.extend(
                self.statuses
                    .iter()
                    .map(|s| SqlValue::Text(s.as_str().to_string())),
            );
        }
        if let Some(sport_type) = &self.sport_type {
            clauses.push("sport_type = ?".to_string());
            args.push(SqlValue::Text(sport_type.clone()));
        }
        if let Some(league_id) = &self.league_id {
            clauses.push("league_id = ?".to_string());
            args.push(SqlValue::Text(league_id.clone()));
        }
        if let Some(region) = &self.region {
            clauses.push("(region = ? OR region IS NULL)".to_string());
            args.push(SqlValue::Text(region.clone()));
        }
        if let Some(from) = &self.from {
            clauses.push("start_time >= ?".to_string());
            args.push(SqlValue::Text(from.clone()));
        }
        if let Some(to) = &self.to {
            clauses.push("start_time <= ?".to_string());
            args.push(SqlValue::Text(to.clone()));
        }
        if let Some(team) = &self.team_search {
            let pattern = format!("%{}%", escape_like(team));
            clauses.push(
                "(home_team LIKE ? ESCAPE '\\' OR away_team LIKE ? ESCAPE '\\')".to_string(),
            );
            args.push(SqlValue::Text(pattern.clone()));
            args.push(SqlValue::Text(pattern));
        }

        let mut sql = format!("SELECT {} FROM sport_events", EVENT_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY start_time ASC");

        if self.limit.is_some() || self.offset.is_some() {
            // SQLite needs a LIMIT before OFFSET, -1 means unbounded
            sql.push_str(" LIMIT ? OFFSET ?");
            args.push(SqlValue::Integer(self.limit.map(i64::from).unwrap_or(-1)));
            args.push(SqlValue::Integer(
                self.offset
                    .map(|offset| i64::try_from(offset).unwrap_or(i64::MAX))
                    .unwrap_or(0),
            ));
        }

        (sql, args)
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<SportEvent> {
    let status: String = row.get("status")?;
    Ok(SportEvent {
        id: row.get("id")?,
        external_api_id: row.get("external_api_id")?,
        home_team: row.get("home_team")?,
        away_team: row.get("away_team")?,
        home_team_logo: row.get("home_team_logo")?,
        away_team_logo: row.get("away_team_logo")?,
        sport_type: row.get("sport_type")?,
        league_id: row.get("league_id")?,
        start_time: row.get("start_time")?,
        status: EventStatus::from_column(&status),
        home_score: row.get("home_score")?,
        away_score: row.get("away_score")?,
        period: row.get("period")?,
        time_in_period: row.get("time_in_period")?,
        venue: row.get("venue")?,
        region: row.get("region")?,
        last_synced_at: row.get("last_synced_at")?,
        updated_at: row.get("updated_at")?,
        league: None,
        streaming_options: Vec::new(),
    })
}

/// Loads the league and every streaming option of an event.
fn attach_relations(conn: &Connection, event: &mut SportEvent) -> rusqlite::Result<()> {
    if let Some(league_id) = &event.league_id {
        event.league = league_by_id(conn, league_id)?;
    }
    event.streaming_options = streaming_options_for(conn, &event.id, None, false)?;
    Ok(())
}

impl Database {
    // == Find Events ==
    /// Returns events matching `query` with their relations loaded.
    pub fn find_events(&self, query: &EventQuery) -> Result<Vec<SportEvent>> {
        let (sql, args) = query.to_sql();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut events = stmt
                .query_map(params_from_iter(args), event_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for event in &mut events {
                attach_relations(conn, event)?;
            }
            Ok(events)
        })
    }

    // == Event By Id ==
    pub fn event_by_id(&self, id: &str) -> Result<Option<SportEvent>> {
        let sql = format!("SELECT {} FROM sport_events WHERE id = ?1", EVENT_COLUMNS);

        self.with_conn(|conn| {
            let event = conn
                .query_row(&sql, params![id], event_from_row)
                .optional()?;

            match event {
                Some(mut event) => {
                    attach_relations(conn, &mut event)?;
                    Ok(Some(event))
                }
                None => Ok(None),
            }
        })
    }

    // == Insert Event ==
    /// Inserts a fully specified event row (relations are stored separately).
    pub fn insert_event(&self, event: &SportEvent) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sport_events (id, external_api_id, home_team, away_team,
                     home_team_logo, away_team_logo, sport_type, league_id, start_time, status,
                     home_score, away_score, period, time_in_period, venue, region,
                     last_synced_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    event.id,
                    event.external_api_id,
                    event.home_team,
                    event.away_team,
                    event.home_team_logo,
                    event.away_team_logo,
                    event.sport_type,
                    event.league_id,
                    event.start_time,
                    event.status.as_str(),
                    event.home_score,
                    event.away_score,
                    event.period,
                    event.time_in_period,
                    event.venue,
                    event.region,
                    event.last_synced_at,
                    event.updated_at,
                ],
            )
        })?;
        Ok(())
    }

    // == Upsert Event ==
    /// Inserts or updates an event by `external_api_id`.
    ///
    /// Optional columns that the feed left empty keep their stored value.
    pub fn upsert_event(&self, event: &EventUpsert) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sport_events (id, external_api_id, home_team, away_team,
                     home_team_logo, away_team_logo, sport_type, start_time, status,
                     home_score, away_score, period, time_in_period, venue,
                     last_synced_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(?7, 'football'), ?8, ?9, ?10, ?11,
                     ?12, ?13, ?14, ?15, ?15)
                 ON CONFLICT(external_api_id) DO UPDATE SET
                     home_team = excluded.home_team,
                     away_team = excluded.away_team,
                     home_team_logo = COALESCE(excluded.home_team_logo, sport_events.home_team_logo),
                     away_team_logo = COALESCE(excluded.away_team_logo, sport_events.away_team_logo),
                     sport_type = COALESCE(?7, sport_events.sport_type),
                     start_time = COALESCE(excluded.start_time, sport_events.start_time),
                     status = excluded.status,
                     home_score = excluded.home_score,
                     away_score = excluded.away_score,
                     period = excluded.period,
                     time_in_period = excluded.time_in_period,
                     venue = COALESCE(excluded.venue, sport_events.venue),
                     last_synced_at = excluded.last_synced_at,
                     updated_at = excluded.updated_at",
                params![
                    id,
                    event.external_api_id,
                    event.home_team,
                    event.away_team,
                    event.home_team_logo,
                    event.away_team_logo,
                    event.sport_type,
                    event.start_time,
                    event.status.as_str(),
                    event.home_score,
                    event.away_score,
                    event.period,
                    event.time_in_period,
                    event.venue,
                    event.synced_at,
                ],
            )
        })?;
        Ok(())
    }

    // == Live Events ==
    /// `(id, external_api_id)` of every event currently marked live.
    pub fn live_event_ids(&self) -> Result<Vec<(String, Option<String>)>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, external_api_id FROM sport_events WHERE status = 'live'")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    // == Mark Finished ==
    pub fn mark_finished(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE sport_events SET status = 'finished', updated_at = ?2 WHERE id = ?1",
                params![id, timestamp(now)],
            )
        })?;
        Ok(())
    }
}
