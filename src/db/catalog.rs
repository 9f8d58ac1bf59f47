//! Leagues, streaming providers and broadcasting rights.

use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::Database;
use crate::error::Result;
use crate::models::records::{League, StreamingOption, StreamingProvider};

/// Reads a JSON array column into a list of regions.
fn regions(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Vec<String>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|e| {
            let index = row.as_ref().column_index(column).unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn league_from_row(row: &Row<'_>) -> rusqlite::Result<League> {
    Ok(League {
        id: row.get("id")?,
        name: row.get("name")?,
        sport_type: row.get("sport_type")?,
        country: row.get("country")?,
        logo_url: row.get("logo_url")?,
        is_active: row.get("is_active")?,
    })
}

fn provider_from_row(row: &Row<'_>) -> rusqlite::Result<StreamingProvider> {
    Ok(StreamingProvider {
        id: row.get("id")?,
        name: row.get("name")?,
        logo_url: row.get("logo_url")?,
        website_url: row.get("website_url")?,
        available_regions: regions(row, "available_regions")?.unwrap_or_default(),
        is_active: row.get("is_active")?,
    })
}

/// Maps a broadcasting right joined with `p_`-prefixed provider columns.
fn option_from_row(row: &Row<'_>) -> rusqlite::Result<StreamingOption> {
    let provider_name: Option<String> = row.get("p_name")?;
    let provider = match provider_name {
        Some(name) => Some(StreamingProvider {
            id: row.get("provider_id")?,
            name,
            logo_url: row.get("p_logo_url")?,
            website_url: row.get("p_website_url")?,
            available_regions: regions(row, "p_available_regions")?.unwrap_or_default(),
            is_active: row.get("p_is_active")?,
        }),
        None => None,
    };

    Ok(StreamingOption {
        id: row.get("id")?,
        event_id: row.get("event_id")?,
        provider_id: row.get("provider_id")?,
        available_regions: regions(row, "available_regions")?,
        stream_url: row.get("stream_url")?,
        is_active: row.get("is_active")?,
        provider,
    })
}

pub(super) fn league_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<League>> {
    conn.query_row(
        "SELECT id, name, sport_type, country, logo_url, is_active FROM leagues WHERE id = ?1",
        params![id],
        league_from_row,
    )
    .optional()
}

/// Broadcasting rights of an event, each with its provider.
///
/// With `region`, only rights available there (or everywhere) are returned.
pub(super) fn streaming_options_for(
    conn: &Connection,
    event_id: &str,
    region: Option<&str>,
    active_only: bool,
) -> rusqlite::Result<Vec<StreamingOption>> {
    let mut sql = String::from(
        "SELECT r.id, r.event_id, r.provider_id, r.available_regions, r.stream_url, r.is_active,
                p.name AS p_name, p.logo_url AS p_logo_url, p.website_url AS p_website_url,
                p.available_regions AS p_available_regions, p.is_active AS p_is_active
         FROM broadcasting_rights r
         LEFT JOIN streaming_providers p ON p.id = r.provider_id
         WHERE r.event_id = ?",
    );
    let mut args = vec![event_id.to_string()];

    if active_only {
        sql.push_str(" AND r.is_active = 1");
    }
    if let Some(region) = region {
        sql.push_str(
            " AND (r.available_regions IS NULL OR EXISTS \
             (SELECT 1 FROM json_each(r.available_regions) WHERE json_each.value = ?))",
        );
        args.push(region.to_string());
    }
    sql.push_str(" ORDER BY r.id");

    let mut stmt = conn.prepare(&sql)?;
    let options = stmt
        .query_map(params_from_iter(args), option_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(options)
}

impl Database {
    // == Leagues ==
    /// Active leagues ordered by name.
    pub fn leagues(&self, sport_type: Option<&str>, country: Option<&str>) -> Result<Vec<League>> {
        let mut sql = String::from(
            "SELECT id, name, sport_type, country, logo_url, is_active FROM leagues WHERE is_active = 1",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(sport_type) = sport_type {
            sql.push_str(" AND sport_type = ?");
            args.push(sport_type.to_string());
        }
        if let Some(country) = country {
            sql.push_str(" AND country = ?");
            args.push(country.to_string());
        }
        sql.push_str(" ORDER BY name");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let leagues = stmt
                .query_map(params_from_iter(args), league_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(leagues)
        })
    }

    // == Providers ==
    /// Active providers ordered by name, optionally limited to one region.
    pub fn providers(&self, region: Option<&str>) -> Result<Vec<StreamingProvider>> {
        let mut sql = String::from(
            "SELECT id, name, logo_url, website_url, available_regions, is_active
             FROM streaming_providers WHERE is_active = 1",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(region) = region {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM json_each(streaming_providers.available_regions) \
                 WHERE json_each.value = ?)",
            );
            args.push(region.to_string());
        }
        sql.push_str(" ORDER BY name");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let providers = stmt
                .query_map(params_from_iter(args), provider_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(providers)
        })
    }

    // == Streaming Options ==
    /// Active broadcasting rights for an event.
    pub fn streaming_options(
        &self,
        event_id: &str,
        region: Option<&str>,
    ) -> Result<Vec<StreamingOption>> {
        self.with_conn(|conn| streaming_options_for(conn, event_id, region, true))
    }

    // == Inserts ==
    pub fn insert_league(&self, league: &League) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO leagues (id, name, sport_type, country, logo_url, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    league.id,
                    league.name,
                    league.sport_type,
                    league.country,
                    league.logo_url,
                    league.is_active,
                ],
            )
        })?;
        Ok(())
    }

    pub fn insert_provider(&self, provider: &StreamingProvider) -> Result<()> {
        let regions = serde_json::to_string(&provider.available_regions)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO streaming_providers
                     (id, name, logo_url, website_url, available_regions, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    provider.id,
                    provider.name,
                    provider.logo_url,
                    provider.website_url,
                    regions,
                    provider.is_active,
                ],
            )
        })?;
        Ok(())
    }

    /// Stores a broadcasting right; the embedded provider is ignored.
    pub fn insert_streaming_option(&self, option: &StreamingOption) -> Result<()> {
        let regions = option
            .available_regions
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO broadcasting_rights
                     (id, event_id, provider_id, available_regions, stream_url, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    option.id,
                    option.event_id,
                    option.provider_id,
                    regions,
                    option.stream_url,
                    option.is_active,
                ],
            )
        })?;
        Ok(())
    }
}
