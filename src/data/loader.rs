//! CSV loaders for match rows and side tables.
//!
//! Every row is validated on the way in: a malformed date, a negative
//! or fractional goal count, or a row without teams fails the load with
//! the offending line number instead of being skipped.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use super::{GoalieRecord, InjuryRecord, SideTables};
use crate::types::{MarketOdds, MatchRecord};

// ---------------------------------------------------------------------------
// Row types (CSV layout)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MatchRow {
    date: String,
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
    #[serde(default)]
    home_odds: Option<f64>,
    #[serde(default)]
    draw_odds: Option<f64>,
    #[serde(default)]
    away_odds: Option<f64>,
    #[serde(default)]
    home_goals: Option<f64>,
    #[serde(default)]
    away_goals: Option<f64>,
    #[serde(default)]
    home_rest: Option<f64>,
    #[serde(default)]
    away_rest: Option<f64>,
    #[serde(default)]
    season: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InjuryRow {
    date: String,
    team: String,
    is_out: f64,
    impact: f64,
}

#[derive(Debug, Deserialize)]
struct GoalieRow {
    date: String,
    team: String,
    is_confirmed: f64,
    goalie_rating: f64,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse a calendar date. Accepts `YYYY-MM-DD` and datetime forms whose
/// time part is dropped.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(anyhow!("Unparseable date: {raw:?}"))
}

fn parse_goals(value: Option<f64>, field: &str) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(Some(v as u32)),
        Some(v) => bail!("{field} must be a non-negative integer, got {v}"),
    }
}

fn required_team(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
        _ => bail!("missing {field}"),
    }
}

fn flag(value: f64) -> bool {
    value == 1.0
}

/// CSV line number of the `index`-th record (header is line 1).
fn line(index: usize) -> usize {
    index + 2
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Load match rows. Rows with both goal columns set are results; rows
/// with neither are live candidates.
pub fn load_matches(path: impl AsRef<Path>) -> Result<Vec<MatchRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open match file {}", path.display()))?;

    let mut records = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let row: MatchRow = result
            .with_context(|| format!("{}:{}: CSV parse error", path.display(), line(i)))?;
        let record = match_record(row)
            .with_context(|| format!("{}:{}: invalid match row", path.display(), line(i)))?;
        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), "Matches loaded");
    Ok(records)
}

fn match_record(row: MatchRow) -> Result<MatchRecord> {
    Ok(MatchRecord {
        date: parse_date(&row.date)?,
        home_team: required_team(row.home_team, "home_team")?,
        away_team: required_team(row.away_team, "away_team")?,
        odds: MarketOdds {
            home: row.home_odds,
            draw: row.draw_odds,
            away: row.away_odds,
        },
        home_goals: parse_goals(row.home_goals, "home_goals")?,
        away_goals: parse_goals(row.away_goals, "away_goals")?,
        home_rest: row.home_rest,
        away_rest: row.away_rest,
        season: row.season.filter(|s| !s.trim().is_empty()),
    })
}

pub fn load_injuries(path: impl AsRef<Path>) -> Result<Vec<InjuryRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open injury file {}", path.display()))?;

    let mut records = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let row: InjuryRow = result
            .with_context(|| format!("{}:{}: CSV parse error", path.display(), line(i)))?;
        if !(row.impact >= 0.0) {
            bail!("{}:{}: negative injury impact {}", path.display(), line(i), row.impact);
        }
        records.push(InjuryRecord {
            date: parse_date(&row.date)
                .with_context(|| format!("{}:{}", path.display(), line(i)))?,
            team: row.team.trim().to_string(),
            is_out: flag(row.is_out),
            impact: row.impact,
        });
    }

    debug!(path = %path.display(), rows = records.len(), "Injuries loaded");
    Ok(records)
}

pub fn load_goalies(path: impl AsRef<Path>) -> Result<Vec<GoalieRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open goalie file {}", path.display()))?;

    let mut records = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let row: GoalieRow = result
            .with_context(|| format!("{}:{}: CSV parse error", path.display(), line(i)))?;
        records.push(GoalieRecord {
            date: parse_date(&row.date)
                .with_context(|| format!("{}:{}", path.display(), line(i)))?,
            team: row.team.trim().to_string(),
            is_confirmed: flag(row.is_confirmed),
            goalie_rating: row.goalie_rating,
        });
    }

    debug!(path = %path.display(), rows = records.len(), "Goalies loaded");
    Ok(records)
}

/// Build side tables from optional files. A table whose file is not
/// configured or does not exist is empty, so every lookup defaults to
/// 0.0; a file that exists but fails to parse is an error.
pub fn load_side_tables(injuries: Option<&str>, goalies: Option<&str>) -> Result<SideTables> {
    let mut tables = SideTables::new();
    if let Some(path) = injuries.filter(|p| Path::new(p).exists()) {
        tables = tables.with_injuries(load_injuries(path)?);
    }
    if let Some(path) = goalies.filter(|p| Path::new(p).exists()) {
        tables = tables.with_goalies(load_goalies(path)?);
    }
    Ok(tables)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
