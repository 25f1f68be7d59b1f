//! Persistence layer.
//!
//! Daily risk state and each session's suggestions are written as
//! pretty JSON. The state file carries the bet counter across runs of
//! the same day.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{DailyRiskState, Sport, Suggestion};

/// Where the day's risk state lives when the config names no path.
const DEFAULT_STATE_FILE: &str = "out/daily_state.json";

fn state_path(path: Option<&str>) -> &str {
    path.unwrap_or(DEFAULT_STATE_FILE)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Daily risk state
// ---------------------------------------------------------------------------

/// Write the day's bet counter, realized P&L and suggested fixtures.
/// Missing parent directories are created.
pub fn save_state(state: &DailyRiskState, path: Option<&str>) -> Result<()> {
    let path = state_path(path);
    let json = serde_json::to_string_pretty(state)
        .context("Failed to serialise daily risk state")?;

    ensure_parent(Path::new(path))?;
    std::fs::write(path, json).with_context(|| format!("Failed to write state to {path}"))?;

    debug!(
        path,
        day = %state.day,
        bets = state.bets_placed,
        suggested = state.suggested.len(),
        "Daily state written"
    );
    Ok(())
}

/// Read the saved daily state, whatever day it belongs to. `None` when
/// no run has written one yet.
pub fn load_state(path: Option<&str>) -> Result<Option<DailyRiskState>> {
    let path = state_path(path);
    if !Path::new(path).exists() {
        info!(path, "No daily state on disk");
        return Ok(None);
    }

    let json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read state from {path}"))?;
    let state: DailyRiskState = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse state from {path}"))?;

    info!(
        path,
        day = %state.day,
        bets = state.bets_placed,
        pnl = %state.pnl,
        suggested = state.suggested.len(),
        "Daily state restored"
    );
    Ok(Some(state))
}

/// State for `day`: the saved one if it belongs to that day, otherwise a
/// fresh state starting at `bankroll`.
pub fn state_for_day(
    path: Option<&str>,
    day: NaiveDate,
    bankroll: Decimal,
) -> Result<DailyRiskState> {
    match load_state(path)? {
        Some(s) if s.is_for(day) => Ok(s),
        Some(s) => {
            info!(saved_day = %s.day, day = %day, "Saved state is from an earlier day, resetting");
            Ok(DailyRiskState::new(day, bankroll))
        }
        None => Ok(DailyRiskState::new(day, bankroll)),
    }
}

/// Remove the saved daily state so the next run starts the day over.
pub fn delete_state(path: Option<&str>) -> Result<()> {
    let path = state_path(path);
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete state file {path}")),
    }
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Path of a sport's suggestion file for `day` under `dir`.
pub fn suggestions_path(dir: &str, sport: Sport, day: NaiveDate) -> PathBuf {
    Path::new(dir).join(format!("suggestions_{sport}_{}.json", day.format("%Y%m%d")))
}

/// Suggestions already written for `day`. Empty when there is no file.
pub fn load_suggestions(dir: &str, sport: Sport, day: NaiveDate) -> Result<Vec<Suggestion>> {
    let path = suggestions_path(dir, sport, day);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read suggestions from {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse suggestions from {}", path.display()))
}

/// Add a run's suggestions to the day's file, keeping what earlier runs
/// wrote. The file is created even when the run admitted nothing.
pub fn append_suggestions(
    dir: &str,
    sport: Sport,
    day: NaiveDate,
    suggestions: &[Suggestion],
) -> Result<PathBuf> {
    let path = suggestions_path(dir, sport, day);
    let mut all = load_suggestions(dir, sport, day)?;
    all.extend_from_slice(suggestions);

    let json = serde_json::to_string_pretty(&all).context("Failed to serialise suggestions")?;
    ensure_parent(&path)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write suggestions to {}", path.display()))?;

    info!(
        path = %path.display(),
        added = suggestions.len(),
        total = all.len(),
        "Suggestions appended"
    );
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
