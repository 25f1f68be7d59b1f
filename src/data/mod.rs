//! Match data and side tables.
//!
//! Side tables hold the per-(date, team) scalars the feature assembler
//! needs: injury impact and confirmed-goalie rating. Both default to
//! 0.0 when no row exists for the key.

pub mod features;
pub mod loader;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One player's availability on a match date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRecord {
    pub date: NaiveDate,
    pub team: String,
    pub is_out: bool,
    /// Non-negative weight of the player's absence.
    pub impact: f64,
}

/// A goalie listed for a match date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieRecord {
    pub date: NaiveDate,
    pub team: String,
    pub is_confirmed: bool,
    pub goalie_rating: f64,
}

type TeamDay = (NaiveDate, String);

/// Injury and goalie lookups keyed by (date, team).
#[derive(Debug, Clone, Default)]
pub struct SideTables {
    injuries: HashMap<TeamDay, f64>,
    goalies: HashMap<TeamDay, f64>,
}

impl SideTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add injury rows. Impacts of players who are out are summed per
    /// (date, team); players not out contribute nothing.
    pub fn with_injuries(mut self, rows: impl IntoIterator<Item = InjuryRecord>) -> Self {
        for row in rows.into_iter().filter(|r| r.is_out) {
            *self.injuries.entry((row.date, row.team)).or_insert(0.0) += row.impact;
        }
        self
    }

    /// Add goalie rows. The first confirmed goalie per (date, team) wins.
    pub fn with_goalies(mut self, rows: impl IntoIterator<Item = GoalieRecord>) -> Self {
        for row in rows.into_iter().filter(|r| r.is_confirmed) {
            self.goalies
                .entry((row.date, row.team))
                .or_insert(row.goalie_rating);
        }
        self
    }

    pub fn injury_impact(&self, date: NaiveDate, team: &str) -> f64 {
        self.injuries
            .get(&(date, team.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn goalie_rating(&self, date: NaiveDate, team: &str) -> f64 {
        self.goalies
            .get(&(date, team.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}
