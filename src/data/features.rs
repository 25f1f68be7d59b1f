//! Feature assembly.
//!
//! Each sport has one fixed feature schema. The order here is the
//! column order the probability model was trained on and must not
//! change independently of the model.

use std::fmt;

use crate::data::SideTables;
use crate::strategy::rating::RatedMatch;
use crate::types::{EngineError, MatchKey, MatchRecord, Outcome, Sport};

/// Soccer 1X2 schema.
pub const SOCCER_SCHEMA: &[&str] = &[
    "home_imp",
    "draw_imp",
    "away_imp",
    "elo_diff",
    "injury_diff",
    "rest_diff",
];

/// Hockey moneyline schema.
pub const HOCKEY_SCHEMA: &[&str] = &[
    "home_imp",
    "away_imp",
    "elo_diff",
    "injury_diff",
    "rest_diff",
    "goalie_diff",
];

/// Feature names for a sport, in model order.
pub fn schema(sport: Sport) -> &'static [&'static str] {
    match sport {
        Sport::Soccer => SOCCER_SCHEMA,
        Sport::Hockey => HOCKEY_SCHEMA,
    }
}

/// Model input for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub sport: Sport,
    pub key: MatchKey,
    /// Values in `schema(sport)` order.
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &'static [&'static str] {
        schema(self.sport)
    }

    /// Value of a named feature.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .names()
            .iter()
            .zip(&self.values)
            .map(|(n, v)| format!("{n}={v:.4}"))
            .collect();
        write!(f, "{} [{}]", self.key, parts.join(", "))
    }
}

/// Builds feature vectors for one sport from rated matches and side
/// tables.
pub struct FeatureAssembler<'a> {
    sport: Sport,
    tables: &'a SideTables,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(sport: Sport, tables: &'a SideTables) -> Self {
        Self { sport, tables }
    }

    pub fn assemble(&self, rated: &RatedMatch) -> Result<FeatureVector, EngineError> {
        let r = &rated.record;
        let home_imp = implied(r, Outcome::Home)?;
        let away_imp = implied(r, Outcome::Away)?;

        let injury_diff = self.tables.injury_impact(r.date, &r.home_team)
            - self.tables.injury_impact(r.date, &r.away_team);
        let rest_diff = rest(r, true)? - rest(r, false)?;
        let elo_diff = rated.rating_differential();

        let values = match self.sport {
            Sport::Soccer => {
                let draw_imp = implied(r, Outcome::Draw)?;
                vec![home_imp, draw_imp, away_imp, elo_diff, injury_diff, rest_diff]
            }
            Sport::Hockey => {
                let goalie_diff = self.tables.goalie_rating(r.date, &r.home_team)
                    - self.tables.goalie_rating(r.date, &r.away_team);
                vec![home_imp, away_imp, elo_diff, injury_diff, rest_diff, goalie_diff]
            }
        };
        debug_assert_eq!(values.len(), schema(self.sport).len());

        Ok(FeatureVector {
            sport: self.sport,
            key: r.key(),
            values,
        })
    }
}

/// `1 / odds` for an outcome the sport requires.
fn implied(record: &MatchRecord, outcome: Outcome) -> Result<f64, EngineError> {
    let odds = record
        .odds
        .for_outcome(outcome)
        .ok_or_else(|| EngineError::MissingOdds {
            fixture: record.label(),
            outcome,
        })?;
    if !(odds > 1.0) {
        return Err(EngineError::InvalidOdds {
            fixture: record.label(),
            outcome,
            odds,
        });
    }
    Ok(1.0 / odds)
}

fn rest(record: &MatchRecord, home: bool) -> Result<f64, EngineError> {
    let (days, team) = if home {
        (record.home_rest, &record.home_team)
    } else {
        (record.away_rest, &record.away_team)
    };
    days.ok_or_else(|| EngineError::MissingRest {
        fixture: record.label(),
        team: team.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
