//! Shared types for the EDGEGUARD engine.
//!
//! These types form the data model used across all modules.
//! Ratings, features, strategy and session code depend on them
//! without depending on each other.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Sport / market type. Each sport has its own outcome set and its own
/// feature schema; the two never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    /// Soccer 1X2 (three-way, draws allowed).
    Soccer,
    /// Hockey moneyline (two-way, no draws).
    Hockey,
}

impl Sport {
    /// All supported sports (useful for iteration).
    pub const ALL: &'static [Sport] = &[Sport::Soccer, Sport::Hockey];

    /// Whether a level score is a possible outcome of the market.
    pub fn allows_draws(&self) -> bool {
        matches!(self, Sport::Soccer)
    }

    /// Outcomes in the model's class order (class 0 = away win).
    pub fn outcome_classes(&self) -> &'static [Outcome] {
        match self {
            Sport::Soccer => &[Outcome::Away, Outcome::Draw, Outcome::Home],
            Sport::Hockey => &[Outcome::Away, Outcome::Home],
        }
    }

    /// Number of outcomes the model scores for this sport.
    pub fn outcome_count(&self) -> usize {
        self.outcome_classes().len()
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::Soccer => write!(f, "soccer"),
            Sport::Hockey => write!(f, "hockey"),
        }
    }
}

impl std::str::FromStr for Sport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "soccer" | "football" => Ok(Sport::Soccer),
            "hockey" | "nhl" => Ok(Sport::Hockey),
            other => Err(anyhow::anyhow!("Unknown sport: {other}")),
        }
    }
}

/// A match outcome a bet can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// Tie-break priority when two outcomes carry the same edge:
    /// earlier wins.
    pub const PRIORITY: &'static [Outcome] = &[Outcome::Home, Outcome::Draw, Outcome::Away];
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Home => write!(f, "home"),
            Outcome::Draw => write!(f, "draw"),
            Outcome::Away => write!(f, "away"),
        }
    }
}

// ---------------------------------------------------------------------------
// Match records
// ---------------------------------------------------------------------------

/// Decimal odds quoted for a match. Fields are optional so a missing
/// quote stays visible instead of turning into a fabricated number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketOdds {
    pub home: Option<f64>,
    pub draw: Option<f64>,
    pub away: Option<f64>,
}

impl MarketOdds {
    /// Three-way market.
    pub fn three_way(home: f64, draw: f64, away: f64) -> Self {
        Self { home: Some(home), draw: Some(draw), away: Some(away) }
    }

    /// Two-way market (no draw price).
    pub fn two_way(home: f64, away: f64) -> Self {
        Self { home: Some(home), draw: None, away: Some(away) }
    }

    /// Quoted odds for one outcome, if any.
    pub fn for_outcome(&self, outcome: Outcome) -> Option<f64> {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }
}

/// One row of market data. Final scores are present on historical rows
/// only; a row without them is a live candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub odds: MarketOdds,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    /// Days since each side's previous match.
    pub home_rest: Option<f64>,
    pub away_rest: Option<f64>,
    pub season: Option<String>,
}

impl MatchRecord {
    /// Build a live (unplayed) match row.
    pub fn live(date: NaiveDate, home: &str, away: &str, odds: MarketOdds) -> Self {
        Self {
            date,
            home_team: home.to_string(),
            away_team: away.to_string(),
            odds,
            home_goals: None,
            away_goals: None,
            home_rest: None,
            away_rest: None,
            season: None,
        }
    }

    /// Attach a final score (turns the row into a historical result).
    pub fn with_score(mut self, home_goals: u32, away_goals: u32) -> Self {
        self.home_goals = Some(home_goals);
        self.away_goals = Some(away_goals);
        self
    }

    /// Attach rest days for both sides.
    pub fn with_rest(mut self, home_rest: f64, away_rest: f64) -> Self {
        self.home_rest = Some(home_rest);
        self.away_rest = Some(away_rest);
        self
    }

    /// Final score, when both sides are known.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        match (self.home_goals, self.away_goals) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }

    /// Identity of the fixture.
    pub fn key(&self) -> MatchKey {
        MatchKey {
            date: self.date,
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
        }
    }

    /// "Home vs Away"
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// Identity of a fixture: date plus both teams.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchKey {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} vs {}", self.date, self.home_team, self.away_team)
    }
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

/// A sized bet suggestion that passed every guard. Terminal output of
/// the engine; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub sport: Sport,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    #[serde(rename = "match")]
    pub match_label: String,
    pub pick: Outcome,
    pub odds: f64,
    pub edge: f64,
    pub suggested_stake: Decimal,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} -> {} @ {:.2} | edge={:.1}% | stake=${:.2}",
            self.sport,
            self.date,
            self.match_label,
            self.pick,
            self.odds,
            self.edge * 100.0,
            self.suggested_stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Daily risk state
// ---------------------------------------------------------------------------

/// Mutable risk state for one trading day. Threaded through the
/// evaluation loop by exclusive reference; the risk gate is the only
/// writer of `bets_placed` and `suggested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRiskState {
    pub day: NaiveDate,
    pub bets_placed: u32,
    /// Realized profit and loss for the day.
    pub pnl: Decimal,
    pub start_bankroll: Decimal,
    /// Fixtures already suggested today, in admission order.
    #[serde(default)]
    pub suggested: Vec<MatchKey>,
}

impl fmt::Display for DailyRiskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | bets={} | pnl=${:.2} | start=${:.2}",
            self.day, self.bets_placed, self.pnl, self.start_bankroll,
        )
    }
}

impl DailyRiskState {
    /// Fresh state for a day.
    pub fn new(day: NaiveDate, start_bankroll: Decimal) -> Self {
        Self {
            day,
            bets_placed: 0,
            pnl: Decimal::ZERO,
            start_bankroll,
            suggested: Vec::new(),
        }
    }

    /// Count an admitted suggestion against the day.
    pub fn record_admission(&mut self, key: MatchKey) {
        self.bets_placed += 1;
        self.suggested.push(key);
    }

    pub fn already_suggested(&self, key: &MatchKey) -> bool {
        self.suggested.contains(key)
    }

    /// Bankroll after realized results.
    pub fn current_bankroll(&self) -> Decimal {
        self.start_bankroll + self.pnl
    }

    /// Record a settled bet. The engine never calls this; settlement is
    /// the caller's business.
    pub fn record_result(&mut self, pnl: Decimal) {
        self.pnl += pnl;
    }

    /// Whether this state belongs to `day`.
    pub fn is_for(&self, day: NaiveDate) -> bool {
        self.day == day
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Data-integrity failures. Fatal for the row or candidate they name;
/// never papered over with a default value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Row {row}: missing required field `{field}`")]
    MissingField { row: usize, field: &'static str },

    #[error("Row {row}: only one of home_goals/away_goals is set")]
    PartialScore { row: usize },

    #[error("{fixture}: missing {outcome} odds")]
    MissingOdds { fixture: String, outcome: Outcome },

    #[error("{fixture}: invalid {outcome} odds {odds} (must be > 1.0)")]
    InvalidOdds { fixture: String, outcome: Outcome, odds: f64 },

    #[error("{fixture}: missing rest days for {team}")]
    MissingRest { fixture: String, team: String },

    #[error("{sport} model returned {got} probabilities, expected {expected}")]
    ProbabilityShape { sport: Sport, expected: usize, got: usize },

    #[error("Invalid probability {value} for {outcome}")]
    InvalidProbability { outcome: Outcome, value: f64 },

    #[error("Model scoring failed: {0}")]
    Model(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
