//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a partial file (or none at all) still
//! yields a complete, conservative configuration.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::Sport;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub safety: SafetyConfig,
    pub rating: RatingConfig,
    pub model: ModelConfig,
    pub data: DataConfig,
    pub session: SessionConfig,
}

/// Capital-preservation rules. Read-only for the whole session.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    /// Only print suggestions; never place anything.
    pub alerts_only: bool,
    pub bankroll_start: Decimal,
    /// Flat stake as a fraction of bankroll.
    pub max_bet_pct: Decimal,
    /// Fraction of the session's starting bankroll that may be lost.
    pub daily_loss_limit_pct: Decimal,
    pub max_bets_per_day: u32,
    pub edge_threshold: f64,
    pub min_odds: f64,
    pub max_odds: f64,
    pub allow_soccer_1x2: bool,
    pub allow_hockey_ml: bool,
    /// Empty = no restriction.
    pub allowed_teams: Vec<String>,
    pub kill_switch_path: String,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            alerts_only: true,
            bankroll_start: dec!(1000),
            max_bet_pct: dec!(0.01),
            daily_loss_limit_pct: dec!(0.05),
            max_bets_per_day: 10,
            edge_threshold: 0.04,
            min_odds: 1.20,
            max_odds: 12.0,
            allow_soccer_1x2: true,
            allow_hockey_ml: true,
            allowed_teams: Vec::new(),
            kill_switch_path: "out/KILL_SWITCH".to_string(),
        }
    }
}

impl SafetyConfig {
    /// Whether the market for `sport` is enabled.
    pub fn sport_enabled(&self, sport: Sport) -> bool {
        match sport {
            Sport::Soccer => self.allow_soccer_1x2,
            Sport::Hockey => self.allow_hockey_ml,
        }
    }
}

/// Sequential rating parameters.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RatingConfig {
    pub k_factor: f64,
    pub initial_rating: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 20.0,
            initial_rating: 1500.0,
        }
    }
}

/// Hyperparameters of the external gradient-boosted model. Carried so
/// one config file drives both the training job and this engine; the
/// engine only logs them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub random_seed: u64,
    pub n_estimators: u32,
    pub max_depth: u32,
    pub learning_rate: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            random_seed: 42,
            n_estimators: 400,
            max_depth: 5,
            learning_rate: 0.05,
            subsample: 0.9,
            colsample_bytree: 0.9,
        }
    }
}

/// Input file locations for one sport.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SportFiles {
    pub history: String,
    pub live: String,
    pub predictions: String,
    #[serde(default)]
    pub injuries: Option<String>,
    #[serde(default)]
    pub goalies: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub soccer: SportFiles,
    pub hockey: SportFiles,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            soccer: SportFiles {
                history: "data/soccer_matches.csv".into(),
                live: "data/live_odds_soccer.csv".into(),
                predictions: "data/predictions_soccer.csv".into(),
                injuries: Some("data/soccer_injuries.csv".into()),
                goalies: None,
            },
            hockey: SportFiles {
                history: "data/hockey_matches.csv".into(),
                live: "data/live_odds_hockey.csv".into(),
                predictions: "data/predictions_hockey.csv".into(),
                injuries: Some("data/hockey_injuries.csv".into()),
                goalies: Some("data/hockey_goalies.csv".into()),
            },
        }
    }
}

impl DataConfig {
    pub fn files_for(&self, sport: Sport) -> &SportFiles {
        match sport {
            Sport::Soccer => &self.soccer,
            Sport::Hockey => &self.hockey,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Re-run the session on this interval; `None` runs once.
    pub poll_interval_secs: Option<u64>,
    pub output_dir: String,
    pub state_file: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: None,
            output_dir: "out".into(),
            state_file: "out/daily_state.json".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject internally inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        let s = &self.safety;
        if s.max_bet_pct <= Decimal::ZERO || s.max_bet_pct > Decimal::ONE {
            bail!("safety.max_bet_pct must be in (0, 1], got {}", s.max_bet_pct);
        }
        if s.daily_loss_limit_pct <= Decimal::ZERO || s.daily_loss_limit_pct > Decimal::ONE {
            bail!(
                "safety.daily_loss_limit_pct must be in (0, 1], got {}",
                s.daily_loss_limit_pct
            );
        }
        if s.bankroll_start < Decimal::ZERO {
            bail!("safety.bankroll_start must not be negative");
        }
        if !(s.min_odds > 1.0) || s.min_odds > s.max_odds {
            bail!(
                "safety odds band invalid: min_odds={} max_odds={}",
                s.min_odds,
                s.max_odds
            );
        }
        if !s.edge_threshold.is_finite() {
            bail!("safety.edge_threshold must be finite");
        }
        if s.kill_switch_path.trim().is_empty() {
            bail!("safety.kill_switch_path must not be empty");
        }
        if !(self.rating.k_factor > 0.0) {
            bail!("rating.k_factor must be positive, got {}", self.rating.k_factor);
        }
        Ok(())
    }
}
