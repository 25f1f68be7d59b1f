//! Precomputed predictions.
//!
//! The training job scores upcoming fixtures offline and writes one CSV
//! row per fixture. This model serves those rows back by fixture
//! identity, which keeps the engine free of any model file format.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use super::ProbabilityModel;
use crate::data::features::FeatureVector;
use crate::data::loader::parse_date;
use crate::types::{MatchKey, Outcome, Sport};

#[derive(Debug, Deserialize)]
struct PredictionRow {
    date: String,
    home_team: String,
    away_team: String,
    p_home: f64,
    #[serde(default)]
    p_draw: Option<f64>,
    p_away: f64,
}

/// Lookup table of externally produced probabilities for one sport.
#[derive(Debug, Clone)]
pub struct PrecomputedModel {
    sport: Sport,
    predictions: HashMap<MatchKey, Vec<f64>>,
}

impl PrecomputedModel {
    pub fn new(sport: Sport) -> Self {
        Self {
            sport,
            predictions: HashMap::new(),
        }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Store probabilities for a fixture. `probability` is asked for each
    /// outcome of the sport; a missing outcome is an error.
    pub fn insert(
        &mut self,
        key: MatchKey,
        probability: impl Fn(Outcome) -> Option<f64>,
    ) -> Result<()> {
        let probs = self
            .sport
            .outcome_classes()
            .iter()
            .map(|&o| {
                probability(o).ok_or_else(|| anyhow!("{key}: missing {o} probability"))
            })
            .collect::<Result<Vec<f64>>>()?;
        self.predictions.insert(key, probs);
        Ok(())
    }

    /// Load a predictions CSV (`date, home_team, away_team, p_home,
    /// p_draw, p_away`). `p_draw` is required for soccer only.
    pub fn from_csv(sport: Sport, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open predictions file {}", path.display()))?;

        let mut model = Self::new(sport);
        for (i, result) in reader.deserialize().enumerate() {
            let row: PredictionRow = result
                .with_context(|| format!("{}:{}: CSV parse error", path.display(), i + 2))?;
            let key = MatchKey {
                date: parse_date(&row.date)
                    .with_context(|| format!("{}:{}", path.display(), i + 2))?,
                home_team: row.home_team.trim().to_string(),
                away_team: row.away_team.trim().to_string(),
            };
            if model.predictions.contains_key(&key) {
                bail!("{}:{}: duplicate prediction for {key}", path.display(), i + 2);
            }
            model
                .insert(key, |o| match o {
                    Outcome::Home => Some(row.p_home),
                    Outcome::Draw => row.p_draw,
                    Outcome::Away => Some(row.p_away),
                })
                .with_context(|| format!("{}:{}", path.display(), i + 2))?;
        }

        info!(
            sport = %sport,
            path = %path.display(),
            fixtures = model.len(),
            "Predictions loaded"
        );
        Ok(model)
    }
}

impl ProbabilityModel for PrecomputedModel {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if features.sport != self.sport {
            bail!(
                "{} features passed to {} predictions",
                features.sport,
                self.sport
            );
        }
        self.predictions
            .get(&features.key)
            .cloned()
            .ok_or_else(|| anyhow!("no prediction for {}", features.key))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
