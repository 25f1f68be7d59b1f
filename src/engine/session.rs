//! One sport's session: rate → assemble → score → gate.
//!
//! History and live rows are rated together in one chronological pass so
//! live candidates see every result dated before them. Feature assembly
//! and model scoring are separate batch phases that finish before the
//! first candidate reaches the risk gate.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, RatingConfig, SportFiles};
use crate::data::features::{FeatureAssembler, FeatureVector};
use crate::data::loader::{load_matches, load_side_tables};
use crate::data::SideTables;
use crate::model::ProbabilityModel;
use crate::strategy::edge::EdgeEvaluator;
use crate::strategy::rating::{RatedMatch, SequentialRatingTracker};
use crate::strategy::risk::{FileKillSwitch, RiskGate};
use crate::strategy::{ScoredCandidate, SessionReport, SuggestionPipeline};
use crate::types::{DailyRiskState, EngineError, MatchRecord, Sport};

/// Everything a session reads.
#[derive(Debug, Clone, Default)]
pub struct SessionInputs {
    /// Played matches. Rows without a score are rated but never become
    /// candidates.
    pub history: Vec<MatchRecord>,
    /// Upcoming fixtures to evaluate.
    pub live: Vec<MatchRecord>,
    pub tables: SideTables,
}

impl SessionInputs {
    /// Load a sport's files. History and live files are required; side
    /// tables are optional.
    pub fn load(files: &SportFiles) -> Result<Self> {
        let history = load_matches(&files.history)
            .with_context(|| format!("Failed to load history from {}", files.history))?;
        let live = load_matches(&files.live)
            .with_context(|| format!("Failed to load live fixtures from {}", files.live))?;
        let tables = load_side_tables(files.injuries.as_deref(), files.goalies.as_deref())?;
        Ok(Self {
            history,
            live,
            tables,
        })
    }
}

pub struct Session {
    sport: Sport,
    rating: RatingConfig,
    model: Box<dyn ProbabilityModel>,
    pipeline: SuggestionPipeline,
}

impl Session {
    pub fn new(
        sport: Sport,
        rating: RatingConfig,
        model: Box<dyn ProbabilityModel>,
        pipeline: SuggestionPipeline,
    ) -> Self {
        Self {
            sport,
            rating,
            model,
            pipeline,
        }
    }

    /// Standard session: file kill switch and the full guard chain from
    /// `[safety]`.
    pub fn from_config(sport: Sport, config: &AppConfig, model: Box<dyn ProbabilityModel>) -> Self {
        let gate = RiskGate::from_config(
            &config.safety,
            FileKillSwitch::new(&config.safety.kill_switch_path),
        );
        Self::new(
            sport,
            config.rating,
            model,
            SuggestionPipeline::new(EdgeEvaluator::new(sport), gate),
        )
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    /// Run the session. A rating failure aborts the whole run; every
    /// other data problem is confined to the candidate it affects.
    pub fn run(
        &self,
        inputs: &SessionInputs,
        state: &mut DailyRiskState,
        bankroll: Decimal,
    ) -> Result<SessionReport, EngineError> {
        if inputs.live.is_empty() {
            info!(sport = %self.sport, "No live fixtures");
            return Ok(SessionReport::empty(self.sport));
        }

        let rated = self.rate(inputs)?;
        let assembler = FeatureAssembler::new(self.sport, &inputs.tables);

        // Features for every candidate first, then one scoring pass.
        let assembled: Vec<(MatchRecord, Result<FeatureVector, EngineError>)> = rated
            .into_iter()
            .map(|m| {
                let features = assembler.assemble(&m);
                (m.record, features)
            })
            .collect();

        let candidates: Vec<ScoredCandidate> = assembled
            .into_iter()
            .map(|(record, features)| ScoredCandidate {
                probabilities: features.and_then(|fv| self.score(&fv)),
                record,
            })
            .collect();

        debug!(
            sport = %self.sport,
            candidates = candidates.len(),
            scored = candidates.iter().filter(|c| c.probabilities.is_ok()).count(),
            "Scoring phase complete"
        );

        let report = self.pipeline.run(&candidates, state, bankroll);
        info!(
            sport = %self.sport,
            candidates = candidates.len(),
            suggestions = report.suggestions.len(),
            rejected = report.rejected(),
            failed = report.failed(),
            halted = report.is_halted(),
            "Session complete"
        );
        Ok(report)
    }

    /// Rate history and live rows together; return the live rows only,
    /// in date order.
    fn rate(&self, inputs: &SessionInputs) -> Result<Vec<RatedMatch>, EngineError> {
        let mut tracker = SequentialRatingTracker::new(self.rating, self.sport.allows_draws());
        let rows: Vec<MatchRecord> = inputs
            .history
            .iter()
            .chain(inputs.live.iter())
            .cloned()
            .collect();

        let history_len = inputs.history.len();
        let live: Vec<RatedMatch> = tracker
            .process(rows)?
            .into_iter()
            .filter(|m| m.input_index >= history_len)
            .collect();

        let scored_live = live.iter().filter(|m| m.record.final_score().is_some()).count();
        if scored_live > 0 {
            warn!(
                sport = %self.sport,
                rows = scored_live,
                "Live fixtures carry final scores; they were applied to ratings"
            );
        }
        Ok(live)
    }

    fn score(&self, features: &FeatureVector) -> Result<Vec<f64>, EngineError> {
        self.model
            .predict(features)
            .map_err(|e| EngineError::Model(format!("{}: {e:#}", features.key)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
