//! Strategy engine: ratings, edge evaluation, staking, and the risk gate.

pub mod edge;
pub mod rating;
pub mod risk;
pub mod staking;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::types::{DailyRiskState, EngineError, MatchKey, MatchRecord, Sport, Suggestion};
use edge::EdgeEvaluator;
use risk::{Rejection, RiskGate};

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// Record of every candidate evaluated during a session, including the
/// ones that were passed on and why.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionRecord {
    /// Passed every guard.
    Admitted(Suggestion),
    /// Vetoed by a guard.
    Rejected { key: MatchKey, reason: Rejection },
    /// Bad input data or a model failure. Never reaches the gate.
    Failed { key: MatchKey, error: EngineError },
    /// Suggested by an earlier run today. Never reaches the gate.
    AlreadySuggested { key: MatchKey },
}

impl DecisionRecord {
    pub fn is_admitted(&self) -> bool {
        matches!(self, DecisionRecord::Admitted(_))
    }
}

/// How the candidate loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every candidate was evaluated.
    Completed,
    /// The kill switch fired. `at` is the index of the candidate being
    /// evaluated when it fired; that candidate and everything after it
    /// (`unevaluated`) produced no decision.
    Halted { at: usize, unevaluated: usize },
}

/// Everything one session produced.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub sport: Sport,
    /// Admitted suggestions in evaluation order.
    pub suggestions: Vec<Suggestion>,
    pub decisions: Vec<DecisionRecord>,
    pub outcome: SessionOutcome,
}

impl SessionReport {
    pub fn empty(sport: Sport) -> Self {
        Self {
            sport,
            suggestions: Vec::new(),
            decisions: Vec::new(),
            outcome: SessionOutcome::Completed,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.outcome, SessionOutcome::Halted { .. })
    }

    pub fn rejected(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, DecisionRecord::Rejected { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, DecisionRecord::Failed { .. }))
            .count()
    }

    pub fn already_suggested(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, DecisionRecord::AlreadySuggested { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A live fixture after the batch scoring phase.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub record: MatchRecord,
    /// Model probabilities in class order, or why none could be produced.
    pub probabilities: Result<Vec<f64>, EngineError>,
}

/// Edge evaluation → risk gate, one candidate at a time.
///
/// The pipeline never reorders candidates: they are admitted in the
/// order given, so a daily bet limit is spent on the earliest fixtures.
pub struct SuggestionPipeline {
    evaluator: EdgeEvaluator,
    gate: RiskGate,
}

impl SuggestionPipeline {
    pub fn new(evaluator: EdgeEvaluator, gate: RiskGate) -> Self {
        Self { evaluator, gate }
    }

    pub fn sport(&self) -> Sport {
        self.evaluator.sport()
    }

    pub fn gate(&self) -> &RiskGate {
        &self.gate
    }

    /// Run every candidate through the evaluator and the gate.
    ///
    /// `bankroll` sizes every stake and feeds the daily loss check. Bets
    /// admitted here are counted in `state`; no result is realized.
    pub fn run(
        &self,
        candidates: &[ScoredCandidate],
        state: &mut DailyRiskState,
        bankroll: Decimal,
    ) -> SessionReport {
        let sport = self.sport();
        let mut report = SessionReport::empty(sport);

        for (index, candidate) in candidates.iter().enumerate() {
            // The kill switch comes before anything about the candidate,
            // so a halt is reported even when the candidate is unusable.
            if let Err(reason) = self.gate.precheck() {
                let unevaluated = candidates.len() - index;
                warn!(
                    sport = %sport,
                    reason = %reason,
                    evaluated = index,
                    unevaluated,
                    "Session halted"
                );
                report.outcome = SessionOutcome::Halted { at: index, unevaluated };
                break;
            }

            let record = &candidate.record;
            let key = record.key();
            if state.already_suggested(&key) {
                debug!(fixture = %key, "Already suggested today");
                report.decisions.push(DecisionRecord::AlreadySuggested { key });
                continue;
            }

            let estimate = match &candidate.probabilities {
                Ok(probs) => self.evaluator.evaluate(&record.label(), probs, &record.odds),
                Err(e) => Err(e.clone()),
            };
            let estimate = match estimate {
                Ok(est) => est,
                Err(error) => {
                    warn!(fixture = %record.label(), error = %error, "Candidate skipped");
                    report.decisions.push(DecisionRecord::Failed { key, error });
                    continue;
                }
            };

            match self.gate.admit_prechecked(sport, record, &estimate, state, bankroll) {
                Ok(suggestion) => {
                    info!(
                        sport = %sport,
                        fixture = %suggestion.match_label,
                        pick = %suggestion.pick,
                        odds = suggestion.odds,
                        edge = format!("{:.1}%", suggestion.edge * 100.0),
                        stake = %suggestion.suggested_stake,
                        bets_today = state.bets_placed,
                        "Suggestion admitted"
                    );
                    report.suggestions.push(suggestion.clone());
                    report.decisions.push(DecisionRecord::Admitted(suggestion));
                }
                Err(reason) => {
                    report.decisions.push(DecisionRecord::Rejected { key, reason });
                }
            }
        }

        debug!(
            sport = %sport,
            candidates = candidates.len(),
            admitted = report.suggestions.len(),
            rejected = report.rejected(),
            failed = report.failed(),
            already_suggested = report.already_suggested(),
            "Pipeline pass complete"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
