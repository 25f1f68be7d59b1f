//! Edge evaluation.
//!
//! Compares model probabilities to the raw implied probabilities of the
//! quoted odds and picks the outcome with the largest edge. The market
//! margin is deliberately left in: edge is measured against `1 / odds`,
//! not against a de-vigged price.

use tracing::debug;

use crate::types::{EngineError, MarketOdds, Outcome, Sport};

/// Edge on a single outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeEdge {
    pub outcome: Outcome,
    pub probability: f64,
    pub odds: f64,
    /// `1 / odds`
    pub implied: f64,
    /// `probability - implied`
    pub edge: f64,
}

/// Result of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEstimate {
    pub pick: OutcomeEdge,
    /// Every outcome of the sport, in tie-break priority order.
    pub outcomes: Vec<OutcomeEdge>,
}

impl EdgeEstimate {
    pub fn edge(&self) -> f64 {
        self.pick.edge
    }

    pub fn outcome(&self) -> Outcome {
        self.pick.outcome
    }

    pub fn odds(&self) -> f64 {
        self.pick.odds
    }
}

/// Pick the largest edge. Candidates are visited in `Outcome::PRIORITY`
/// order and only a strictly larger edge replaces the current best, so
/// ties resolve Home > Draw > Away whatever order the slice is in.
pub fn best_edge(edges: &[OutcomeEdge]) -> Option<OutcomeEdge> {
    let mut best: Option<OutcomeEdge> = None;
    for outcome in Outcome::PRIORITY {
        if let Some(candidate) = edges.iter().find(|e| e.outcome == *outcome) {
            match best {
                Some(current) if candidate.edge <= current.edge => {}
                _ => best = Some(*candidate),
            }
        }
    }
    best
}

/// Stateless edge evaluator for one sport.
pub struct EdgeEvaluator {
    sport: Sport,
}

impl EdgeEvaluator {
    pub fn new(sport: Sport) -> Self {
        Self { sport }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    /// Evaluate a probability vector (model class order) against the
    /// quoted odds.
    pub fn evaluate(
        &self,
        fixture: &str,
        probabilities: &[f64],
        odds: &MarketOdds,
    ) -> Result<EdgeEstimate, EngineError> {
        let classes = self.sport.outcome_classes();
        if probabilities.len() != classes.len() {
            return Err(EngineError::ProbabilityShape {
                sport: self.sport,
                expected: classes.len(),
                got: probabilities.len(),
            });
        }

        let mut edges = Vec::with_capacity(classes.len());
        for (&outcome, &probability) in classes.iter().zip(probabilities) {
            if !(0.0..=1.0).contains(&probability) {
                return Err(EngineError::InvalidProbability { outcome, value: probability });
            }
            let quoted = odds.for_outcome(outcome).ok_or_else(|| EngineError::MissingOdds {
                fixture: fixture.to_string(),
                outcome,
            })?;
            if !(quoted > 1.0) {
                return Err(EngineError::InvalidOdds {
                    fixture: fixture.to_string(),
                    outcome,
                    odds: quoted,
                });
            }
            let implied = 1.0 / quoted;
            edges.push(OutcomeEdge {
                outcome,
                probability,
                odds: quoted,
                implied,
                edge: probability - implied,
            });
        }
        edges.sort_by_key(|e| priority_rank(e.outcome));

        let pick = best_edge(&edges).ok_or(EngineError::ProbabilityShape {
            sport: self.sport,
            expected: classes.len(),
            got: 0,
        })?;

        debug!(
            fixture,
            pick = %pick.outcome,
            edge = format!("{:.2}%", pick.edge * 100.0),
            odds = pick.odds,
            "Edge evaluated"
        );

        Ok(EdgeEstimate { pick, outcomes: edges })
    }
}

fn priority_rank(outcome: Outcome) -> usize {
    Outcome::PRIORITY
        .iter()
        .position(|o| *o == outcome)
        .unwrap_or(Outcome::PRIORITY.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
