//! Probability model boundary.
//!
//! The engine never trains or loads a model itself. It hands each
//! candidate's feature vector to a `ProbabilityModel` and gets back one
//! probability per outcome, in the sport's class order
//! (`Sport::outcome_classes`). Values are not renormalized.

pub mod precomputed;

use anyhow::Result;

use crate::data::features::FeatureVector;

/// Abstraction over the outcome-probability source.
#[cfg_attr(test, mockall::automock)]
pub trait ProbabilityModel: Send + Sync {
    /// Probabilities for one candidate, in class order.
    fn predict(&self, features: &FeatureVector) -> Result<Vec<f64>>;
}

pub use precomputed::PrecomputedModel;
