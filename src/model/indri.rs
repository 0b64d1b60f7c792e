//! Indri query likelihood with Dirichlet and Jelinek-Mercer smoothing.

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::model::{CombineOp, LeafStats, Scorer, normalized};
use crate::posting::DocId;
use crate::query::iterator::MatchPolicy;

/// Indri smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndriParams {
    /// Dirichlet prior.
    pub mu: f64,
    /// Weight of the collection model.
    pub lambda: f64,
}

impl Default for IndriParams {
    fn default() -> Self {
        IndriParams {
            mu: 2500.0,
            lambda: 0.4,
        }
    }
}

impl IndriParams {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.mu.is_finite() || self.mu < 0.0 {
            return Err(ProximaError::config(format!("Indri mu must be >= 0, got {}", self.mu)));
        }
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(ProximaError::config(format!(
                "Indri lambda must be in [0, 1], got {}",
                self.lambda
            )));
        }
        Ok(())
    }
}

/// Indri scorer.
///
/// Every node has a smoothed default score, so AND matches a document as
/// soon as any argument does.
#[derive(Debug, Clone)]
pub struct IndriScorer {
    params: IndriParams,
}

impl IndriScorer {
    /// Create a scorer after validating `params`.
    pub fn new(params: IndriParams) -> Result<Self> {
        params.validate()?;
        Ok(IndriScorer { params })
    }

    /// Get the parameters.
    pub fn params(&self) -> &IndriParams {
        &self.params
    }

    /// Smoothed probability of a term with frequency `tf` in a field of
    /// `doc_length` tokens.
    pub fn probability(&self, tf: u32, mle: f64, doc_length: u64) -> f64 {
        let IndriParams { mu, lambda } = self.params;
        let denominator = doc_length as f64 + mu;
        let dirichlet = if denominator > 0.0 {
            (tf as f64 + mu * mle) / denominator
        } else {
            0.0
        };
        (1.0 - lambda) * dirichlet + lambda * mle
    }
}

impl Scorer for IndriScorer {
    fn name(&self) -> &'static str {
        "Indri"
    }

    fn default_operator(&self) -> CombineOp {
        CombineOp::And
    }

    fn match_policy(&self, op: CombineOp) -> Result<MatchPolicy> {
        match op {
            CombineOp::And | CombineOp::Or | CombineOp::WeightedAnd | CombineOp::WeightedSum => {
                Ok(MatchPolicy::Min)
            }
            CombineOp::Sum => Err(ProximaError::unsupported(self.name(), op.name())),
        }
    }

    fn score_leaf(
        &self,
        stats: &LeafStats,
        tf: u32,
        doc_id: DocId,
        index: &dyn IndexReader,
    ) -> Result<f64> {
        let doc_length = index.field_length(&stats.field, doc_id)?;
        Ok(self.probability(tf, stats.mle(), doc_length))
    }

    fn default_leaf(&self, stats: &LeafStats, doc_id: DocId, index: &dyn IndexReader) -> Result<f64> {
        self.score_leaf(stats, 0, doc_id, index)
    }

    fn combine(&self, op: CombineOp, weights: &[f64], scores: &[f64]) -> Result<f64> {
        match op {
            CombineOp::And => {
                let product: f64 = scores.iter().product();
                Ok(product.powf(1.0 / scores.len() as f64))
            }
            CombineOp::Or => {
                let miss: f64 = scores.iter().map(|score| 1.0 - score).product();
                Ok(1.0 - miss)
            }
            CombineOp::WeightedAnd => Ok(normalized(weights)
                .zip(scores)
                .map(|(weight, score)| score.powf(weight))
                .product()),
            CombineOp::WeightedSum => Ok(normalized(weights)
                .zip(scores)
                .map(|(weight, score)| weight * score)
                .sum()),
            CombineOp::Sum => Err(ProximaError::unsupported(self.name(), op.name())),
        }
    }
}
