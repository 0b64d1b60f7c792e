//! Okapi BM25 scoring.

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::model::{CombineOp, LeafStats, Scorer, normalized};
use crate::posting::DocId;
use crate::query::iterator::MatchPolicy;

/// BM25 parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f64,
    /// Field length normalization.
    pub b: f64,
    /// Query term frequency saturation.
    pub k3: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params {
            k1: 1.2,
            b: 0.75,
            k3: 0.0,
        }
    }
}

impl Bm25Params {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(ProximaError::config(format!("BM25 k1 must be >= 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(ProximaError::config(format!("BM25 b must be in [0, 1], got {}", self.b)));
        }
        if !self.k3.is_finite() || self.k3 < 0.0 {
            return Err(ProximaError::config(format!("BM25 k3 must be >= 0, got {}", self.k3)));
        }
        Ok(())
    }
}

/// BM25 scorer. Queries always carry a query term frequency of 1.
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    params: Bm25Params,
}

impl Bm25Scorer {
    /// Create a scorer after validating `params`.
    pub fn new(params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Bm25Scorer { params })
    }

    /// Get the parameters.
    pub fn params(&self) -> &Bm25Params {
        &self.params
    }

    /// Robertson-Sparck Jones weight, floored at zero.
    pub fn rsj(&self, num_docs: u64, df: u64) -> f64 {
        let n = num_docs as f64;
        let df = df as f64;
        ((n - df + 0.5) / (df + 0.5)).ln().max(0.0)
    }

    /// Saturated, length-normalized term frequency.
    pub fn tf_weight(&self, tf: u32, doc_length: u64, avg_length: f64) -> f64 {
        let tf = tf as f64;
        let length_ratio = if avg_length > 0.0 {
            doc_length as f64 / avg_length
        } else {
            1.0
        };
        let norm = (1.0 - self.params.b) + self.params.b * length_ratio;
        tf / (tf + self.params.k1 * norm)
    }

    /// Query term weight for a query term frequency of 1.
    pub fn query_weight(&self) -> f64 {
        let qtf = 1.0;
        (self.params.k3 + 1.0) * qtf / (self.params.k3 + qtf)
    }

    /// Full leaf score from raw statistics.
    pub fn score(&self, tf: u32, df: u64, num_docs: u64, doc_length: u64, avg_length: f64) -> f64 {
        self.rsj(num_docs, df) * self.tf_weight(tf, doc_length, avg_length) * self.query_weight()
    }
}

impl Scorer for Bm25Scorer {
    fn name(&self) -> &'static str {
        "BM25"
    }

    fn default_operator(&self) -> CombineOp {
        CombineOp::Sum
    }

    fn match_policy(&self, op: CombineOp) -> Result<MatchPolicy> {
        match op {
            CombineOp::Sum | CombineOp::WeightedSum => Ok(MatchPolicy::Min),
            _ => Err(ProximaError::unsupported(self.name(), op.name())),
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
        Ok(self.score(tf, stats.df, stats.num_docs, doc_length, stats.avg_field_length))
    }

    fn default_leaf(&self, _: &LeafStats, _: DocId, _: &dyn IndexReader) -> Result<f64> {
        // tf = 0 zeroes the tf weight.
        Ok(0.0)
    }

    fn combine(&self, op: CombineOp, weights: &[f64], scores: &[f64]) -> Result<f64> {
        match op {
            CombineOp::Sum => Ok(scores.iter().sum()),
            CombineOp::WeightedSum => Ok(normalized(weights)
                .zip(scores)
                .map(|(weight, score)| weight * score)
                .sum()),
            _ => Err(ProximaError::unsupported(self.name(), op.name())),
        }
    }
}
