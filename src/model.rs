//! Retrieval models.
//!
//! A [`RetrievalModel`] is plain configuration. Calling
//! [`RetrievalModel::scorer`] validates its parameters and yields the
//! [`Scorer`] capability that a query tree threads through every scoring
//! call. Nodes never inspect which model is in use; they ask the scorer for
//! a match policy once at initialization and delegate every leaf score,
//! default score and combination to it.

pub mod bm25;
pub mod boolean;
pub mod indri;

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::IndexReader;
use crate::posting::DocId;
use crate::query::iterator::MatchPolicy;

pub use self::bm25::{Bm25Params, Bm25Scorer};
pub use self::boolean::{RankedBooleanScorer, UnrankedBooleanScorer};
pub use self::indri::{IndriParams, IndriScorer};

/// Structural combinators that merge child scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombineOp {
    And,
    Or,
    Sum,
    WeightedAnd,
    WeightedSum,
}

impl CombineOp {
    /// Query-language name of the operator.
    pub fn name(&self) -> &'static str {
        match self {
            CombineOp::And => "#AND",
            CombineOp::Or => "#OR",
            CombineOp::Sum => "#SUM",
            CombineOp::WeightedAnd => "#WAND",
            CombineOp::WeightedSum => "#WSUM",
        }
    }

    /// Whether the operator takes one weight per argument.
    pub fn is_weighted(&self) -> bool {
        matches!(self, CombineOp::WeightedAnd | CombineOp::WeightedSum)
    }
}

impl fmt::Display for CombineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Document-independent statistics of one scored posting list.
///
/// Computed once when the leaf is initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafStats {
    /// Field the postings belong to.
    pub field: String,
    /// Number of documents in the posting list.
    pub df: u64,
    /// Collection term frequency.
    pub ctf: u64,
    /// Number of documents in the index.
    pub num_docs: u64,
    /// Sum of the field's length over all documents.
    pub sum_field_lengths: u64,
    /// Average length of the field.
    pub avg_field_length: f64,
}

impl LeafStats {
    /// Maximum-likelihood estimate of the term in its field.
    pub fn mle(&self) -> f64 {
        if self.sum_field_lengths == 0 {
            0.0
        } else {
            self.ctf as f64 / self.sum_field_lengths as f64
        }
    }
}

/// Scoring capability of a retrieval model.
pub trait Scorer: Send + Sync + Debug {
    /// Get the name of this scorer.
    fn name(&self) -> &'static str;

    /// Combinator wrapped around a bare query.
    fn default_operator(&self) -> CombineOp;

    /// Match policy for `op`, or a configuration error when the model
    /// cannot score it.
    fn match_policy(&self, op: CombineOp) -> Result<MatchPolicy>;

    /// Score of a leaf on a document where it matched with frequency `tf`.
    fn score_leaf(
        &self,
        stats: &LeafStats,
        tf: u32,
        doc_id: DocId,
        index: &dyn IndexReader,
    ) -> Result<f64>;

    /// Score of a leaf on a document it does not match.
    fn default_leaf(&self, stats: &LeafStats, doc_id: DocId, index: &dyn IndexReader)
    -> Result<f64>;

    /// Combine child scores of a matched document. Children that do not
    /// match contribute their default score.
    fn combine(&self, op: CombineOp, weights: &[f64], scores: &[f64]) -> Result<f64>;

    /// Combine child default scores for a document the combinator does not
    /// match.
    fn combine_default(&self, op: CombineOp, weights: &[f64], defaults: &[f64]) -> Result<f64> {
        self.combine(op, weights, defaults)
    }
}

/// Retrieval model configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum RetrievalModel {
    #[default]
    UnrankedBoolean,
    RankedBoolean,
    Bm25(Bm25Params),
    Indri(IndriParams),
}

impl RetrievalModel {
    /// Validate the parameters and build the scorer.
    pub fn scorer(&self) -> Result<Arc<dyn Scorer>> {
        Ok(match self {
            RetrievalModel::UnrankedBoolean => Arc::new(UnrankedBooleanScorer),
            RetrievalModel::RankedBoolean => Arc::new(RankedBooleanScorer),
            RetrievalModel::Bm25(params) => Arc::new(Bm25Scorer::new(params.clone())?),
            RetrievalModel::Indri(params) => Arc::new(IndriScorer::new(params.clone())?),
        })
    }
}

/// Weights divided by their sum.
pub(crate) fn normalized(weights: &[f64]) -> impl Iterator<Item = f64> + '_ {
    let total: f64 = weights.iter().sum();
    weights.iter().map(move |w| w / total)
}
