//! # Proxima
//!
//! Document-at-a-time query evaluation over positional inverted indexes.
//!
//! ## Features
//!
//! - Term, `#NEAR/n` and `#WINDOW/n` posting sources
//! - `#AND`, `#OR`, `#SUM`, `#WAND` and `#WSUM` combinators
//! - Unranked and ranked Boolean, BM25 and Indri retrieval models
//! - Smoothed default scores for documents a subtree does not match
//! - Parallel evaluation of independent queries
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use proxima::prelude::*;
//!
//! let mut index = MemoryIndex::new();
//! index.add_document("a", &[("body", "the apple pie was warm")]).unwrap();
//! index.add_document("b", &[("body", "pie made from apple")]).unwrap();
//!
//! let query = QueryNode::near(
//!     2,
//!     vec![QueryNode::term("body", "apple"), QueryNode::term("body", "pie")],
//! )
//! .unwrap();
//!
//! let evaluator = Evaluator::new(
//!     Arc::new(index),
//!     EvaluatorConfig::new(RetrievalModel::RankedBoolean),
//! )
//! .unwrap();
//! let results = evaluator.evaluate(query).unwrap();
//! assert_eq!(results.doc_ids(), vec![0]);
//! ```

pub mod error;
pub mod index;
pub mod model;
pub mod posting;
pub mod query;

pub mod prelude {
    pub use crate::error::{ProximaError, Result};
    pub use crate::index::{IndexReader, MemoryIndex};
    pub use crate::model::{Bm25Params, CombineOp, IndriParams, RetrievalModel, Scorer};
    pub use crate::posting::{DocId, InvertedList, Posting};
    pub use crate::query::{
        DocIterator, Evaluator, EvaluatorConfig, QueryNode, QueryTree, ScoreList,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
