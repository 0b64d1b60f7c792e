//! Query operator trees and their document-at-a-time evaluation.
//!
//! A query is a [`QueryNode`] tree. [`QueryTree::initialize`] resolves its
//! term leaves against an [`IndexReader`](crate::index::IndexReader),
//! materializes proximity operators into inverted lists and fixes each
//! combinator's [`MatchPolicy`] for the chosen retrieval model. The
//! [`Evaluator`] then walks the matched documents in increasing id order and
//! collects their scores into a [`ScoreList`].

pub mod combinator;
pub mod evaluator;
pub mod iterator;
pub mod node;
pub mod proximity;
pub mod score_list;
pub mod source;
pub mod tree;

pub use self::combinator::{Combinator, ScoreContext, ScoreLeaf, ScoreNode};
pub use self::evaluator::{Evaluator, EvaluatorConfig};
pub use self::iterator::{DocCursor, DocIterator, LocationCursor, MatchPolicy};
pub use self::node::QueryNode;
pub use self::proximity::ProximityKind;
pub use self::score_list::{ScoreList, ScoredDoc};
pub use self::source::PostingSource;
pub use self::tree::QueryTree;
