//! A query operator tree bound to a retrieval model and an index.

use std::sync::Arc;

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::model::{RetrievalModel, Scorer};
use crate::posting::DocId;
use crate::query::combinator::{ScoreContext, ScoreNode};
use crate::query::iterator::DocIterator;
use crate::query::node::QueryNode;

struct Bound {
    root: ScoreNode,
    scorer: Arc<dyn Scorer>,
    index: Arc<dyn IndexReader>,
}

/// One query's operator tree and its iteration state.
///
/// A tree is initialized exactly once. Afterwards it is a [`DocIterator`]
/// over the documents the root matches, and [`QueryTree::score`] scores the
/// current one.
///
/// ```
/// use std::sync::Arc;
///
/// use proxima::index::MemoryIndex;
/// use proxima::model::RetrievalModel;
/// use proxima::query::{DocIterator, QueryNode, QueryTree};
///
/// let mut index = MemoryIndex::new();
/// index.add_document("d0", &[("body", "red apple")]).unwrap();
/// index.add_document("d1", &[("body", "green apple pie")]).unwrap();
///
/// let query = QueryNode::and(vec![QueryNode::term("body", "apple"), QueryNode::term("body", "pie")]);
/// let mut tree = QueryTree::new(query);
/// tree.initialize(&RetrievalModel::RankedBoolean, Arc::new(index)).unwrap();
///
/// assert!(tree.has_match());
/// assert_eq!(tree.get_match(), Some(1));
/// assert_eq!(tree.score().unwrap(), 1.0);
/// ```
pub struct QueryTree {
    query: QueryNode,
    bound: Option<Bound>,
}

impl QueryTree {
    /// Wrap a parsed query.
    pub fn new(query: QueryNode) -> Self {
        QueryTree { query, bound: None }
    }

    /// The query this tree evaluates.
    pub fn query(&self) -> &QueryNode {
        &self.query
    }

    /// Resolve leaves against `index`, evaluate proximity operators and fix
    /// every combinator's match policy for `model`.
    pub fn initialize(&mut self, model: &RetrievalModel, index: Arc<dyn IndexReader>) -> Result<()> {
        self.initialize_with(model.scorer()?, index)
    }

    /// Like [`initialize`](Self::initialize), with an already selected scorer.
    pub fn initialize_with(
        &mut self,
        scorer: Arc<dyn Scorer>,
        index: Arc<dyn IndexReader>,
    ) -> Result<()> {
        if self.bound.is_some() {
            return Err(ProximaError::config(format!(
                "query {} is already initialized",
                self.query
            )));
        }

        let root = ScoreNode::build(&self.query, scorer.as_ref(), index.as_ref())?;
        tracing::debug!(query = %self.query, model = scorer.name(), "initialized query");

        self.bound = Some(Bound {
            root,
            scorer,
            index,
        });
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// The initialized root node.
    pub fn root(&self) -> Option<&ScoreNode> {
        self.bound.as_ref().map(|bound| &bound.root)
    }

    /// Scoring context of the initialized tree.
    pub fn context(&self) -> Result<ScoreContext<'_>> {
        let bound = self.bound()?;
        Ok(ScoreContext::new(bound.scorer.as_ref(), bound.index.as_ref()))
    }

    /// Score the document the root currently matches.
    pub fn score(&self) -> Result<f64> {
        let bound = self.bound()?;
        bound
            .root
            .score(ScoreContext::new(bound.scorer.as_ref(), bound.index.as_ref()))
    }

    /// Smoothed score of the whole query for a document it does not match.
    pub fn default_score(&self, doc_id: DocId) -> Result<f64> {
        let bound = self.bound()?;
        bound.root.default_score(
            ScoreContext::new(bound.scorer.as_ref(), bound.index.as_ref()),
            doc_id,
        )
    }

    fn bound(&self) -> Result<&Bound> {
        self.bound.as_ref().ok_or_else(|| {
            ProximaError::config(format!("query {} is not initialized", self.query))
        })
    }
}

impl std::fmt::Debug for QueryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTree")
            .field("query", &self.query.to_string())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl DocIterator for QueryTree {
    fn has_match(&mut self) -> bool {
        self.bound.as_mut().is_some_and(|bound| bound.root.has_match())
    }

    fn get_match(&self) -> Option<DocId> {
        self.bound.as_ref().and_then(|bound| bound.root.get_match())
    }

    fn advance_past(&mut self, doc_id: DocId) {
        if let Some(bound) = self.bound.as_mut() {
            bound.root.advance_past(doc_id);
        }
    }

    fn advance_to(&mut self, doc_id: DocId) {
        if let Some(bound) = self.bound.as_mut() {
            bound.root.advance_to(doc_id);
        }
    }
}
