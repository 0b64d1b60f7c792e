//! Scored nodes: the `#SCORE` leaf and the structural combinators.
//!
//! Every scored node has two scoring paths. [`ScoreNode::score`] scores the
//! document the node currently matches; [`ScoreNode::default_score`] gives
//! the score the node contributes to a document it does not match. Language
//! model smoothing depends on the default path composing through every
//! level of the tree, so it is a required method of every node rather than
//! a zero fallback.

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::model::{CombineOp, LeafStats, Scorer};
use crate::posting::DocId;
use crate::query::iterator::{DocIterator, MatchPolicy, min_match, synchronize_all};
use crate::query::node::QueryNode;
use crate::query::source::PostingSource;

/// Everything a node needs to compute a score.
#[derive(Clone, Copy)]
pub struct ScoreContext<'a> {
    /// Scoring capability of the retrieval model.
    pub scorer: &'a dyn Scorer,
    /// Index collaborator for per-document statistics.
    pub index: &'a dyn IndexReader,
}

impl<'a> ScoreContext<'a> {
    /// Create a new scoring context.
    pub fn new(scorer: &'a dyn Scorer, index: &'a dyn IndexReader) -> Self {
        ScoreContext { scorer, index }
    }
}

/// An initialized, scored query node.
#[derive(Debug)]
pub enum ScoreNode {
    /// `#SCORE` over a posting source.
    Leaf(ScoreLeaf),
    /// A structural combinator.
    Combine(Combinator),
}

impl ScoreNode {
    /// Build a scored node for `node`.
    ///
    /// Posting sources in scored position are wrapped in `#SCORE`. Weight
    /// rules are checked before the retrieval model is asked whether it
    /// supports the operator.
    pub fn build(node: &QueryNode, scorer: &dyn Scorer, index: &dyn IndexReader) -> Result<Self> {
        match node {
            QueryNode::Term { .. } | QueryNode::Proximity { .. } => {
                let source = PostingSource::build(node, index)?;
                Ok(ScoreNode::Leaf(ScoreLeaf::new(source, index)?))
            }
            QueryNode::Score(arg) => {
                node.validate()?;
                let source = PostingSource::build(arg, index)?;
                Ok(ScoreNode::Leaf(ScoreLeaf::new(source, index)?))
            }
            QueryNode::Combine { op, weights, args } => {
                node.validate()?;
                let policy = scorer.match_policy(*op)?;
                let children = args
                    .iter()
                    .map(|arg| ScoreNode::build(arg, scorer, index))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ScoreNode::Combine(Combinator::new(
                    *op,
                    weights.clone(),
                    policy,
                    children,
                )))
            }
        }
    }

    /// Score the currently matched document.
    pub fn score(&self, ctx: ScoreContext<'_>) -> Result<f64> {
        match self {
            ScoreNode::Leaf(leaf) => leaf.score(ctx),
            ScoreNode::Combine(combinator) => combinator.score(ctx),
        }
    }

    /// Score contributed to `doc_id` when this node does not match it.
    pub fn default_score(&self, ctx: ScoreContext<'_>, doc_id: DocId) -> Result<f64> {
        match self {
            ScoreNode::Leaf(leaf) => leaf.default_score(ctx, doc_id),
            ScoreNode::Combine(combinator) => combinator.default_score(ctx, doc_id),
        }
    }

    /// Match policy of the node.
    pub fn policy(&self) -> MatchPolicy {
        match self {
            ScoreNode::Leaf(_) => MatchPolicy::First,
            ScoreNode::Combine(combinator) => combinator.policy,
        }
    }
}

impl DocIterator for ScoreNode {
    fn has_match(&mut self) -> bool {
        match self {
            ScoreNode::Leaf(leaf) => leaf.has_match(),
            ScoreNode::Combine(combinator) => combinator.has_match(),
        }
    }

    fn get_match(&self) -> Option<DocId> {
        match self {
            ScoreNode::Leaf(leaf) => leaf.get_match(),
            ScoreNode::Combine(combinator) => combinator.get_match(),
        }
    }

    fn advance_past(&mut self, doc_id: DocId) {
        match self {
            ScoreNode::Leaf(leaf) => leaf.advance_past(doc_id),
            ScoreNode::Combine(combinator) => combinator.advance_past(doc_id),
        }
    }

    fn advance_to(&mut self, doc_id: DocId) {
        match self {
            ScoreNode::Leaf(leaf) => leaf.advance_to(doc_id),
            ScoreNode::Combine(combinator) => combinator.advance_to(doc_id),
        }
    }
}

/// `#SCORE`: turns a posting source into a scored node.
#[derive(Debug)]
pub struct ScoreLeaf {
    source: PostingSource,
    stats: LeafStats,
}

impl ScoreLeaf {
    /// Wrap `source`, computing its document-independent statistics.
    pub fn new(source: PostingSource, index: &dyn IndexReader) -> Result<Self> {
        let field = source.field().to_string();
        let field_stats = index.field_statistics(&field)?;
        let stats = LeafStats {
            df: source.list().df(),
            ctf: source.list().ctf(),
            num_docs: index.num_docs(),
            sum_field_lengths: field_stats.total_terms,
            avg_field_length: field_stats.avg_field_length,
            field,
        };
        Ok(ScoreLeaf { source, stats })
    }

    /// The wrapped posting source.
    pub fn source(&self) -> &PostingSource {
        &self.source
    }

    /// Document-independent statistics.
    pub fn stats(&self) -> &LeafStats {
        &self.stats
    }

    /// Score the current document.
    pub fn score(&self, ctx: ScoreContext<'_>) -> Result<f64> {
        let posting = self.source.current_posting().ok_or_else(|| {
            ProximaError::config(format!("{} scored without a match", self.source.label()))
        })?;
        ctx.scorer
            .score_leaf(&self.stats, posting.frequency(), posting.doc_id, ctx.index)
    }

    /// Smoothed score for a document without postings.
    pub fn default_score(&self, ctx: ScoreContext<'_>, doc_id: DocId) -> Result<f64> {
        ctx.scorer.default_leaf(&self.stats, doc_id, ctx.index)
    }
}

impl DocIterator for ScoreLeaf {
    fn has_match(&mut self) -> bool {
        self.source.has_match()
    }

    fn get_match(&self) -> Option<DocId> {
        self.source.get_match()
    }

    fn advance_past(&mut self, doc_id: DocId) {
        self.source.advance_past(doc_id);
    }

    fn advance_to(&mut self, doc_id: DocId) {
        self.source.advance_to(doc_id);
    }
}

/// `#AND`, `#OR`, `#SUM`, `#WAND` and `#WSUM`.
#[derive(Debug)]
pub struct Combinator {
    op: CombineOp,
    weights: Vec<f64>,
    policy: MatchPolicy,
    children: Vec<ScoreNode>,
    /// Document found by the last `has_match`.
    current: Option<DocId>,
    exhausted: bool,
}

impl Combinator {
    /// Create a combinator over initialized children.
    pub fn new(
        op: CombineOp,
        weights: Vec<f64>,
        policy: MatchPolicy,
        children: Vec<ScoreNode>,
    ) -> Self {
        Combinator {
            op,
            weights,
            policy,
            children,
            current: None,
            exhausted: false,
        }
    }

    /// The operator.
    pub fn op(&self) -> CombineOp {
        self.op
    }

    /// The children.
    pub fn children(&self) -> &[ScoreNode] {
        &self.children
    }

    /// Score the current document. Children that do not sit on it
    /// contribute their default score.
    pub fn score(&self, ctx: ScoreContext<'_>) -> Result<f64> {
        let doc_id = self.current.ok_or_else(|| {
            ProximaError::config(format!("{} scored without a match", self.op))
        })?;

        let scores = self
            .children
            .iter()
            .map(|child| {
                if child.matches(doc_id) {
                    child.score(ctx)
                } else {
                    child.default_score(ctx, doc_id)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        ctx.scorer.combine(self.op, &self.weights, &scores)
    }

    /// Combine the children's default scores for `doc_id`.
    pub fn default_score(&self, ctx: ScoreContext<'_>, doc_id: DocId) -> Result<f64> {
        if self.children.is_empty() {
            return Ok(0.0);
        }

        let defaults = self
            .children
            .iter()
            .map(|child| child.default_score(ctx, doc_id))
            .collect::<Result<Vec<_>>>()?;

        ctx.scorer.combine_default(self.op, &self.weights, &defaults)
    }
}

impl DocIterator for Combinator {
    fn has_match(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if self.current.is_none() {
            self.current = match self.policy {
                MatchPolicy::All => synchronize_all(&mut self.children),
                MatchPolicy::Min => min_match(&mut self.children),
                MatchPolicy::First => self.children.first_mut().and_then(|child| {
                    if child.has_match() { child.get_match() } else { None }
                }),
            };
            self.exhausted = self.current.is_none();
        }
        self.current.is_some()
    }

    fn get_match(&self) -> Option<DocId> {
        self.current
    }

    fn advance_past(&mut self, doc_id: DocId) {
        if self.current.is_some_and(|current| current > doc_id) {
            return;
        }
        self.current = None;
        for child in self.children.iter_mut() {
            child.advance_past(doc_id);
        }
    }

    fn advance_to(&mut self, doc_id: DocId) {
        if self.current.is_some_and(|current| current >= doc_id) {
            return;
        }
        self.current = None;
        for child in self.children.iter_mut() {
            child.advance_to(doc_id);
        }
    }
}
