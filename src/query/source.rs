//! Posting sources: evaluated nodes that expose an inverted list.
//!
//! A term leaf pulls its list from the index; proximity operators build one
//! from their arguments. Either way the list is fixed once the source exists
//! and only the document cursor moves.

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::posting::{DocId, InvertedList, Posting};
use crate::query::iterator::{DocCursor, DocIterator, LocationCursor};
use crate::query::node::QueryNode;
use crate::query::proximity;

/// An inverted list plus a document cursor.
#[derive(Debug, Clone)]
pub struct PostingSource {
    /// Human-readable origin, e.g. `body:apple` or `#NEAR/2`.
    label: String,
    list: InvertedList,
    cursor: DocCursor,
}

impl PostingSource {
    /// Evaluate a term or proximity node.
    ///
    /// Proximity arguments are evaluated depth first, so the whole subtree
    /// is materialized before this returns.
    pub fn build(node: &QueryNode, index: &dyn IndexReader) -> Result<Self> {
        match node {
            QueryNode::Term { field, term } => Self::from_term(field, term, index),
            QueryNode::Proximity { kind, span, args } => {
                node.validate()?;
                let sources = args
                    .iter()
                    .map(|arg| Self::build(arg, index))
                    .collect::<Result<Vec<_>>>()?;
                let list = proximity::evaluate(*kind, *span, sources)?;
                Ok(Self::from_list(format!("{kind}/{span}"), list))
            }
            other => Err(ProximaError::config(format!(
                "{other} does not produce postings"
            ))),
        }
    }

    /// Resolve the postings of `term` in `field`.
    pub fn from_term(field: &str, term: &str, index: &dyn IndexReader) -> Result<Self> {
        let list = index.postings(field, term)?;
        let label = format!("{field}:{term}");

        if list.is_empty() {
            tracing::warn!(term = %label, "term has no postings");
        } else {
            tracing::debug!(term = %label, df = list.df(), ctf = list.ctf(), "resolved term postings");
        }

        Ok(Self::from_list(label, list))
    }

    /// Wrap an already evaluated list.
    pub fn from_list<L: Into<String>>(label: L, list: InvertedList) -> Self {
        PostingSource {
            label: label.into(),
            list,
            cursor: DocCursor::new(),
        }
    }

    /// Description of where the postings came from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The field of the postings.
    pub fn field(&self) -> &str {
        self.list.field()
    }

    /// The underlying inverted list.
    pub fn list(&self) -> &InvertedList {
        &self.list
    }

    /// The posting under the document cursor.
    pub fn current_posting(&self) -> Option<&Posting> {
        self.cursor.posting(&self.list)
    }

    /// A fresh location cursor over the current posting's positions.
    pub fn location_cursor(&self) -> LocationCursor<'_> {
        LocationCursor::new(self.current_posting().map(Posting::positions).unwrap_or(&[]))
    }

    /// Term frequency on the current document, if any.
    pub fn current_tf(&self) -> Option<u32> {
        self.current_posting().map(Posting::frequency)
    }
}

impl DocIterator for PostingSource {
    fn has_match(&mut self) -> bool {
        !self.cursor.is_exhausted(&self.list)
    }

    fn get_match(&self) -> Option<DocId> {
        self.current_posting().map(|posting| posting.doc_id)
    }

    fn advance_past(&mut self, doc_id: DocId) {
        self.cursor.advance_past(&self.list, doc_id);
    }

    fn advance_to(&mut self, doc_id: DocId) {
        self.cursor.advance_to(&self.list, doc_id);
    }
}
