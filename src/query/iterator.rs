//! Document-at-a-time traversal primitives.
//!
//! Every node of an initialized query tree is a [`DocIterator`]: a cursor
//! over ascending document ids that only ever moves forward. Combinators
//! decide whether they match a document through a [`MatchPolicy`].

use serde::{Deserialize, Serialize};

use crate::posting::{DocId, InvertedList, Position, Posting};

/// How a node decides that it matches the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Every child is positioned on the same document.
    All,
    /// At least one child is positioned on the smallest current document.
    Min,
    /// Single-child passthrough.
    First,
}

/// Forward-only cursor over ascending document ids.
pub trait DocIterator {
    /// Whether the cursor currently satisfies its match policy.
    ///
    /// Lagging children may be moved forward to a candidate document, but
    /// never past a document this node would match.
    fn has_match(&mut self) -> bool;

    /// The document found by the last successful [`has_match`](Self::has_match).
    fn get_match(&self) -> Option<DocId>;

    /// Move strictly past `doc_id`.
    fn advance_past(&mut self, doc_id: DocId);

    /// Move to the first document `>= doc_id`.
    fn advance_to(&mut self, doc_id: DocId);

    /// Whether the node sits on `doc_id` after its last `has_match`.
    fn matches(&self, doc_id: DocId) -> bool {
        self.get_match() == Some(doc_id)
    }
}

/// Bring every iterator onto the same document using a running maximum.
///
/// Returns `None` as soon as any iterator is exhausted.
pub fn synchronize_all<I: DocIterator>(iterators: &mut [I]) -> Option<DocId> {
    if iterators.is_empty() {
        return None;
    }

    let mut candidate: DocId = 0;
    loop {
        for iterator in iterators.iter_mut() {
            iterator.advance_to(candidate);
            if !iterator.has_match() {
                return None;
            }
            candidate = candidate.max(iterator.get_match()?);
        }

        if iterators.iter().all(|iterator| iterator.matches(candidate)) {
            return Some(candidate);
        }
    }
}

/// The smallest document any iterator sits on, or `None` when all are exhausted.
pub fn min_match<I: DocIterator>(iterators: &mut [I]) -> Option<DocId> {
    let mut min = None;
    for iterator in iterators.iter_mut() {
        if iterator.has_match() {
            if let Some(doc_id) = iterator.get_match() {
                min = Some(min.map_or(doc_id, |current: DocId| current.min(doc_id)));
            }
        }
    }
    min
}

/// Cursor over the postings of an [`InvertedList`].
#[derive(Debug, Clone, Default)]
pub struct DocCursor {
    index: usize,
}

impl DocCursor {
    /// Create a cursor at the start of a list.
    pub fn new() -> Self {
        DocCursor { index: 0 }
    }

    /// The posting under the cursor.
    pub fn posting<'a>(&self, list: &'a InvertedList) -> Option<&'a Posting> {
        list.get(self.index)
    }

    /// Whether the cursor has run off the end of `list`.
    pub fn is_exhausted(&self, list: &InvertedList) -> bool {
        self.index >= list.len()
    }

    /// Move strictly past `doc_id`.
    pub fn advance_past(&mut self, list: &InvertedList, doc_id: DocId) {
        let postings = list.postings();
        while self.index < postings.len() && postings[self.index].doc_id <= doc_id {
            self.index += 1;
        }
    }

    /// Move to the first posting with a document `>= doc_id`.
    pub fn advance_to(&mut self, list: &InvertedList, doc_id: DocId) {
        let postings = list.postings();
        while self.index < postings.len() && postings[self.index].doc_id < doc_id {
            self.index += 1;
        }
    }
}

/// Cursor over the positions of one posting.
///
/// Borrowed for the duration of one document during proximity evaluation.
#[derive(Debug, Clone, Copy)]
pub struct LocationCursor<'a> {
    positions: &'a [Position],
    index: usize,
}

impl<'a> LocationCursor<'a> {
    /// Create a cursor over a position list.
    pub fn new(positions: &'a [Position]) -> Self {
        LocationCursor {
            positions,
            index: 0,
        }
    }

    /// The current position, or `None` when exhausted.
    pub fn current(&self) -> Option<Position> {
        self.positions.get(self.index).copied()
    }

    /// Move to the next position.
    pub fn advance(&mut self) {
        if self.index < self.positions.len() {
            self.index += 1;
        }
    }

    /// Move to the first position strictly greater than `position`.
    pub fn advance_past(&mut self, position: Position) {
        while self.index < self.positions.len() && self.positions[self.index] <= position {
            self.index += 1;
        }
    }

    /// Whether every position has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.positions.len()
    }
}
