//! Posting lists used by query evaluation.
//!
//! An [`InvertedList`] is an ordered, append-only sequence of [`Posting`]s.
//! Lists come either from the index collaborator (one per field and term) or
//! from proximity operators, which synthesize a list of their own. Once a
//! list has been handed to a query node it is never modified again.

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};

/// Internal document identifier.
pub type DocId = u32;

/// Token position within a field.
pub type Position = u32;

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document ID.
    pub doc_id: DocId,
    /// Term frequency in the document.
    pub frequency: u32,
    /// Strictly increasing positions of the term in the document.
    pub positions: Vec<Position>,
}

impl Posting {
    /// Create a posting with positions. The frequency is the number of positions.
    pub fn with_positions(doc_id: DocId, positions: Vec<Position>) -> Result<Self> {
        if positions.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ProximaError::data(format!(
                "positions for document {doc_id} are not strictly increasing"
            )));
        }

        Ok(Posting {
            doc_id,
            frequency: positions.len() as u32,
            positions,
        })
    }

    /// Get the term frequency.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Get the positions.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
}

/// A posting list for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedList {
    /// The field the postings were drawn from.
    field: String,
    /// The postings in ascending document order.
    postings: Vec<Posting>,
    /// Collection term frequency (sum of all posting frequencies).
    ctf: u64,
}

impl InvertedList {
    /// Create a new empty posting list.
    pub fn new<F: Into<String>>(field: F) -> Self {
        InvertedList {
            field: field.into(),
            postings: Vec::new(),
            ctf: 0,
        }
    }

    /// Append a posting. Document ids must be strictly increasing.
    pub fn append(&mut self, posting: Posting) -> Result<()> {
        if let Some(last) = self.postings.last() {
            if posting.doc_id <= last.doc_id {
                return Err(ProximaError::data(format!(
                    "posting for document {} appended after document {} in field {}",
                    posting.doc_id, last.doc_id, self.field
                )));
            }
        }
        if posting.frequency as usize != posting.positions.len() {
            return Err(ProximaError::data(format!(
                "posting for document {} has tf {} but {} positions",
                posting.doc_id,
                posting.frequency,
                posting.positions.len()
            )));
        }

        self.ctf += posting.frequency as u64;
        self.postings.push(posting);
        Ok(())
    }

    /// Append a posting built from a document id and its match positions.
    pub fn append_positions(&mut self, doc_id: DocId, positions: Vec<Position>) -> Result<()> {
        self.append(Posting::with_positions(doc_id, positions)?)
    }

    /// The field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the posting at `index`.
    pub fn get(&self, index: usize) -> Option<&Posting> {
        self.postings.get(index)
    }

    /// All postings in document order.
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Document frequency (number of postings).
    pub fn df(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Collection term frequency.
    pub fn ctf(&self) -> u64 {
        self.ctf
    }

    /// Get the length of the posting list.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the posting list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Document ids in list order.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }
}
