//! The index collaborator consumed by query evaluation.
//!
//! Query evaluation never owns index storage. Everything it needs (document
//! and field statistics, postings with positions, id translation) is read
//! through the [`IndexReader`] trait. [`MemoryIndex`] is a small in-memory
//! implementation for tests, benchmarks and applications that index
//! pre-tokenized text.

use ahash::{AHashMap, AHashSet};

use crate::error::{ProximaError, Result};
use crate::posting::{DocId, InvertedList, Position};

/// Trait for index readers.
///
/// All lookups are synchronous and side-effect free, so a single reader can
/// be shared by queries running on different threads.
pub trait IndexReader: Send + Sync + std::fmt::Debug {
    /// Get the number of documents in the index.
    fn num_docs(&self) -> u64;

    /// Length (in tokens) of `field` in document `doc_id`.
    fn field_length(&self, field: &str, doc_id: DocId) -> Result<u64>;

    /// Sum of the lengths of `field` across all documents.
    fn sum_of_field_lengths(&self, field: &str) -> Result<u64>;

    /// Number of documents that contain `field`.
    fn doc_count(&self, field: &str) -> Result<u64>;

    /// Collection term frequency of `term` in `field`.
    fn total_term_freq(&self, field: &str, term: &str) -> Result<u64>;

    /// Posting list (with positions) for `term` in `field`. Unknown terms
    /// yield an empty list.
    fn postings(&self, field: &str, term: &str) -> Result<InvertedList>;

    /// External identifier of an internal document id.
    fn external_id(&self, doc_id: DocId) -> Result<String>;

    /// Internal document id of an external identifier.
    fn internal_id(&self, external_id: &str) -> Result<DocId>;

    /// Get field statistics including average field length.
    fn field_statistics(&self, field: &str) -> Result<FieldStatistics> {
        let total_terms = self.sum_of_field_lengths(field)?;
        let doc_count = self.doc_count(field)?;
        let avg_field_length = if doc_count == 0 {
            0.0
        } else {
            total_terms as f64 / doc_count as f64
        };

        Ok(FieldStatistics {
            avg_field_length,
            doc_count,
            total_terms,
        })
    }
}

/// Simplified field statistics for query scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStatistics {
    /// Average field length.
    pub avg_field_length: f64,

    /// Number of documents with this field.
    pub doc_count: u64,

    /// Total number of terms.
    pub total_terms: u64,
}

/// An in-memory positional index.
///
/// Documents receive consecutive internal ids in insertion order, so every
/// posting list is built in ascending document order.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    external_ids: Vec<String>,
    internal_ids: AHashMap<String, DocId>,
    /// Per field, the length of that field in every document.
    field_lengths: AHashMap<String, Vec<u64>>,
    /// Per field, per term, the posting list.
    postings: AHashMap<String, AHashMap<String, InvertedList>>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document whose fields are whitespace-tokenized and lowercased.
    ///
    /// Token positions start at 0 within each field.
    pub fn add_document(&mut self, external_id: &str, fields: &[(&str, &str)]) -> Result<DocId> {
        let tokenized: Vec<(&str, Vec<String>)> = fields
            .iter()
            .map(|(field, text)| {
                let tokens = text.split_whitespace().map(str::to_lowercase).collect();
                (*field, tokens)
            })
            .collect();
        self.add_tokenized(external_id, &tokenized)
    }

    /// Add a document from already tokenized fields.
    pub fn add_tokenized<T: AsRef<str>>(
        &mut self,
        external_id: &str,
        fields: &[(&str, Vec<T>)],
    ) -> Result<DocId> {
        if self.internal_ids.contains_key(external_id) {
            return Err(ProximaError::index(format!(
                "document {external_id} is already indexed"
            )));
        }

        let mut seen = AHashSet::with_capacity(fields.len());
        if let Some((field, _)) = fields.iter().find(|(field, _)| !seen.insert(*field)) {
            return Err(ProximaError::data(format!(
                "field {field} appears more than once in document {external_id}"
            )));
        }

        let doc_id = self.external_ids.len() as DocId;
        self.external_ids.push(external_id.to_string());
        self.internal_ids.insert(external_id.to_string(), doc_id);

        for lengths in self.field_lengths.values_mut() {
            lengths.push(0);
        }

        for (field, tokens) in fields {
            let mut positions: AHashMap<&str, Vec<Position>> = AHashMap::new();
            for (position, token) in tokens.iter().enumerate() {
                positions
                    .entry(token.as_ref())
                    .or_default()
                    .push(position as Position);
            }

            let doc_count = self.external_ids.len();
            let lengths = self
                .field_lengths
                .entry(field.to_string())
                .or_insert_with(|| vec![0; doc_count]);
            lengths[doc_id as usize] += tokens.len() as u64;

            let terms = self.postings.entry(field.to_string()).or_default();
            for (term, term_positions) in positions {
                let list = terms
                    .entry(term.to_string())
                    .or_insert_with(|| InvertedList::new(*field));
                list.append_positions(doc_id, term_positions)?;
            }
        }

        Ok(doc_id)
    }

    fn check_doc(&self, doc_id: DocId) -> Result<()> {
        if (doc_id as usize) < self.external_ids.len() {
            Ok(())
        } else {
            Err(ProximaError::index(format!("unknown document {doc_id}")))
        }
    }
}

impl IndexReader for MemoryIndex {
    fn num_docs(&self) -> u64 {
        self.external_ids.len() as u64
    }

    fn field_length(&self, field: &str, doc_id: DocId) -> Result<u64> {
        self.check_doc(doc_id)?;
        Ok(self
            .field_lengths
            .get(field)
            .and_then(|lengths| lengths.get(doc_id as usize))
            .copied()
            .unwrap_or(0))
    }

    fn sum_of_field_lengths(&self, field: &str) -> Result<u64> {
        Ok(self
            .field_lengths
            .get(field)
            .map(|lengths| lengths.iter().sum())
            .unwrap_or(0))
    }

    fn doc_count(&self, field: &str) -> Result<u64> {
        Ok(self
            .field_lengths
            .get(field)
            .map(|lengths| lengths.iter().filter(|&&len| len > 0).count() as u64)
            .unwrap_or(0))
    }

    fn total_term_freq(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self
            .postings
            .get(field)
            .and_then(|terms| terms.get(term))
            .map(InvertedList::ctf)
            .unwrap_or(0))
    }

    fn postings(&self, field: &str, term: &str) -> Result<InvertedList> {
        Ok(self
            .postings
            .get(field)
            .and_then(|terms| terms.get(term))
            .cloned()
            .unwrap_or_else(|| InvertedList::new(field)))
    }

    fn external_id(&self, doc_id: DocId) -> Result<String> {
        self.check_doc(doc_id)?;
        Ok(self.external_ids[doc_id as usize].clone())
    }

    fn internal_id(&self, external_id: &str) -> Result<DocId> {
        self.internal_ids
            .get(external_id)
            .copied()
            .ok_or_else(|| ProximaError::index(format!("unknown document {external_id}")))
    }
}
