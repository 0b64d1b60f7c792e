//! Ranked query results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::IndexReader;
use crate::posting::DocId;

/// A scored document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    /// Internal document id.
    pub doc_id: DocId,
    /// Relevance score.
    pub score: f64,
}

/// Descending score under IEEE total order.
fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Documents and their scores.
///
/// Entries may arrive in any order and may repeat a document while they
/// are being gathered. [`ScoreList::sort`] leaves one entry per document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreList {
    entries: Vec<ScoredDoc>,
}

impl ScoreList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document.
    pub fn add(&mut self, doc_id: DocId, score: f64) {
        self.entries.push(ScoredDoc { doc_id, score });
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at rank `index`.
    pub fn get(&self, index: usize) -> Option<&ScoredDoc> {
        self.entries.get(index)
    }

    /// Iterate in current order.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredDoc> {
        self.entries.iter()
    }

    /// Document ids in current order.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.entries.iter().map(|entry| entry.doc_id).collect()
    }

    /// Keep the best entry per document, then order by descending score and
    /// ascending document id.
    pub fn sort(&mut self) {
        self.dedup();
        self.entries.sort_by(|a, b| {
            by_score_desc(a.score, b.score).then_with(|| a.doc_id.cmp(&b.doc_id))
        });
    }

    /// Like [`sort`](Self::sort), but ties are broken by ascending external id.
    pub fn sort_by_external_id(&mut self, index: &dyn IndexReader) -> Result<()> {
        self.dedup();
        let external_ids = self
            .entries
            .iter()
            .map(|entry| index.external_id(entry.doc_id))
            .collect::<Result<Vec<_>>>()?;

        let mut keyed: Vec<_> = external_ids.into_iter().zip(self.entries.drain(..)).collect();
        keyed.sort_by(|(a_id, a), (b_id, b)| {
            by_score_desc(a.score, b.score).then_with(|| a_id.cmp(b_id))
        });
        self.entries = keyed.into_iter().map(|(_, entry)| entry).collect();
        Ok(())
    }

    /// Keep only the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    fn dedup(&mut self) {
        self.entries.sort_by(|a, b| {
            a.doc_id.cmp(&b.doc_id).then_with(|| by_score_desc(a.score, b.score))
        });
        self.entries.dedup_by_key(|entry| entry.doc_id);
    }
}

impl<'a> IntoIterator for &'a ScoreList {
    type Item = &'a ScoredDoc;
    type IntoIter = std::slice::Iter<'a, ScoredDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;

    #[test]
    fn test_sort_descending_with_doc_id_ties() {
        let mut list = ScoreList::new();
        list.add(4, 1.0);
        list.add(2, 3.0);
        list.add(9, 1.0);
        list.add(1, 1.0);

        list.sort();
        assert_eq!(list.doc_ids(), vec![2, 1, 4, 9]);
        assert_eq!(list.get(0).unwrap().score, 3.0);
    }

    #[test]
    fn test_sort_removes_duplicates() {
        let mut list = ScoreList::new();
        list.add(3, 0.5);
        list.add(3, 0.9);
        list.add(1, 0.7);

        list.sort();
        assert_eq!(list.len(), 2);
        assert_eq!(list.doc_ids(), vec![3, 1]);
        assert_eq!(list.get(0).unwrap().score, 0.9);
    }

    #[test]
    fn test_truncate() {
        let mut list = ScoreList::new();
        for doc_id in 0..10 {
            list.add(doc_id, doc_id as f64);
        }
        list.sort();
        list.truncate(3);
        assert_eq!(list.doc_ids(), vec![9, 8, 7]);

        list.truncate(100);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_sort_by_external_id() {
        let mut index = MemoryIndex::new();
        index.add_document("zeta", &[("body", "x")]).unwrap();
        index.add_document("alpha", &[("body", "x")]).unwrap();

        let mut list = ScoreList::new();
        list.add(0, 1.0);
        list.add(1, 1.0);

        list.sort();
        assert_eq!(list.doc_ids(), vec![0, 1]);

        list.sort_by_external_id(&index).unwrap();
        assert_eq!(list.doc_ids(), vec![1, 0]);

        list.add(5, 1.0);
        assert!(list.sort_by_external_id(&index).is_err());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_sort_with_nan_scores() {
        let nan = f64::NAN.abs();
        let mut list = ScoreList::new();
        list.add(0, 0.5);
        list.add(1, nan);
        list.add(2, 2.0);
        list.add(3, nan);
        list.add(4, 1.0);

        list.sort();
        assert_eq!(list.len(), 5);
        assert_eq!(list.doc_ids(), vec![1, 3, 2, 4, 0]);
    }

    #[test]
    fn test_empty() {
        let mut list = ScoreList::new();
        list.sort();
        assert!(list.is_empty());
        assert_eq!((&list).into_iter().count(), 0);
    }
}
