//! Exact-match Boolean retrieval models.

use crate::error::{ProximaError, Result};
use crate::index::IndexReader;
use crate::model::{CombineOp, LeafStats, Scorer};
use crate::posting::DocId;
use crate::query::iterator::MatchPolicy;

fn boolean_policy(model: &str, op: CombineOp) -> Result<MatchPolicy> {
    match op {
        CombineOp::And => Ok(MatchPolicy::All),
        CombineOp::Or => Ok(MatchPolicy::Min),
        _ => Err(ProximaError::unsupported(model, op.name())),
    }
}

/// Every match scores 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrankedBooleanScorer;

impl Scorer for UnrankedBooleanScorer {
    fn name(&self) -> &'static str {
        "UnrankedBoolean"
    }

    fn default_operator(&self) -> CombineOp {
        CombineOp::Or
    }

    fn match_policy(&self, op: CombineOp) -> Result<MatchPolicy> {
        boolean_policy(self.name(), op)
    }

    fn score_leaf(&self, _: &LeafStats, _: u32, _: DocId, _: &dyn IndexReader) -> Result<f64> {
        Ok(1.0)
    }

    fn default_leaf(&self, _: &LeafStats, _: DocId, _: &dyn IndexReader) -> Result<f64> {
        Ok(0.0)
    }

    fn combine(&self, op: CombineOp, _: &[f64], _: &[f64]) -> Result<f64> {
        boolean_policy(self.name(), op)?;
        Ok(1.0)
    }

    fn combine_default(&self, op: CombineOp, _: &[f64], _: &[f64]) -> Result<f64> {
        boolean_policy(self.name(), op)?;
        Ok(0.0)
    }
}

/// Leaves score their term frequency; AND takes the minimum, OR the maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedBooleanScorer;

impl Scorer for RankedBooleanScorer {
    fn name(&self) -> &'static str {
        "RankedBoolean"
    }

    fn default_operator(&self) -> CombineOp {
        CombineOp::Or
    }

    fn match_policy(&self, op: CombineOp) -> Result<MatchPolicy> {
        boolean_policy(self.name(), op)
    }

    fn score_leaf(&self, _: &LeafStats, tf: u32, _: DocId, _: &dyn IndexReader) -> Result<f64> {
        Ok(tf as f64)
    }

    fn default_leaf(&self, _: &LeafStats, _: DocId, _: &dyn IndexReader) -> Result<f64> {
        Ok(0.0)
    }

    fn combine(&self, op: CombineOp, _: &[f64], scores: &[f64]) -> Result<f64> {
        match op {
            CombineOp::And => Ok(scores.iter().copied().reduce(f64::min).unwrap_or(0.0)),
            CombineOp::Or => Ok(scores.iter().copied().fold(0.0, f64::max)),
            _ => Err(ProximaError::unsupported(self.name(), op.name())),
        }
    }

    fn combine_default(&self, op: CombineOp, _: &[f64], _: &[f64]) -> Result<f64> {
        boolean_policy(self.name(), op)?;
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;

    fn stats() -> LeafStats {
        LeafStats {
            field: "body".to_string(),
            df: 1,
            ctf: 4,
            num_docs: 3,
            sum_field_lengths: 30,
            avg_field_length: 10.0,
        }
    }

    #[test]
    fn test_unranked_boolean() {
        let index = MemoryIndex::new();
        let scorer = UnrankedBooleanScorer;

        assert_eq!(scorer.score_leaf(&stats(), 4, 0, &index).unwrap(), 1.0);
        assert_eq!(scorer.default_leaf(&stats(), 0, &index).unwrap(), 0.0);
        assert_eq!(scorer.combine(CombineOp::And, &[], &[1.0, 1.0]).unwrap(), 1.0);
        assert_eq!(scorer.combine(CombineOp::Or, &[], &[1.0, 0.0]).unwrap(), 1.0);
        assert_eq!(scorer.combine_default(CombineOp::And, &[], &[0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_ranked_boolean() {
        let index = MemoryIndex::new();
        let scorer = RankedBooleanScorer;

        assert_eq!(scorer.score_leaf(&stats(), 4, 0, &index).unwrap(), 4.0);
        assert_eq!(scorer.combine(CombineOp::And, &[], &[3.0, 1.0, 2.0]).unwrap(), 1.0);
        assert_eq!(scorer.combine(CombineOp::Or, &[], &[3.0, 0.0, 2.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_boolean_policies() {
        let scorer = RankedBooleanScorer;
        assert_eq!(scorer.match_policy(CombineOp::And).unwrap(), MatchPolicy::All);
        assert_eq!(scorer.match_policy(CombineOp::Or).unwrap(), MatchPolicy::Min);

        for op in [CombineOp::Sum, CombineOp::WeightedAnd, CombineOp::WeightedSum] {
            assert!(scorer.match_policy(op).unwrap_err().is_config());
            assert!(UnrankedBooleanScorer.match_policy(op).unwrap_err().is_config());
            assert!(scorer.combine(op, &[1.0], &[1.0]).is_err());
        }
    }
}
