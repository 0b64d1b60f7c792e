//! Unevaluated query operator trees.
//!
//! A [`QueryNode`] is what a query parser produces. It carries no iteration
//! state; [`QueryTree::initialize`](crate::query::QueryTree::initialize)
//! turns it into posting sources and scored nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::model::CombineOp;
use crate::query::proximity::ProximityKind;

/// A query operator and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    /// A single term in a field.
    Term { field: String, term: String },
    /// `#NEAR/n` or `#WINDOW/n` over posting-source arguments.
    Proximity {
        kind: ProximityKind,
        span: u32,
        args: Vec<QueryNode>,
    },
    /// Explicit `#SCORE` wrapper turning a posting source into a scored node.
    Score(Box<QueryNode>),
    /// A structural combinator. Weighted operators carry one weight per argument.
    Combine {
        op: CombineOp,
        weights: Vec<f64>,
        args: Vec<QueryNode>,
    },
}

impl QueryNode {
    /// A term leaf.
    pub fn term<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        QueryNode::Term {
            field: field.into(),
            term: term.into(),
        }
    }

    /// `#NEAR/span`.
    pub fn near(span: u32, args: Vec<QueryNode>) -> Result<Self> {
        Self::proximity(ProximityKind::Near, span, args)
    }

    /// `#WINDOW/span`.
    pub fn window(span: u32, args: Vec<QueryNode>) -> Result<Self> {
        Self::proximity(ProximityKind::Window, span, args)
    }

    fn proximity(kind: ProximityKind, span: u32, args: Vec<QueryNode>) -> Result<Self> {
        let node = QueryNode::Proximity { kind, span, args };
        node.validate()?;
        Ok(node)
    }

    /// `#SCORE`.
    pub fn score(arg: QueryNode) -> Self {
        QueryNode::Score(Box::new(arg))
    }

    /// `#AND`.
    pub fn and(args: Vec<QueryNode>) -> Self {
        Self::combine(CombineOp::And, args)
    }

    /// `#OR`.
    pub fn or(args: Vec<QueryNode>) -> Self {
        Self::combine(CombineOp::Or, args)
    }

    /// `#SUM`.
    pub fn sum(args: Vec<QueryNode>) -> Self {
        Self::combine(CombineOp::Sum, args)
    }

    /// An unweighted combinator.
    pub fn combine(op: CombineOp, args: Vec<QueryNode>) -> Self {
        QueryNode::Combine {
            op,
            weights: Vec::new(),
            args,
        }
    }

    /// `#WAND` from (weight, argument) pairs.
    pub fn wand(pairs: Vec<(f64, QueryNode)>) -> Result<Self> {
        Self::weighted(CombineOp::WeightedAnd, pairs)
    }

    /// `#WSUM` from (weight, argument) pairs.
    pub fn wsum(pairs: Vec<(f64, QueryNode)>) -> Result<Self> {
        Self::weighted(CombineOp::WeightedSum, pairs)
    }

    fn weighted(op: CombineOp, pairs: Vec<(f64, QueryNode)>) -> Result<Self> {
        let (weights, args) = pairs.into_iter().unzip();
        let node = QueryNode::Combine { op, weights, args };
        node.validate()?;
        Ok(node)
    }

    /// Whether the node evaluates to an inverted list.
    pub fn is_posting_source(&self) -> bool {
        matches!(self, QueryNode::Term { .. } | QueryNode::Proximity { .. })
    }

    /// Arguments of the node.
    pub fn args(&self) -> &[QueryNode] {
        match self {
            QueryNode::Term { .. } => &[],
            QueryNode::Proximity { args, .. } | QueryNode::Combine { args, .. } => args,
            QueryNode::Score(arg) => std::slice::from_ref(arg.as_ref()),
        }
    }

    /// Check the structural rules that hold for every retrieval model.
    ///
    /// This checks the node itself, not its arguments.
    pub fn validate(&self) -> Result<()> {
        match self {
            QueryNode::Term { .. } => Ok(()),
            QueryNode::Proximity { kind, span, args } => {
                if *span == 0 {
                    return Err(ProximaError::config(format!("{kind}/0 is not a valid span")));
                }
                if let Some(arg) = args.iter().find(|arg| !arg.is_posting_source()) {
                    return Err(ProximaError::config(format!(
                        "{kind}/{span} arguments must be terms or proximity operators, found {arg}"
                    )));
                }
                Ok(())
            }
            QueryNode::Score(arg) => {
                if arg.is_posting_source() {
                    Ok(())
                } else {
                    Err(ProximaError::config(format!(
                        "#SCORE requires a term or proximity operator, found {arg}"
                    )))
                }
            }
            QueryNode::Combine { op, weights, args } => {
                if !op.is_weighted() {
                    return if weights.is_empty() {
                        Ok(())
                    } else {
                        Err(ProximaError::config(format!("{op} does not take weights")))
                    };
                }
                if weights.len() != args.len() {
                    return Err(ProximaError::config(format!(
                        "{op} has {} weights for {} arguments",
                        weights.len(),
                        args.len()
                    )));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(ProximaError::config(format!(
                        "{op} weights must be finite and non-negative"
                    )));
                }
                if !args.is_empty() && weights.iter().sum::<f64>() <= 0.0 {
                    return Err(ProximaError::config(format!("{op} weights sum to zero")));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term { field, term } => write!(f, "{term}.{field}"),
            QueryNode::Proximity { kind, span, args } => {
                write!(f, "{kind}/{span}(")?;
                write_args(f, args.iter().map(|arg| (None, arg)))
            }
            QueryNode::Score(arg) => write!(f, "#SCORE( {arg} )"),
            QueryNode::Combine { op, weights, args } => {
                write!(f, "{op}(")?;
                if op.is_weighted() {
                    write_args(f, args.iter().enumerate().map(|(i, arg)| (weights.get(i), arg)))
                } else {
                    write_args(f, args.iter().map(|arg| (None, arg)))
                }
            }
        }
    }
}

fn write_args<'a>(
    f: &mut fmt::Formatter<'_>,
    args: impl Iterator<Item = (Option<&'a f64>, &'a QueryNode)>,
) -> fmt::Result {
    for (weight, arg) in args {
        match weight {
            Some(weight) => write!(f, " {weight} {arg}")?,
            None => write!(f, " {arg}")?,
        }
    }
    f.write_str(" )")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let query = QueryNode::and(vec![
            QueryNode::term("body", "apple"),
            QueryNode::near(2, vec![QueryNode::term("body", "pie"), QueryNode::term("body", "crust")])
                .unwrap(),
        ]);
        assert_eq!(
            query.to_string(),
            "#AND( apple.body #NEAR/2( pie.body crust.body ) )"
        );

        let wand = QueryNode::wand(vec![(0.7, QueryNode::term("title", "a")), (0.3, QueryNode::term("body", "b"))])
            .unwrap();
        assert_eq!(wand.to_string(), "#WAND( 0.7 a.title 0.3 b.body )");
    }

    #[test]
    fn test_zero_span_rejected() {
        assert!(QueryNode::near(0, vec![QueryNode::term("body", "a")]).unwrap_err().is_config());
        assert!(QueryNode::window(0, Vec::new()).unwrap_err().is_config());
    }

    #[test]
    fn test_proximity_arguments_must_be_sources() {
        let err = QueryNode::near(3, vec![QueryNode::and(vec![QueryNode::term("body", "a")])])
            .unwrap_err();
        assert!(err.is_config());

        let nested = QueryNode::window(
            4,
            vec![
                QueryNode::near(1, vec![QueryNode::term("body", "a"), QueryNode::term("body", "b")])
                    .unwrap(),
                QueryNode::term("body", "c"),
            ],
        );
        assert!(nested.is_ok());
    }

    #[test]
    fn test_weight_validation() {
        let mismatched = QueryNode::Combine {
            op: CombineOp::WeightedAnd,
            weights: vec![1.0],
            args: vec![QueryNode::term("body", "a"), QueryNode::term("body", "b")],
        };
        assert!(mismatched.validate().unwrap_err().is_config());

        let negative = QueryNode::wsum(vec![(-1.0, QueryNode::term("body", "a"))]);
        assert!(negative.unwrap_err().is_config());

        let zero = QueryNode::wand(vec![(0.0, QueryNode::term("body", "a"))]);
        assert!(zero.unwrap_err().is_config());

        let unweighted = QueryNode::Combine {
            op: CombineOp::And,
            weights: vec![1.0],
            args: vec![QueryNode::term("body", "a")],
        };
        assert!(unweighted.validate().is_err());
    }

    #[test]
    fn test_score_requires_source() {
        assert!(QueryNode::score(QueryNode::term("body", "a")).validate().is_ok());
        assert!(QueryNode::score(QueryNode::or(Vec::new())).validate().is_err());
    }

    #[test]
    fn test_args() {
        let query = QueryNode::score(QueryNode::term("body", "a"));
        assert_eq!(query.args().len(), 1);
        assert!(QueryNode::term("body", "a").args().is_empty());
    }
}
