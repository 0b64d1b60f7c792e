//! End-to-end evaluation of queries over an in-memory index.

use std::sync::Arc;

use proxima::error::Result;
use proxima::model::{Bm25Params, Bm25Scorer, CombineOp, IndriParams};
use proxima::prelude::*;
use proxima::query::PostingSource;

/// Tokens with the given term frequencies.
fn tokens(counts: &[(&str, usize)]) -> Vec<String> {
    counts
        .iter()
        .flat_map(|(term, count)| std::iter::repeat_n(term.to_string(), *count))
        .collect()
}

/// Documents 0..=9 with term a in {1, 2, 5}, b in {2, 5, 9} and c in {2, 4, 5}.
fn boolean_index() -> Result<Arc<dyn IndexReader>> {
    let docs: Vec<Vec<(&str, usize)>> = vec![
        vec![("x", 1)],
        vec![("a", 2)],
        vec![("a", 3), ("b", 1), ("c", 2)],
        vec![("x", 2)],
        vec![("c", 1)],
        vec![("a", 2), ("b", 3), ("c", 2)],
        vec![("x", 1)],
        vec![("x", 1)],
        vec![("x", 1)],
        vec![("b", 1)],
    ];

    let mut index = MemoryIndex::new();
    for (i, counts) in docs.iter().enumerate() {
        index.add_tokenized(&format!("doc-{i}"), &[("body", tokens(counts))])?;
    }
    Ok(Arc::new(index))
}

fn abc(op: CombineOp) -> QueryNode {
    QueryNode::combine(
        op,
        vec![
            QueryNode::term("body", "a"),
            QueryNode::term("body", "b"),
            QueryNode::term("body", "c"),
        ],
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn text_index() -> Result<Arc<dyn IndexReader>> {
    init_tracing();
    let mut index = MemoryIndex::new();
    index.add_document("apple-pie", &[("body", "warm apple pie with a flaky crust")])?;
    index.add_document("cherry-pie", &[("body", "cherry pie and apple cider")])?;
    index.add_document("crumble", &[("body", "apple crumble without a crust")])?;
    index.add_document("salad", &[("body", "green salad")])?;
    index.add_document(
        "recipes",
        &[("body", "apple pie apple tart and apple crumble recipes")],
    )?;
    Ok(Arc::new(index))
}

#[test]
fn test_boolean_and_scenario() -> Result<()> {
    let index = boolean_index()?;

    let unranked = Evaluator::new(index.clone(), EvaluatorConfig::default())?;
    let results = unranked.evaluate(abc(CombineOp::And))?;
    assert_eq!(results.doc_ids(), vec![2, 5]);
    assert!(results.iter().all(|entry| entry.score == 1.0));

    let ranked = Evaluator::new(index, EvaluatorConfig::new(RetrievalModel::RankedBoolean))?;
    let results = ranked.evaluate(abc(CombineOp::And))?;
    assert_eq!(results.doc_ids(), vec![5, 2]);
    assert_eq!(results.get(0).unwrap().score, 2.0);
    assert_eq!(results.get(1).unwrap().score, 1.0);

    Ok(())
}

#[test]
fn test_boolean_or_membership() -> Result<()> {
    let index = boolean_index()?;
    let evaluator = Evaluator::new(index, EvaluatorConfig::new(RetrievalModel::RankedBoolean))?;

    let mut docs = evaluator.evaluate(abc(CombineOp::Or))?.doc_ids();
    docs.sort_unstable();
    assert_eq!(docs, vec![1, 2, 4, 5, 9]);

    Ok(())
}

#[test]
fn test_near_scenario() -> Result<()> {
    let mut tokens = vec!["x".to_string(); 12];
    tokens[1] = "a".to_string();
    tokens[3] = "b".to_string();
    tokens[10] = "a".to_string();
    tokens[11] = "b".to_string();

    let mut index = MemoryIndex::new();
    index.add_tokenized("only", &[("body", tokens)])?;

    let near = QueryNode::near(2, vec![QueryNode::term("body", "a"), QueryNode::term("body", "b")])?;
    let source = PostingSource::build(&near, &index)?;
    assert_eq!(source.list().len(), 1);
    assert_eq!(source.list().postings()[0].positions(), &[3, 11]);

    let evaluator = Evaluator::new(Arc::new(index), EvaluatorConfig::new(RetrievalModel::RankedBoolean))?;
    let results = evaluator.evaluate(near)?;
    assert_eq!(results.doc_ids(), vec![0]);
    assert_eq!(results.get(0).unwrap().score, 2.0);

    Ok(())
}

#[test]
fn test_proximity_inside_combinators() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(index, EvaluatorConfig::new(RetrievalModel::UnrankedBoolean))?;

    let query = QueryNode::and(vec![
        QueryNode::near(1, vec![QueryNode::term("body", "apple"), QueryNode::term("body", "pie")])?,
        QueryNode::window(5, vec![QueryNode::term("body", "crust"), QueryNode::term("body", "pie")])?,
    ]);
    assert_eq!(evaluator.evaluate(query)?.doc_ids(), vec![0]);

    Ok(())
}

#[test]
fn test_bm25_reference_values() -> Result<()> {
    let scorer = Bm25Scorer::new(Bm25Params {
        k1: 1.2,
        b: 0.75,
        k3: 0.0,
    })?;

    assert!((scorer.rsj(1000, 10) - 4.544).abs() < 0.01);
    assert!((scorer.tf_weight(3, 50, 40.0) - 0.678).abs() < 0.01);
    assert_eq!(scorer.query_weight(), 1.0);
    assert!((scorer.score(3, 10, 1000, 50, 40.0) - 3.08).abs() < 0.01);

    Ok(())
}

#[test]
fn test_bm25_ranking() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(
        index,
        EvaluatorConfig::new(RetrievalModel::Bm25(Bm25Params::default())),
    )?;

    let results = evaluator.evaluate(QueryNode::sum(vec![
        QueryNode::term("body", "crust"),
        QueryNode::term("body", "cider"),
    ]))?;
    let mut docs = results.doc_ids();
    docs.sort_unstable();
    assert_eq!(docs, vec![0, 1, 2]);
    assert!(results.iter().all(|entry| entry.score > 0.0));

    Ok(())
}

#[test]
fn test_bm25_rejects_boolean_operators() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(
        index,
        EvaluatorConfig::new(RetrievalModel::Bm25(Bm25Params::default())),
    )?;

    let err = evaluator
        .evaluate(QueryNode::and(vec![QueryNode::term("body", "apple")]))
        .unwrap_err();
    assert!(err.is_config());

    let err = evaluator
        .evaluate(QueryNode::or(vec![QueryNode::term("body", "apple")]))
        .unwrap_err();
    assert!(err.is_config());

    Ok(())
}

#[test]
fn test_indri_scores_in_unit_interval() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(
        index,
        EvaluatorConfig::new(RetrievalModel::Indri(IndriParams {
            mu: 100.0,
            lambda: 0.3,
        })),
    )?;

    for op in [CombineOp::And, CombineOp::Or] {
        let query = QueryNode::combine(
            op,
            vec![
                QueryNode::term("body", "apple"),
                QueryNode::term("body", "crust"),
                QueryNode::term("body", "salad"),
            ],
        );
        let results = evaluator.evaluate(query)?;
        assert_eq!(results.len(), 5, "{op} should match every document");
        for entry in &results {
            assert!(
                (0.0..=1.0).contains(&entry.score),
                "{op} score {} out of range",
                entry.score
            );
        }
    }

    Ok(())
}

#[test]
fn test_indri_wand_prefers_heavy_term() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(
        index,
        EvaluatorConfig::new(RetrievalModel::Indri(IndriParams {
            mu: 10.0,
            lambda: 0.2,
        })),
    )?;

    let query = QueryNode::wand(vec![
        (0.9, QueryNode::term("body", "salad")),
        (0.1, QueryNode::term("body", "apple")),
    ])?;
    let results = evaluator.evaluate(query)?;
    assert_eq!(results.get(0).unwrap().doc_id, 3);

    Ok(())
}

#[test]
fn test_wand_weight_mismatch_for_every_model() -> Result<()> {
    let index = text_index()?;
    let models = [
        RetrievalModel::UnrankedBoolean,
        RetrievalModel::RankedBoolean,
        RetrievalModel::Bm25(Bm25Params::default()),
        RetrievalModel::Indri(IndriParams::default()),
    ];

    for model in models {
        let evaluator = Evaluator::new(index.clone(), EvaluatorConfig::new(model.clone()))?;
        let query = QueryNode::Combine {
            op: CombineOp::WeightedAnd,
            weights: vec![1.0],
            args: vec![QueryNode::term("body", "apple"), QueryNode::term("body", "pie")],
        };
        let err = evaluator.evaluate(query).unwrap_err();
        assert!(err.is_config(), "{model:?} accepted mismatched weights");
    }

    Ok(())
}

#[test]
fn test_reevaluation_is_identical() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(
        index,
        EvaluatorConfig::new(RetrievalModel::Indri(IndriParams::default())),
    )?;
    let query = QueryNode::and(vec![
        QueryNode::term("body", "apple"),
        QueryNode::window(3, vec![QueryNode::term("body", "pie"), QueryNode::term("body", "apple")])?,
    ]);

    let first = evaluator.evaluate(query.clone())?;
    let second = evaluator.evaluate(query)?;
    assert_eq!(first.doc_ids(), second.doc_ids());
    for (a, b) in first.iter().zip(second.iter()) {
        assert!((a.score - b.score).abs() < 1e-12);
    }

    Ok(())
}

#[test]
fn test_external_driver_protocol() -> Result<()> {
    let index = text_index()?;
    let mut tree = QueryTree::new(QueryNode::or(vec![
        QueryNode::term("body", "cider"),
        QueryNode::term("body", "salad"),
    ]));
    tree.initialize(&RetrievalModel::UnrankedBoolean, index)?;

    let mut docs = Vec::new();
    while tree.has_match() {
        let doc_id = tree.get_match().unwrap();
        docs.push((doc_id, tree.score()?));
        tree.advance_past(doc_id);
    }
    assert_eq!(docs, vec![(1, 1.0), (3, 1.0)]);
    assert_eq!(tree.default_score(0)?, 0.0);

    Ok(())
}

#[test]
fn test_empty_proximity_nested_in_proximity() -> Result<()> {
    let index = text_index()?;
    let evaluator = Evaluator::new(index, EvaluatorConfig::new(RetrievalModel::RankedBoolean))?;

    let query = QueryNode::near(
        2,
        vec![QueryNode::near(1, Vec::new())?, QueryNode::term("body", "apple")],
    )?;
    assert!(evaluator.evaluate(query)?.is_empty());

    Ok(())
}
