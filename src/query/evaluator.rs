//! Document-at-a-time query evaluation.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::IndexReader;
use crate::model::{RetrievalModel, Scorer};
use crate::query::iterator::DocIterator;
use crate::query::node::QueryNode;
use crate::query::score_list::ScoreList;
use crate::query::tree::QueryTree;

/// Configuration for an [`Evaluator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Retrieval model used to pick match policies and score documents.
    pub model: RetrievalModel,

    /// Maximum number of documents to return.
    /// If None, every matching document is returned.
    pub max_results: Option<usize>,

    /// Wrap each query in the model's default operator.
    pub wrap_default_operator: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            model: RetrievalModel::default(),
            max_results: None,
            wrap_default_operator: true,
        }
    }
}

impl EvaluatorConfig {
    /// Create a config for `model` with default settings.
    pub fn new(model: RetrievalModel) -> Self {
        EvaluatorConfig {
            model,
            ..Default::default()
        }
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the maximum number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Enable or disable default operator wrapping.
    pub fn with_default_operator(mut self, wrap: bool) -> Self {
        self.wrap_default_operator = wrap;
        self
    }
}

/// Evaluates queries against one index under one retrieval model.
#[derive(Debug, Clone)]
pub struct Evaluator {
    index: Arc<dyn IndexReader>,
    scorer: Arc<dyn Scorer>,
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Create an evaluator. Fails if the model parameters are invalid.
    pub fn new(index: Arc<dyn IndexReader>, config: EvaluatorConfig) -> Result<Self> {
        let scorer = config.model.scorer()?;
        Ok(Evaluator {
            index,
            scorer,
            config,
        })
    }

    /// The evaluator configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// The index queries run against.
    pub fn index(&self) -> &Arc<dyn IndexReader> {
        &self.index
    }

    /// Evaluate one query and return its ranked results.
    pub fn evaluate(&self, query: QueryNode) -> Result<ScoreList> {
        let mut tree = QueryTree::new(self.wrap(query));
        tree.initialize_with(self.scorer.clone(), self.index.clone())?;

        let mut results = ScoreList::new();
        while tree.has_match() {
            let Some(doc_id) = tree.get_match() else {
                break;
            };
            results.add(doc_id, tree.score()?);
            tree.advance_past(doc_id);
        }

        results.sort();
        if let Some(max_results) = self.config.max_results {
            results.truncate(max_results);
        }

        tracing::debug!(
            query = %tree.query(),
            model = self.scorer.name(),
            results = results.len(),
            "evaluated query"
        );
        Ok(results)
    }

    /// Evaluate independent queries in parallel.
    ///
    /// Results keep the input order. The first failing query fails the batch.
    pub fn evaluate_batch(&self, queries: Vec<(String, QueryNode)>) -> Result<Vec<(String, ScoreList)>> {
        queries
            .into_par_iter()
            .map(|(id, query)| {
                let results = self.evaluate(query).inspect_err(|e| {
                    tracing::warn!(query_id = %id, error = %e, "query failed");
                })?;
                Ok((id, results))
            })
            .collect()
    }

    fn wrap(&self, query: QueryNode) -> QueryNode {
        if !self.config.wrap_default_operator {
            return query;
        }

        let op = self.scorer.default_operator();
        match query {
            QueryNode::Combine { op: existing, .. } if existing == op => query,
            other => QueryNode::combine(op, vec![other]),
        }
    }
}
