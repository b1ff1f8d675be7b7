//! Concurrent batch driver for (company, metric) research sessions

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use cres_core::{CompanyMetric, Generation, LlmProvider, SearchProvider, SessionStore};

use crate::engine::{AnswerMode, WorkflowEngine};

/// Outcome of one (company, metric) pair
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Metric(CompanyMetric),
    /// Recorded error payload; a failed pair never aborts the batch
    Failed(String),
}

/// One completed batch cell
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub company: String,
    pub metric: String,
    pub outcome: BatchOutcome,
}

/// Runs one metric-mode session per (company, metric) pair.
///
/// Pairs get distinct thread ids, run concurrently up to the configured
/// limit, and fail independently.
pub struct BatchDriver<S: SearchProvider, L: LlmProvider, K: SessionStore> {
    engine: Arc<WorkflowEngine<S, L, K>>,
    concurrency: usize,
}

impl<S: SearchProvider, L: LlmProvider, K: SessionStore> BatchDriver<S, L, K> {
    pub fn new(engine: Arc<WorkflowEngine<S, L, K>>) -> Self {
        Self {
            engine,
            concurrency: 8,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        assert!(concurrency > 0, "concurrency must be positive");
        self.concurrency = concurrency;
        self
    }

    /// Research every (company, metric) combination.
    ///
    /// Rows are returned in completion order.
    pub async fn run(&self, companies: &[String], metrics: &[String]) -> Vec<BatchRow> {
        let pairs: Vec<(String, String)> = companies
            .iter()
            .flat_map(|company| {
                metrics
                    .iter()
                    .map(move |metric| (company.clone(), metric.clone()))
            })
            .collect();

        tracing::info!(pairs = pairs.len(), "batch processing started");

        stream::iter(pairs.into_iter().map(|(company, metric)| {
            let engine = Arc::clone(&self.engine);
            async move {
                let thread_id = format!("{}{}", company, metric);
                let question = format!("Find {} for {}", metric, company);

                let outcome = match engine.run(&thread_id, &question, AnswerMode::Metric).await {
                    Ok(run) => match run.state.generation {
                        Generation::Metric { metric: extracted } => BatchOutcome::Metric(extracted),
                        _ => BatchOutcome::Failed("no structured answer produced".to_string()),
                    },
                    Err(e) => {
                        tracing::error!(
                            company = %company,
                            metric = %metric,
                            error = %e,
                            "batch pair failed"
                        );
                        BatchOutcome::Failed(e.to_string())
                    }
                };

                BatchRow {
                    company,
                    metric,
                    outcome,
                }
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect()
        .await
    }
}
