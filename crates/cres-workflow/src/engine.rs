//! The retry/refinement workflow state machine

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use cres_core::{
    Generation, LlmProvider, Result, SearchProvider, SessionState, SessionStore,
};
use cres_retrieval::{CollectorConfig, EvidenceCollector, PageFetcher};

use crate::agents::{AnswerAgent, CompletenessGrader, MetricAgent, QuestionRewriter};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Refinement cycles permitted before the session is forced to terminate
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_retries: 1 }
    }
}

/// How the engine produces its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    /// Free-text answer with citations
    Narrative,
    /// Structured company-metric answer (value + comment)
    Metric,
}

/// Why a session terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The grader judged the answer complete
    Complete,
    /// The retry bound was reached; the last draft stands as the answer
    RetriesExhausted,
}

/// Result of one workflow run
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub state: SessionState,
    pub outcome: SessionOutcome,
}

/// Workflow states.
///
/// `Collect -> Generate -> Grade -> {Terminate | IncrementRetry}`,
/// `IncrementRetry -> {Terminate | Rewrite}`, `Rewrite -> Collect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Collect,
    Generate,
    Grade,
    IncrementRetry,
    Rewrite,
    Terminate(SessionOutcome),
}

/// Coordinates collection, generation, grading and rewriting across
/// retry-bounded iterations, keyed by a session thread id.
///
/// Single-entry, single-exit, strictly bounded: at most `max_retries`
/// refinement cycles, so the loop terminates regardless of grading outcome.
pub struct WorkflowEngine<S: SearchProvider, L: LlmProvider, K: SessionStore> {
    collector: EvidenceCollector<S, L>,
    answerer: AnswerAgent<L>,
    metric_agent: MetricAgent<L>,
    grader: CompletenessGrader<L>,
    rewriter: QuestionRewriter<L>,
    store: Arc<K>,
    config: EngineConfig,
    /// Per-thread in-flight guards; at most one run per thread id at a time
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: SearchProvider, L: LlmProvider, K: SessionStore> WorkflowEngine<S, L, K> {
    pub fn new(search: Arc<S>, llm: Arc<L>, fetcher: PageFetcher, store: Arc<K>) -> Self {
        Self {
            collector: EvidenceCollector::new(search, llm.clone(), fetcher),
            answerer: AnswerAgent::new(llm.clone()),
            metric_agent: MetricAgent::new(llm.clone()),
            grader: CompletenessGrader::new(llm.clone()),
            rewriter: QuestionRewriter::new(llm),
            store,
            config: EngineConfig::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_collector_config(mut self, config: CollectorConfig) -> Self {
        self.collector = self.collector.with_config(config);
        self
    }

    async fn session_slot(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run one session to termination.
    ///
    /// The session slot is held for the whole run, making the invocation
    /// atomic with respect to its thread id. State is checkpointed to the
    /// store after every committed step.
    pub async fn run(
        &self,
        thread_id: &str,
        question: &str,
        mode: AnswerMode,
    ) -> Result<WorkflowRun> {
        let slot = self.session_slot(thread_id).await;
        let _in_flight = slot.lock().await;

        tracing::info!(thread_id, question, "session started");

        let mut state = SessionState::new(question);
        let mut step = Step::Collect;

        let outcome = loop {
            step = match step {
                Step::Collect => {
                    tracing::info!(thread_id, question = %state.question, "web search");
                    let collected = self.collector.collect(&state.question).await?;
                    state.documents = collected.documents;
                    state.web_results = collected.web_results;
                    Step::Generate
                }
                Step::Generate => {
                    tracing::info!(thread_id, "generate");
                    state.generation = match mode {
                        AnswerMode::Narrative => Generation::Text {
                            text: self
                                .answerer
                                .generate(&state.question, &state.documents)
                                .await?,
                        },
                        AnswerMode::Metric => Generation::Metric {
                            metric: self
                                .metric_agent
                                .generate(&state.question, &state.documents)
                                .await?,
                        },
                    };
                    Step::Grade
                }
                Step::Grade => {
                    tracing::info!(thread_id, "full answer check");
                    let grade = self
                        .grader
                        .grade(&state.question, &state.generation.as_text())
                        .await?;
                    if grade.complete {
                        Step::Terminate(SessionOutcome::Complete)
                    } else {
                        state.follow_up_question = grade.follow_up_question.unwrap_or_default();
                        tracing::info!(
                            thread_id,
                            follow_up = %state.follow_up_question,
                            "answer incomplete"
                        );
                        Step::IncrementRetry
                    }
                }
                Step::IncrementRetry => {
                    state.retry_count += 1;
                    tracing::info!(thread_id, retry_count = state.retry_count, "retry count increment");
                    if state.retry_count >= self.config.max_retries {
                        tracing::info!(thread_id, "reached maximum number of retries, stop");
                        Step::Terminate(SessionOutcome::RetriesExhausted)
                    } else {
                        Step::Rewrite
                    }
                }
                Step::Rewrite => {
                    state.question = self
                        .rewriter
                        .rewrite(
                            &state.question,
                            &state.follow_up_question,
                            state.documents.first(),
                        )
                        .await?;
                    tracing::info!(thread_id, question = %state.question, "question rewritten");
                    Step::Collect
                }
                Step::Terminate(outcome) => break outcome,
            };

            self.store.checkpoint(thread_id, &state).await?;
        };

        self.store.checkpoint(thread_id, &state).await?;
        tracing::info!(thread_id, ?outcome, retry_count = state.retry_count, "session terminated");

        Ok(WorkflowRun { state, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use async_trait::async_trait;
    use cres_core::{Error, SearchHit};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Search stub returning one hit; counts invocations
    struct CountingSearch {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SearchProvider for CountingSearch {
        async fn search(&self, _query: &str, _num_results: usize) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SearchHit {
                url: "http://ir.acme.example.com:9/report".to_string(),
                title: Some("Acme IR".to_string()),
                text: "Acme Corp 2023 revenue was 120 million euros".to_string(),
                summary: None,
                published_date: Some("2024-03-01".to_string()),
                author: Some("Acme".to_string()),
                highlights: Vec::new(),
            }])
        }
    }

    /// LLM stub dispatching on the system prompt; grader always incomplete
    /// unless `complete_after` calls have happened
    struct ScriptedLlm {
        grades: AtomicU32,
        complete_after: u32,
        rewrites: AtomicU32,
    }

    impl ScriptedLlm {
        fn always_incomplete() -> Self {
            Self {
                grades: AtomicU32::new(0),
                complete_after: u32::MAX,
                rewrites: AtomicU32::new(0),
            }
        }

        fn complete_immediately() -> Self {
            Self {
                grades: AtomicU32::new(0),
                complete_after: 0,
                rewrites: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            Ok("draft answer".to_string())
        }

        async fn generate_json(&self, system: &str, _user: &str) -> Result<serde_json::Value> {
            if system.contains("fact-checker") {
                return Ok(json!({"credibility_score": 0.9}));
            }
            if system.contains("grader assessing") {
                let n = self.grades.fetch_add(1, Ordering::SeqCst);
                return Ok(json!({
                    "binary_score": n >= self.complete_after,
                    "follow_up_question": "What fiscal year does the figure cover?",
                }));
            }
            if system.contains("refine the question") {
                self.rewrites.fetch_add(1, Ordering::SeqCst);
                return Ok(json!({"updated_query": "Acme Corp fiscal 2023 revenue EUR"}));
            }
            if system.contains("value field") {
                return Ok(json!({"value": 120000000, "comment": "per annual report"}));
            }
            Err(Error::LlmProvider("unexpected prompt".to_string()))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn engine(
        search: Arc<CountingSearch>,
        llm: Arc<ScriptedLlm>,
        max_retries: u32,
    ) -> WorkflowEngine<CountingSearch, ScriptedLlm, InMemorySessionStore> {
        let fetcher = PageFetcher::new().unwrap().with_timeouts(
            std::time::Duration::from_millis(200),
            std::time::Duration::from_millis(200),
        );
        WorkflowEngine::new(search, llm, fetcher, Arc::new(InMemorySessionStore::new()))
            .with_config(EngineConfig { max_retries })
    }

    #[tokio::test]
    async fn test_terminates_at_retry_bound_with_last_draft() {
        let search = Arc::new(CountingSearch {
            calls: AtomicU32::new(0),
        });
        let llm = Arc::new(ScriptedLlm::always_incomplete());
        let engine = engine(search.clone(), llm.clone(), 1);

        let run = engine
            .run("acme-revenue", "What was Acme Corp's 2023 revenue?", AnswerMode::Narrative)
            .await
            .unwrap();

        assert_eq!(run.outcome, SessionOutcome::RetriesExhausted);
        assert_eq!(run.state.retry_count, 1);
        assert_eq!(run.state.generation.as_text(), "draft answer");
        // max_retries = 1 stops at the first increment: one collection pass,
        // no rewrite
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(llm.rewrites.load(Ordering::SeqCst), 0);
        assert_eq!(
            run.state.follow_up_question,
            "What fiscal year does the figure cover?"
        );
    }

    #[tokio::test]
    async fn test_rewrite_cycle_runs_below_the_bound() {
        let search = Arc::new(CountingSearch {
            calls: AtomicU32::new(0),
        });
        let llm = Arc::new(ScriptedLlm::always_incomplete());
        let engine = engine(search.clone(), llm.clone(), 2);

        let run = engine
            .run("acme-revenue", "What was Acme Corp's 2023 revenue?", AnswerMode::Narrative)
            .await
            .unwrap();

        assert_eq!(run.outcome, SessionOutcome::RetriesExhausted);
        assert_eq!(run.state.retry_count, 2);
        // One full refinement cycle: two collection passes, one rewrite
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
        assert_eq!(llm.rewrites.load(Ordering::SeqCst), 1);
        assert_eq!(run.state.question, "Acme Corp fiscal 2023 revenue EUR");
    }

    #[tokio::test]
    async fn test_complete_answer_terminates_without_retry() {
        let search = Arc::new(CountingSearch {
            calls: AtomicU32::new(0),
        });
        let llm = Arc::new(ScriptedLlm::complete_immediately());
        let engine = engine(search.clone(), llm.clone(), 1);

        let run = engine
            .run("acme-revenue", "What was Acme Corp's 2023 revenue?", AnswerMode::Narrative)
            .await
            .unwrap();

        assert_eq!(run.outcome, SessionOutcome::Complete);
        assert_eq!(run.state.retry_count, 0);
        assert!(run.state.follow_up_question.is_empty());
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_metric_mode_produces_structured_answer() {
        let search = Arc::new(CountingSearch {
            calls: AtomicU32::new(0),
        });
        let llm = Arc::new(ScriptedLlm::complete_immediately());
        let engine = engine(search, llm, 1);

        let run = engine
            .run("acme-rev", "Find revenue for Acme Corp", AnswerMode::Metric)
            .await
            .unwrap();

        match run.state.generation {
            Generation::Metric { ref metric } => {
                assert_eq!(metric.value, cres_core::MetricValue::Number(120000000.0));
                assert_eq!(metric.comment, "per annual report");
            }
            ref other => panic!("expected a structured metric, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_final_state_is_checkpointed() {
        let search = Arc::new(CountingSearch {
            calls: AtomicU32::new(0),
        });
        let llm = Arc::new(ScriptedLlm::always_incomplete());
        let store = Arc::new(InMemorySessionStore::new());
        let fetcher = PageFetcher::new().unwrap().with_timeouts(
            std::time::Duration::from_millis(200),
            std::time::Duration::from_millis(200),
        );
        let engine = WorkflowEngine::new(search, llm, fetcher, store.clone())
            .with_config(EngineConfig { max_retries: 1 });

        let run = engine
            .run("thread-x", "question", AnswerMode::Narrative)
            .await
            .unwrap();

        let stored = store.load("thread-x").await.unwrap().unwrap();
        assert_eq!(stored.retry_count, run.state.retry_count);
        assert_eq!(stored.generation, run.state.generation);
    }
}
