//! Retry/refinement workflow engine for CRES company research
//!
//! This crate implements the stateful orchestration loop: collect web
//! evidence, generate an answer, grade its completeness, and conditionally
//! rewrite the question and repeat, bounded by a retry limit. It also
//! provides the concurrent batch driver for (company, metric) tables and
//! the spreadsheet export.

mod agents;
mod batch;
mod engine;
mod store;
mod table;

pub use agents::{
    AnswerAgent, CompletenessGrade, CompletenessGrader, MetricAgent, QuestionRewriter,
};
pub use batch::{BatchDriver, BatchOutcome, BatchRow};
pub use engine::{AnswerMode, EngineConfig, SessionOutcome, WorkflowEngine, WorkflowRun};
pub use store::InMemorySessionStore;
pub use table::MetricsTable;

// Re-export core types for convenience
pub use cres_core::{
    CompanyMetric, Document, Error, Generation, MetricValue, Result, SessionState, SessionStore,
};
