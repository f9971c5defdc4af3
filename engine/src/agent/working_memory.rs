//! Working Memory for Agent Loop
//!
//! The model has no structured conversation history. Its only memory of
//! earlier steps is a prose trace appended to the original query, one
//! sentence per iteration. `WorkingMemory` keeps that trace as an ordered
//! log of `IterationRecord`s and renders the prose on demand.

use sdk::errors::EngineError;
use serde::Serialize;
use serde_json::{Map, Value};

/// What happened in one iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// `tool` ran; `text` is its rendered result.
    Result { tool: String, text: String },
    /// The iteration failed; `kind` is `EngineError::kind()`. `tool` is set
    /// when the reply got as far as naming one.
    Error {
        tool: Option<String>,
        kind: String,
        message: String,
    },
}

/// One entry of the iteration trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based iteration number
    pub iteration: usize,

    /// Coerced arguments; empty when coercion did not complete
    pub arguments: Map<String, Value>,

    pub outcome: StepOutcome,
}

impl IterationRecord {
    pub fn success(
        iteration: usize,
        tool: impl Into<String>,
        arguments: Map<String, Value>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            iteration,
            arguments,
            outcome: StepOutcome::Result {
                tool: tool.into(),
                text: result.into(),
            },
        }
    }

    pub fn failure(
        iteration: usize,
        tool: Option<String>,
        arguments: Map<String, Value>,
        error: &EngineError,
    ) -> Self {
        Self {
            iteration,
            arguments,
            outcome: StepOutcome::Error {
                tool,
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, StepOutcome::Error { .. })
    }

    /// The sentence this record contributes to the next prompt.
    pub fn sentence(&self) -> String {
        match &self.outcome {
            StepOutcome::Result { tool, text } => format!(
                "In the {} iteration you called {} with {} parameters, and the function returned {}.",
                self.iteration,
                tool,
                render_arguments(&self.arguments),
                text
            ),
            StepOutcome::Error { message, .. } => {
                format!("Error in iteration {}: {}", self.iteration, message)
            }
        }
    }
}

/// Render arguments as `{a: 2, b: 3}`: bare names, JSON values.
pub fn render_arguments(arguments: &Map<String, Value>) -> String {
    let body = arguments
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}

/// Ordered log of iteration records for a single run
#[derive(Debug, Clone, Default)]
pub struct WorkingMemory {
    records: Vec<IterationRecord>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the trace
    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    /// Take the records out, leaving the memory empty.
    pub fn take(&mut self) -> Vec<IterationRecord> {
        std::mem::take(&mut self.records)
    }

    /// Build the query text for the next completion request.
    ///
    /// With no history this is `original_query` verbatim. Otherwise each
    /// record's sentence is appended as its own paragraph.
    pub fn render(&self, original_query: &str) -> String {
        let mut query = original_query.to_string();
        for record in &self.records {
            query.push_str("\n\n");
            query.push_str(&record.sentence());
        }
        query
    }
}
