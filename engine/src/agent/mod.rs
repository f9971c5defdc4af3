//! Agent Loop
//!
//! The agent repeatedly prompts the model, parses its one-line reply,
//! dispatches the requested tool call and folds the result back into the
//! next prompt, until the model answers or the iteration budget runs out.

pub mod coerce;
pub mod core;
pub mod prompt;
pub mod protocol;
pub mod registry;
pub mod working_memory;

pub use core::{AgentCore, AgentSettings, Flow, RunContext, RunOutcome, RunReport, RunState};
pub use protocol::{parse_response, AgentMessage};
pub use registry::ToolRegistry;
pub use working_memory::{IterationRecord, StepOutcome, WorkingMemory};
