//! Agent Core
//!
//! This module implements the iteration controller that drives a run:
//!
//! 1. Initialize the tool channel and fetch the tool list (once per run)
//! 2. Build the prompt from the task and the iteration trace
//! 3. Request a completion, bounded by the configured timeout
//! 4. Parse the one-line reply
//! 5. FUNCTION_CALL: look up the tool, coerce parameters, call it, record
//!    the result and go again
//! 6. FINAL_ANSWER: stop
//!
//! All per-run state lives in a `RunState` value that `step` takes and
//! hands back. Nothing survives between runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{AgentConfig, ExtraParamsPolicy, ToolErrorPolicy};
use crate::llm::LLMProvider;
use crate::mcp::ToolChannel;
use sdk::errors::{EngineError, RelayErrorExt};

use super::coerce::coerce_parameters;
use super::prompt::{build_prompt, build_system_prompt};
use super::protocol::{parse_response, AgentMessage};
use super::registry::ToolRegistry;
use super::working_memory::{IterationRecord, WorkingMemory};

/// Default maximum number of iterations per run
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Default timeout for each completion request in seconds
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 10;

/// Knobs for a single agent
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub llm_timeout: Duration,
    pub on_tool_error: ToolErrorPolicy,
    pub extra_parameters: ExtraParamsPolicy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            on_tool_error: ToolErrorPolicy::default(),
            extra_parameters: ExtraParamsPolicy::default(),
        }
    }
}

impl From<&AgentConfig> for AgentSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            llm_timeout: config.llm_timeout(),
            on_tool_error: config.on_tool_error,
            extra_parameters: config.extra_parameters,
        }
    }
}

/// Everything a run accumulates
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Task text as given by the caller
    pub task: String,

    /// Iterations completed so far
    pub iteration: usize,

    /// Rendered result of the most recent successful tool call
    pub last_result: Option<String>,

    /// Trace of every iteration
    pub memory: WorkingMemory,

    /// Task plus trace, as sent in the last prompt
    pub current_query: String,

    /// Completion requests issued
    pub completions: usize,

    /// Tool calls sent to the channel
    pub tool_invocations: usize,
}

impl RunState {
    pub fn new(task: impl Into<String>) -> Self {
        let task = task.into();
        Self {
            current_query: task.clone(),
            task,
            ..Self::default()
        }
    }

    /// Return to the empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Immutable inputs shared by every step of a run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub registry: ToolRegistry,
    pub system_prompt: String,
}

impl RunContext {
    pub fn new(registry: ToolRegistry) -> Self {
        let system_prompt = build_system_prompt(&registry);
        Self {
            registry,
            system_prompt,
        }
    }
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The model gave a final answer.
    Finished {
        answer: String,
        reasoning_type: String,
    },
    /// The iteration budget ran out without a final answer.
    Exhausted,
    /// The run stopped on an error.
    Aborted(EngineError),
}

impl RunOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Finished { .. } => "finished",
            Self::Exhausted => "exhausted",
            Self::Aborted(_) => "aborted",
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Finished { answer, .. } => Some(answer),
            _ => None,
        }
    }
}

/// Whether the loop should go on after a step
#[derive(Debug)]
pub enum Flow {
    Continue,
    Stop(RunOutcome),
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub provider: String,
    pub outcome: RunOutcome,
    pub completions: usize,
    pub tool_invocations: usize,
    pub duration_ms: u128,
    pub trace: Vec<IterationRecord>,
}

/// Iteration controller
pub struct AgentCore {
    provider: Arc<dyn LLMProvider>,
    channel: Arc<dyn ToolChannel>,
    settings: AgentSettings,
    initialized: OnceCell<()>,
}

impl AgentCore {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        channel: Arc<dyn ToolChannel>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            provider,
            channel,
            settings,
            initialized: OnceCell::new(),
        }
    }

    /// Handshake with the tool server (first call only) and fetch its tools.
    pub async fn prepare(&self) -> Result<RunContext, EngineError> {
        self.initialized
            .get_or_try_init(|| async { self.channel.initialize().await })
            .await?;

        let registry = ToolRegistry::fetch(self.channel.as_ref()).await?;
        if registry.is_empty() {
            warn!("Tool server exposes no tools");
        } else {
            info!("Tool server exposes {} tools", registry.len());
        }
        Ok(RunContext::new(registry))
    }

    /// Run a task to completion.
    ///
    /// Returns `Err` only when the run could not start. Failures inside the
    /// loop are reported as `RunOutcome::Aborted` with the trace intact.
    pub async fn run(&self, task: &str) -> Result<RunReport, EngineError> {
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        info!("Starting run {} with provider {}", run_id, self.provider.name());

        let ctx = self.prepare().await.map_err(|e| {
            error!("Run {} failed to start: {}", run_id, e);
            e
        })?;

        let mut state = RunState::new(task);
        let outcome = loop {
            if state.iteration >= self.settings.max_iterations {
                warn!(
                    "Run {} reached max iterations ({}) without a final answer",
                    run_id, self.settings.max_iterations
                );
                break RunOutcome::Exhausted;
            }

            let (next, flow) = self.step(&ctx, state).await;
            state = next;
            if let Flow::Stop(outcome) = flow {
                break outcome;
            }
        };

        let report = RunReport {
            run_id,
            provider: self.provider.name().to_string(),
            outcome,
            completions: state.completions,
            tool_invocations: state.tool_invocations,
            duration_ms: start.elapsed().as_millis(),
            trace: state.memory.take(),
        };
        state.reset();

        match &report.outcome {
            RunOutcome::Finished { answer, .. } => {
                info!("Run {} finished in {}ms: {}", report.run_id, report.duration_ms, answer)
            }
            RunOutcome::Exhausted => info!("Run {} exhausted", report.run_id),
            RunOutcome::Aborted(e) => error!("Run {} aborted: {}", report.run_id, e),
        }

        Ok(report)
    }

    /// Execute one iteration.
    ///
    /// Takes the run state by value and hands it back together with the
    /// decision whether to continue.
    pub async fn step(&self, ctx: &RunContext, mut state: RunState) -> (RunState, Flow) {
        let n = state.iteration + 1;
        debug!("--- Iteration {} ---", n);

        state.current_query = state.memory.render(&state.task);
        let prompt = build_prompt(&ctx.system_prompt, &state.current_query);

        state.completions += 1;
        let reply = match timeout(self.settings.llm_timeout, self.provider.generate(&prompt)).await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                error!("Completion request failed: {}", e);
                return self.fail(state, None, Map::new(), e.into());
            }
            Err(_) => {
                error!(
                    "Completion request timed out after {}s",
                    self.settings.llm_timeout.as_secs_f64()
                );
                return self.fail(state, None, Map::new(), EngineError::LLMTimeout);
            }
        };

        let message = match parse_response(&reply) {
            Ok(message) => message,
            Err(e) => {
                debug!("Unparseable reply: {}", reply);
                return self.fail(state, None, Map::new(), e);
            }
        };

        match message {
            AgentMessage::FinalAnswer {
                value,
                reasoning_type,
            } => {
                info!("Final answer at iteration {} ({})", n, reasoning_type);
                (
                    state,
                    Flow::Stop(RunOutcome::Finished {
                        answer: value,
                        reasoning_type,
                    }),
                )
            }
            AgentMessage::FunctionCall {
                name,
                parameters,
                reasoning_type,
            } => {
                debug!("Function call: {} {:?} ({})", name, parameters, reasoning_type);
                self.invoke(ctx, state, name, &parameters).await
            }
        }
    }

    async fn invoke(
        &self,
        ctx: &RunContext,
        mut state: RunState,
        name: String,
        parameters: &[Value],
    ) -> (RunState, Flow) {
        let tool = match ctx.registry.find(&name) {
            Ok(tool) => tool,
            Err(e) => return self.fail(state, Some(name), Map::new(), e),
        };

        let arguments = match coerce_parameters(tool, parameters, self.settings.extra_parameters) {
            Ok(arguments) => arguments,
            Err(e) => return self.fail(state, Some(name), Map::new(), e),
        };

        state.tool_invocations += 1;
        match self.channel.call_tool(&name, arguments.clone()).await {
            Ok(result) => {
                let text = result.to_text();
                debug!("{} returned {}", name, text);
                state
                    .memory
                    .push(IterationRecord::success(state.iteration + 1, name, arguments, text.clone()));
                state.last_result = Some(text);
                state.iteration += 1;
                (state, Flow::Continue)
            }
            Err(e) => {
                let err = e.into_invocation_error(&name);
                self.fail(state, Some(name), arguments, err)
            }
        }
    }

    /// Record a failed iteration, then abort or re-prompt per policy.
    fn fail(
        &self,
        mut state: RunState,
        tool: Option<String>,
        arguments: Map<String, Value>,
        err: EngineError,
    ) -> (RunState, Flow) {
        let n = state.iteration + 1;
        state
            .memory
            .push(IterationRecord::failure(n, tool, arguments, &err));

        if self.settings.on_tool_error == ToolErrorPolicy::Reprompt && err.is_recoverable() {
            warn!("Iteration {} failed, asking the model again: {}", n, err);
            state.iteration += 1;
            return (state, Flow::Continue);
        }

        warn!("Iteration {} failed: {} ({})", n, err, err.user_hint());
        (state, Flow::Stop(RunOutcome::Aborted(err)))
    }
}
