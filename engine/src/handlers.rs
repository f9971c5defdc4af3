//! Command handlers for CLI operations
//!
//! - run: Execute a task through the agent loop
//! - tools: List the tools the server exposes
//! - secret: Store or remove keychain secrets

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::BufRead;
use std::sync::Arc;

use crate::agent::{AgentCore, AgentSettings, RunOutcome, RunReport};
use crate::cli::SecretAction;
use crate::config::{Config, ToolErrorPolicy};
use crate::llm::gemini::GeminiProvider;
use crate::llm::ollama::OllamaProvider;
use crate::llm::LLMProvider;
use crate::mcp::{stdio, ToolChannel};
use crate::secrets::{SecretCache, SecretManager};
use sdk::errors::RelayErrorExt;

/// Keychain service name for stored secrets
pub const SECRET_SERVICE: &str = "relay";

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Per-run overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub max_iterations: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub reprompt: bool,
}

impl RunOverrides {
    /// Apply the overrides to `config` and re-validate it.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
        if let Some(secs) = self.timeout_secs {
            config.agent.llm_timeout_secs = secs;
        }
        if self.reprompt {
            config.agent.on_tool_error = ToolErrorPolicy::Reprompt;
        }
        config
            .validate_and_process()
            .context("Invalid command line overrides")?;
        Ok(())
    }
}

/// Build the configured completion provider.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    match config.llm.default_provider.as_str() {
        "gemini" => {
            let manager = Arc::new(SecretManager::new(SECRET_SERVICE));
            let cache = Arc::new(SecretCache::new(manager));
            Ok(Arc::new(GeminiProvider::new(config.llm.gemini.clone(), cache)))
        }
        "ollama" => Ok(Arc::new(OllamaProvider::from_config(&config.llm.ollama))),
        other => Err(anyhow::anyhow!("Unknown LLM provider: {}", other)),
    }
}

/// Run a task through the agent loop
///
/// Spawns the tool server, runs the task and prints the answer and trace.
/// An aborted run is returned as an error so the process exits non-zero.
pub async fn handle_run(task: String, config: &Config, format: OutputFormat) -> Result<()> {
    let provider = build_provider(config)?;
    if !provider.check_health().await {
        tracing::warn!("Provider {} reports unhealthy", provider.name());
    }

    let channel = Arc::new(
        stdio::spawn(&config.server)
            .await
            .context("Failed to start tool server")?,
    );
    let agent = AgentCore::new(
        provider,
        Arc::clone(&channel) as Arc<dyn ToolChannel>,
        AgentSettings::from(&config.agent),
    );

    if let OutputFormat::Text = format {
        println!("Executing task: {}", task);
        println!();
    }

    let result = agent.run(&task).await;
    channel.shutdown().await;

    let report = result.map_err(|e| anyhow::anyhow!("{} ({})", e, e.user_hint()))?;

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report_to_json(&report))?),
    }

    match &report.outcome {
        RunOutcome::Aborted(e) => Err(anyhow::anyhow!("Run aborted: {}", e)),
        _ => Ok(()),
    }
}

fn print_report(report: &RunReport) {
    for record in &report.trace {
        println!("  {}", record.sentence());
    }
    if !report.trace.is_empty() {
        println!();
    }

    match &report.outcome {
        RunOutcome::Finished {
            answer,
            reasoning_type,
        } => {
            println!("Result:");
            println!("{}", answer);
            println!();
            println!("✓ Task completed successfully");
            if !reasoning_type.is_empty() {
                println!("  Reasoning: {}", reasoning_type);
            }
        }
        RunOutcome::Exhausted => {
            println!("✗ No final answer within the iteration limit");
        }
        RunOutcome::Aborted(e) => {
            println!("✗ Task failed: {}", e);
            println!("  Hint: {}", e.user_hint());
        }
    }
    println!("  Run: {}", report.run_id);
    println!("  Provider: {}", report.provider);
    println!("  Duration: {}ms", report.duration_ms);
    println!("  Completions: {}", report.completions);
    println!("  Tool calls: {}", report.tool_invocations);
}

/// JSON form of a run report
pub fn report_to_json(report: &RunReport) -> Value {
    let mut output = json!({
        "run_id": report.run_id,
        "status": report.outcome.status(),
        "provider": report.provider,
        "duration_ms": report.duration_ms as u64,
        "completions": report.completions,
        "tool_invocations": report.tool_invocations,
        "trace": report.trace,
    });

    match &report.outcome {
        RunOutcome::Finished {
            answer,
            reasoning_type,
        } => {
            output["answer"] = json!(answer);
            output["reasoning_type"] = json!(reasoning_type);
        }
        RunOutcome::Aborted(e) => {
            output["error"] = json!({
                "kind": e.kind(),
                "message": e.to_string(),
                "hint": e.user_hint(),
            });
        }
        RunOutcome::Exhausted => {}
    }

    output
}

/// List the tools exposed by the tool server
pub async fn handle_tools(config: &Config, format: OutputFormat) -> Result<()> {
    let channel = stdio::spawn(&config.server)
        .await
        .context("Failed to start tool server")?;

    let listed = channel.list_tools().await;
    channel.shutdown().await;
    let tools = listed.context("Failed to list tools")?;

    match format {
        OutputFormat::Text => {
            if tools.is_empty() {
                println!("The tool server exposes no tools.");
            }
            for (i, tool) in tools.iter().enumerate() {
                println!("{}. {} - {}", i + 1, tool.signature(), tool.description);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "tools": tools }))?);
        }
    }

    Ok(())
}

/// Store or remove a keychain secret
pub fn handle_secret(action: SecretAction, format: OutputFormat) -> Result<()> {
    let manager = SecretManager::new(SECRET_SERVICE);

    let (key, status) = match action {
        SecretAction::Set { key } => {
            if let OutputFormat::Text = format {
                eprintln!("Enter value for '{}':", key);
            }
            let value = read_secret_value(&mut std::io::stdin().lock())?;
            manager.set_secret(&key, &value)?;
            (key, "stored")
        }
        SecretAction::Delete { key } => {
            manager.delete_secret(&key)?;
            (key, "deleted")
        }
    };

    match format {
        OutputFormat::Text => println!("✓ Secret '{}' {}", key, status),
        OutputFormat::Json => println!("{}", json!({ "key": key, "status": status })),
    }
    Ok(())
}

/// Read one line holding a secret value, trimmed.
fn read_secret_value(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read secret value")?;
    let value = line.trim();
    if value.is_empty() {
        return Err(anyhow::anyhow!("Secret value must not be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::IterationRecord;
    use sdk::errors::EngineError;
    use serde_json::Map;

    fn report(outcome: RunOutcome) -> RunReport {
        RunReport {
            run_id: "run-1".into(),
            provider: "scripted".into(),
            outcome,
            completions: 2,
            tool_invocations: 1,
            duration_ms: 12,
            trace: vec![IterationRecord::success(1, "add", Map::new(), "[5]")],
        }
    }

    #[test]
    fn test_report_to_json_finished() {
        let value = report_to_json(&report(RunOutcome::Finished {
            answer: "5".into(),
            reasoning_type: "arithmetic".into(),
        }));
        assert_eq!(value["status"], "finished");
        assert_eq!(value["answer"], "5");
        assert_eq!(value["trace"][0]["outcome"]["tool"], "add");
        assert_eq!(value["trace"][0]["outcome"]["status"], "result");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_report_to_json_aborted() {
        let value = report_to_json(&report(RunOutcome::Aborted(EngineError::UnknownTool(
            "teleport".into(),
        ))));
        assert_eq!(value["status"], "aborted");
        assert_eq!(value["error"]["kind"], "unknown_tool");
        assert!(value.get("answer").is_none());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        RunOverrides {
            max_iterations: Some(3),
            timeout_secs: Some(30),
            reprompt: true,
        }
        .apply(&mut config)
        .unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.llm_timeout_secs, 30);
        assert_eq!(config.agent.on_tool_error, ToolErrorPolicy::Reprompt);

        let bad = RunOverrides {
            max_iterations: Some(0),
            ..RunOverrides::default()
        };
        assert!(bad.apply(&mut config).is_err());
    }

    #[test]
    fn test_build_provider() {
        let mut config = Config::default();
        config.llm.default_provider = "ollama".into();
        assert_eq!(build_provider(&config).unwrap().name(), "ollama");

        config.llm.default_provider = "gemini".into();
        assert_eq!(build_provider(&config).unwrap().name(), "gemini");
    }

    #[test]
    fn test_read_secret_value() {
        let mut input = std::io::Cursor::new("  AIza-value  \nignored\n");
        assert_eq!(read_secret_value(&mut input).unwrap(), "AIza-value");

        let mut empty = std::io::Cursor::new("\n");
        assert!(read_secret_value(&mut empty).is_err());
    }
}
