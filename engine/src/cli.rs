//! CLI interface for Relay
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relay tool-using agent
///
/// Prompts a language model in a loop, dispatching its tool calls to an
/// MCP tool server until it produces a final answer.
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a task through the agent loop
    Run {
        /// The task to execute
        task: String,

        /// Maximum number of iterations
        #[arg(long, value_name = "N")]
        max_iterations: Option<usize>,

        /// Timeout for each completion request, in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Feed tool errors back to the model instead of aborting
        #[arg(long)]
        reprompt: bool,
    },

    /// List the tools exposed by the tool server
    Tools,

    /// Manage secrets stored in the OS keychain
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Store a secret, reading its value from stdin
    Set {
        /// Secret name, e.g. gemini_api_key
        key: String,
    },

    /// Remove a stored secret
    Delete {
        /// Secret name
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "relay",
            "--json",
            "run",
            "What is 2+3?",
            "--max-iterations",
            "3",
            "--timeout",
            "20",
            "--reprompt",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::Run {
                task,
                max_iterations,
                timeout,
                reprompt,
            } => {
                assert_eq!(task, "What is 2+3?");
                assert_eq!(max_iterations, Some(3));
                assert_eq!(timeout, Some(20));
                assert!(reprompt);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_tools_with_global_flags() {
        let cli = Cli::try_parse_from(["relay", "tools", "--log", "debug", "--config", "/tmp/c.toml"])
            .unwrap();
        assert!(matches!(cli.command, Command::Tools));
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_parse_secret_actions() {
        let cli = Cli::try_parse_from(["relay", "secret", "set", "gemini_api_key"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Secret { action: SecretAction::Set { ref key } } if key == "gemini_api_key"
        ));

        let cli = Cli::try_parse_from(["relay", "secret", "delete", "gemini_api_key"]).unwrap();
        assert!(matches!(cli.command, Command::Secret { action: SecretAction::Delete { .. } }));

        assert!(Cli::try_parse_from(["relay", "secret", "set"]).is_err());
    }

    #[test]
    fn test_run_requires_task() {
        assert!(Cli::try_parse_from(["relay", "run"]).is_err());
    }
}
