//! Tool server spawned as a child process, spoken to over stdin/stdout.

use std::process::Stdio;

use rmcp::transport::TokioChildProcess;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::{ChannelError, McpClient};
use crate::config::ServerConfig;

/// Spawn the configured tool server and run the handshake.
///
/// The server's stderr is forwarded to the log at debug level. The child
/// is killed when the session ends.
pub async fn spawn(config: &ServerConfig) -> Result<McpClient, ChannelError> {
    info!("Starting tool server: {} {}", config.command, config.args.join(" "));

    let mut command = Command::new(&config.command);
    command.args(&config.args).envs(&config.env);
    if let Some(cwd) = &config.cwd {
        command.current_dir(cwd);
    }

    let (transport, stderr) = TokioChildProcess::builder(command)
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(stderr) = stderr {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "relay::server", "{}", line);
            }
        });
    }

    McpClient::connect(transport, config.request_timeout()).await
}
