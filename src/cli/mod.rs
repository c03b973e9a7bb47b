use crate::config::{Config, load_config, resolve_enabled_shells};
use crate::errors::GatewayError;
use crate::server::GatewayServer;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "shellgate")]
#[command(version, about = "Multi-shell command execution gateway")]
pub struct Cli {
    /// Path to config.json (defaults to $SHELLGATE_HOME/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tool requests over stdin/stdout, one JSON object per line
    Serve,
    /// Validate the configuration and verify shell executables
    Check,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Check => check(&config),
    }
}

async fn serve(config: Config) -> Result<()> {
    let server = GatewayServer::new(config);
    info!(tools = ?server.registry().tool_names(), "gateway serving on stdio");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read request line")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = handle_line(&server, line).await;
        let mut encoded =
            serde_json::to_string(&response).context("Failed to encode response")?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// One request line in, one response object out. The response carries the
/// tool result shape (`content`/`isError`/`metadata`), with errors mapped to
/// their codes.
pub(crate) async fn handle_line(server: &GatewayServer, line: &str) -> Value {
    let request: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return error_response(&GatewayError::InvalidParams(format!(
                "Malformed request: {}",
                e
            )));
        }
    };
    let Some(name) = request.get("name").and_then(Value::as_str) else {
        return error_response(&GatewayError::InvalidParams(
            "Missing or invalid 'name' field".to_string(),
        ));
    };
    let arguments = request
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    match server.handle_call(name, arguments).await {
        Ok(result) => {
            let mut response = json!({
                "content": [{ "type": "text", "text": result.content }],
                "isError": result.is_error,
            });
            if !result.metadata.is_empty() {
                response["metadata"] = json!(result.metadata);
            }
            response
        }
        Err(e) => {
            error!(tool = name, "request failed: {}", e);
            error_response(&e)
        }
    }
}

fn error_response(error: &GatewayError) -> Value {
    json!({
        "content": [{ "type": "text", "text": error.to_string() }],
        "isError": true,
        "code": error.code(),
    })
}

/// Doctor-style diagnostic: resolve every enabled shell and report whether
/// its executable can actually be found.
fn check(config: &Config) -> Result<()> {
    let resolved = resolve_enabled_shells(config);
    if resolved.is_empty() {
        println!("no shells enabled");
        return Ok(());
    }
    for (name, shell) in &resolved {
        let status = match which::which(&shell.executable.command) {
            Ok(path) => format!("ok ({})", path.display()),
            Err(_) => "missing from PATH".to_string(),
        };
        println!("{:<12} {:<40} {}", name, shell.executable.command, status);
        println!(
            "{:<12} timeout {}s, {} allowed path(s), {} blocked command(s)",
            "",
            shell.security.command_timeout,
            shell.paths.allowed_paths.len(),
            shell.restrictions.blocked_commands.len()
        );
    }
    Ok(())
}
