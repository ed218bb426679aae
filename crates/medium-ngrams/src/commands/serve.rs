//! Serve command: run the MCP server on stdio.

use anyhow::Context;
use clap::Args;
use medium_ngrams_core::config::Config;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::{info, instrument};

use crate::server::ProjectServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    // No subcommand-specific arguments; stdio is the only transport
}

/// Serve MCP requests on stdin/stdout until the client disconnects.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(_args: ServeArgs, config: Config) -> anyhow::Result<()> {
    info!("starting MCP server on stdio");
    let service = ProjectServer::new(config)
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service
        .waiting()
        .await
        .context("MCP server terminated abnormally")?;
    info!("MCP server stopped");
    Ok(())
}
