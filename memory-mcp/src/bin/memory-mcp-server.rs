//! Memory server binary: loads a [`Configuration`] and serves the eight
//! verbs over either HTTP or STDIO JSON-RPC (spec.md §6), following the
//! teacher's `memory-mcp-server.rs` shape (stderr-only logging, async
//! main, config load before the server starts).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use memory_core::Configuration;
use memory_mcp::bootstrap::{build_verbs_service, save_json_snapshot};
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    Http,
    Stdio,
}

/// Thin HTTP + STDIO JSON-RPC verb-dispatch front-end over the semantic
/// memory engine.
#[derive(Debug, Parser)]
#[command(name = "memory-mcp-server", version, about)]
struct Cli {
    /// Path to a TOML configuration document (spec.md §6).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport to serve the verb API over.
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Bind address for the HTTP transport.
    #[arg(long, default_value = "127.0.0.1:8420")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // STDIO mode writes JSON-RPC on stdout; logs always go to stderr so
    // they never corrupt the wire protocol (teacher's pattern exactly).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let document = std::fs::read_to_string(path)?;
            Configuration::from_toml(&document)?
        }
        None => Configuration::default(),
    };
    config.validate()?;

    info!(?cli.transport, "starting memory-mcp-server");
    let wired = build_verbs_service(&config)?;
    let verbs = std::sync::Arc::new(wired.verbs);

    match cli.transport {
        Transport::Http => {
            let router = memory_mcp::http::router(verbs);
            let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
            info!(addr = %cli.bind, "listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
        Transport::Stdio => {
            memory_mcp::jsonrpc::run(verbs).await?;
        }
    }

    save_json_snapshot(&config, &wired.store)?;
    Ok(())
}
