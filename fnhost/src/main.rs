//! fnhost - minimal HTTP host for a single function
//!
//! Hosts a built-in echo function behind the request lifecycle engine.
//! Library consumers build their own binary around `fnhost_engine` the same
//! way; this one exists for local development and smoke testing.

use clap::Parser;
use fnhost_core::{EngineError, Format, Payload};
use fnhost_engine::{
    handler_fn, resolve, HttpServer, LambdaConfig, LambdaRequest, Reply, ServerConfig,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fnhost")]
#[command(about = "Minimal HTTP host for a single function", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "FNHOST_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "FNHOST_HOST")]
    host: String,

    /// Input format for the echo function (json, text, binary)
    #[arg(long, env = "FNHOST_INPUT")]
    input: Option<Format>,

    /// Output format for the echo function (json, text, binary)
    #[arg(long, env = "FNHOST_OUTPUT")]
    output: Option<Format>,

    /// Handler deadline in seconds; expiry completes the request as 504
    #[arg(long, default_value = "30", env = "FNHOST_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FNHOST_LOG_LEVEL")]
    log_level: String,
}

/// Built-in function: echoes the decoded request body back
async fn echo(request: LambdaRequest) -> Result<Reply, EngineError> {
    let body = request.body.unwrap_or_else(Payload::empty);
    Ok(Reply::send(body))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "fnhost={0},fnhost_engine={0},tower_http=debug",
                    args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fnhost...");

    let mut config = LambdaConfig::v1(handler_fn(echo));
    config.input = args.input;
    config.output = args.output;

    // Unknown configuration versions abort startup here
    let contract = resolve(config)?;
    for api in contract.describe() {
        info!(
            action = %api.name,
            default = api.is_default,
            input = %api.input,
            output = %api.output,
            "configured action"
        );
    }

    let server = HttpServer::new(
        ServerConfig {
            host: args.host,
            port: args.port,
            handler_timeout: Duration::from_secs(args.timeout_secs),
        },
        contract,
    );

    server.serve().await?;

    Ok(())
}
