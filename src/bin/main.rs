use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vercel_bridge::client::{DEFAULT_SERVER_URL, SERVER_URL_ENV};
use vercel_bridge::config::{
    API_URL_ENV, DEFAULT_API_BASE_URL, DEFAULT_BIND, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS, TOKEN_ENV,
};
use vercel_bridge::tools::JsonObject;
use vercel_bridge::{BridgeClient, BridgeConfig};

#[derive(Parser)]
#[command(name = "vercel-bridge")]
#[command(about = "HTTP tool bridge for the Vercel REST API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge HTTP server
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: SocketAddr,
        /// Upstream API base URL
        #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_BASE_URL)]
        api_url: String,
        /// Initial bearer token for upstream calls
        #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
        token: Option<String>,
        /// Timeout for each upstream call, in seconds
        #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
        upstream_timeout: u64,
        /// Timeout for handling one request, in seconds
        #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
        request_timeout: u64,
        #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
        max_body_bytes: usize,
    },
    /// List the tools a running bridge exposes
    Tools {
        #[arg(long, env = SERVER_URL_ENV, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
    /// Call a tool on a running bridge
    Call {
        name: String,
        /// Tool parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
        #[arg(long, env = SERVER_URL_ENV, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
    /// Show the descriptor of a running bridge
    Info {
        #[arg(long, env = SERVER_URL_ENV, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vercel_bridge=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            api_url,
            token,
            upstream_timeout,
            request_timeout,
            max_body_bytes,
        } => {
            let config = BridgeConfig {
                bind,
                api_base_url: api_url,
                upstream_timeout: Duration::from_secs(upstream_timeout),
                request_timeout: Duration::from_secs(request_timeout),
                max_body_bytes,
                ..BridgeConfig::default()
            }
            .with_token(token.as_deref());

            info!("Starting bridge server on {}", config.bind);
            vercel_bridge::serve(config).await?;
        }
        Commands::Tools { server } => {
            let client = connect(&server).await?;
            let tools = client.list_tools().await?;

            if tools.is_empty() {
                println!("No tools registered.");
                return Ok(());
            }

            println!("{:<30} {:<70}", "NAME", "DESCRIPTION");
            println!("{}", "-".repeat(100));
            for tool in tools {
                println!("{:<30} {:<70}", tool.name, tool.description);
            }
        }
        Commands::Call {
            name,
            params,
            server,
        } => {
            let params: JsonObject = serde_json::from_str(&params)
                .context("--params must be a JSON object")?;

            let client = connect(&server).await?;
            let outcome = client.call_tool(&name, &params).await?;

            println!("{}", serde_json::to_string_pretty(&outcome.body)?);
            if !outcome.is_success() {
                bail!(
                    "Tool `{}` failed (HTTP {}): {}",
                    name,
                    outcome.http_status,
                    outcome.message().unwrap_or("no message")
                );
            }
        }
        Commands::Info { server } => {
            let client = connect(&server).await?;
            let info: Value = client.server_info().await?;

            for key in ["name", "version", "description", "status"] {
                let value = info.get(key).and_then(Value::as_str).unwrap_or("-");
                println!("{:<12} {}", format!("{}:", key), value);
            }
        }
    }

    Ok(())
}

async fn connect(server: &str) -> Result<BridgeClient> {
    let client = BridgeClient::new(server)?;
    if !client.ping().await {
        bail!("Bridge server at {} is not reachable", server);
    }
    Ok(client)
}
