//! Runnable development server.
//!
//! Binds the gate router to a local address. Key material is generated
//! fresh at startup unless a PEM-encoded private key is supplied.
//!
//! ```bash
//! gate-server --dev --port 8000
//! curl http://127.0.0.1:8000/dev/token
//! ```

use std::sync::Arc;

use clap::Parser;
use mcp_oauth_gate::{build_router, default_policy, BoxError, GateConfig, KeyMaterial};

#[derive(Debug, Parser)]
#[command(name = "gate-server", about = "OAuth 2.1 gate for MCP-style tool servers")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "GATE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, env = "GATE_PORT", default_value_t = 8000)]
    port: u16,

    /// Issuer URL expected in token `iss` claims.
    #[arg(long, env = "GATE_ISSUER", default_value = "https://dev.example.com")]
    issuer: String,

    /// Audience expected in token `aud` claims.
    #[arg(long, env = "GATE_AUDIENCE", default_value = "my-mcp-server")]
    audience: String,

    /// Base URL this server is reachable at.
    #[arg(long, env = "GATE_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Path to a PKCS#8 PEM-encoded RSA private key. Generated when absent.
    #[arg(long, env = "GATE_PRIVATE_KEY")]
    private_key: Option<std::path::PathBuf>,

    /// Enable the development token endpoint. Never on by default.
    #[arg(long, env = "GATE_DEV_MODE")]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mcp_oauth_gate=debug".parse()?)
                .add_directive("gate_server=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let key = match &args.private_key {
        Some(path) => {
            let pem = std::fs::read_to_string(path)?;
            tracing::info!(path = %path.display(), "loaded private key");
            KeyMaterial::from_private_pem(&pem)?
        }
        None => {
            tracing::info!("generating ephemeral RSA keypair");
            KeyMaterial::generate()?
        }
    };

    let config = GateConfig::new(&args.issuer, &args.audience, &args.base_url)
        .scope("tools:call")
        .scope("read")
        .scope("write")
        .dev_mode(args.dev);

    let app = build_router(config, Arc::new(key), default_policy())?;

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gate listening on http://{addr}");
    tracing::info!("protected resource metadata: {}/.well-known/oauth-protected-resource", args.base_url);
    if args.dev {
        tracing::info!("development token endpoint: {}/dev/token", args.base_url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
