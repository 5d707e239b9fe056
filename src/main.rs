use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use coach_relay::config::{Cli, Config, API_KEY_ENV};
use coach_relay::provider::{CompletionProvider, OpenAiClient};
use coach_relay::{build_router, AppState, Relay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up OPENAI_API_KEY from a local .env before clap reads the environment.
    dotenvy::dotenv().ok();

    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "coach_relay=debug,tower_http=debug"
    } else {
        "coach_relay=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("coach-relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?.with_cli_overrides(&cli);

    info!(
        base_url = config.provider.base_url,
        model = config.provider.model,
        max_tokens = config.generation.max_tokens,
        temperature = config.generation.temperature,
        "Configuration loaded"
    );

    // The provider client is built once and shared read-only by every request.
    let provider: Option<Arc<dyn CompletionProvider>> = match cli.credential() {
        Some(key) => Some(Arc::new(OpenAiClient::new(key, &config.provider)?)),
        None => {
            warn!("{API_KEY_ENV} is not set; chat endpoints will return errors");
            None
        }
    };

    let state = Arc::new(AppState {
        relay: Relay::new(provider, config.generation.clone()),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen;
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
