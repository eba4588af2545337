use anyhow::{Context, Result};
use argus::ai::{build_client, ReasoningClient};
use argus::analysis::AnalysisService;
use argus::api::{create_router, ApiState};
use argus::command::{CommandBus, CommandDispatcher};
use argus::config::load_or_default;
use argus::nats::{self, NatsCommandBus, TelemetryIngest};
use argus::notify::Notifier;
use argus::robot::RobotRegistry;
use argus::suggestion::SuggestionStore;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argus=info".into()),
        )
        .init();

    info!("Argus ground station starting...");

    let config_path = std::env::var("ARGUS_CONFIG").unwrap_or_else(|_| "argus.toml".to_string());
    let mut config = load_or_default(&config_path)?;
    config.apply_env_overrides();

    let client = nats::connect(&config.nats).await?;

    let registry = Arc::new(RobotRegistry::new());
    let suggestions = Arc::new(SuggestionStore::new());
    let dispatcher = Arc::new(CommandDispatcher::new());
    let notifier = Arc::new(Notifier::new());
    let bus: Arc<dyn CommandBus> = Arc::new(NatsCommandBus::new(client.clone()));

    let reasoning: Option<Arc<dyn ReasoningClient>> = if config.ai.enabled {
        match build_client(&config.ai) {
            Ok(client) => {
                info!(provider = %config.ai.provider, model = %config.ai.model, "AI reasoning enabled");
                Some(client)
            }
            Err(e) => {
                warn!(error = %e, "AI reasoning unavailable, falling back to heuristics");
                None
            }
        }
    } else {
        None
    };

    let analysis = Arc::new(AnalysisService::new(
        config.analysis.clone(),
        config.ai.clone(),
        Arc::clone(&registry),
        Arc::clone(&suggestions),
        Arc::clone(&notifier),
        reasoning,
    ));
    analysis.start().await;

    let ingest = Arc::new(TelemetryIngest::new(
        Arc::clone(&registry),
        Arc::clone(&analysis),
        Arc::clone(&dispatcher),
        Arc::clone(&notifier),
    ));
    let ingest_handle = tokio::spawn(async move {
        if let Err(e) = ingest.run(client).await {
            error!(error = %e, "Telemetry ingest failed");
        }
    });

    let app = create_router(ApiState {
        registry,
        suggestions,
        dispatcher,
        bus,
        notifier,
        default_suggestion_limit: config.api.default_suggestion_limit,
    });

    let addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "HTTP server failed");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    analysis.stop().await;
    ingest_handle.abort();
    server_handle.abort();
    let _ = ingest_handle.await;
    let _ = server_handle.await;

    info!("Argus ground station stopped");
    Ok(())
}
