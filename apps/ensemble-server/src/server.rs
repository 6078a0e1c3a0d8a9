//! HTTP host: routes broker calls to registered agents.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use ensemble_api::{AgentTaskRequest, AgentTaskResponse};
use ensemble_broker::{AgentDefinition, BrokerClient, BrokerClientConfig};
use ensemble_config::{EnsembleConfig, ServiceConfig};
use ensemble_core::{run, AgentRegistry};

#[derive(Clone)]
struct AppState {
    registry: Arc<AgentRegistry>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

pub async fn run_server(
    config: EnsembleConfig,
    registry: AgentRegistry,
    skip_registration: bool,
) -> anyhow::Result<()> {
    let registry = Arc::new(registry);

    if skip_registration {
        tracing::warn!("skipping broker catalog registration");
    } else {
        register_agents(&config, &registry)
            .await
            .context("broker registration failed")?;
    }

    let state = AppState {
        registry: registry.clone(),
    };
    let app = build_router(state, config.service.base_path.as_deref());

    let listener = tokio::net::TcpListener::bind(config.service.listen.as_str())
        .await
        .context("bind server listener failed")?;
    println!(
        "ensemble-server listening on http://{} ({} agents)",
        config.service.listen,
        registry.len()
    );
    axum::serve(listener, app)
        .await
        .context("server terminated with error")
}

fn build_router(state: AppState, base_path: Option<&str>) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/agents/{agent}/tasks", post(execute_task))
        .route("/agents/{agent}/info", get(agent_info));

    let app = match base_path {
        Some(prefix) => Router::new().nest(prefix, routes),
        None => routes,
    };

    app.fallback(unknown_route).with_state(state)
}

/// Announce every registered agent to the broker catalog.
async fn register_agents(config: &EnsembleConfig, registry: &AgentRegistry) -> anyhow::Result<()> {
    if config.service.base_url.trim().is_empty() {
        anyhow::bail!("service.base_url must be set before agents can be registered");
    }

    let client = BrokerClient::new(BrokerClientConfig {
        base_url: config.broker.url.clone(),
        token: config.broker.resolve_token(),
        timeout_secs: config.broker.timeout_secs,
    })
    .context("build broker client failed")?;

    let public_base = public_base_url(&config.service);
    for manifest in registry.manifests() {
        let definition = AgentDefinition::from_manifest(&manifest, &public_base);
        client
            .register_agent(&definition)
            .await
            .with_context(|| format!("register agent '{}' failed", definition.name))?;
    }

    tracing::info!(agents = registry.len(), "broker registration complete");
    Ok(())
}

/// Public URL prefix the broker reaches this host under.
fn public_base_url(service: &ServiceConfig) -> String {
    let base = service.base_url.trim_end_matches('/');
    match &service.base_path {
        Some(path) => format!("{}{}", base, path.trim_end_matches('/')),
        None => base.to_string(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status":"ok"}))
}

async fn execute_task(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Json(request): Json<AgentTaskRequest>,
) -> Result<Json<AgentTaskResponse>, (StatusCode, Json<ErrorBody>)> {
    let Some(registered) = state.registry.by_path(&agent) else {
        return Err(agent_not_found(&agent));
    };
    Ok(Json(run(&registered, request).await))
}

async fn agent_info(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let Some(registered) = state.registry.by_path(&agent) else {
        return Err(agent_not_found(&agent));
    };
    Ok(Json(registered.manifest().info()))
}

async fn unknown_route(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            code: "not_found".to_string(),
            message: format!("no route for '{}'", uri.path()),
        }),
    )
}

fn agent_not_found(agent: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            code: "not_found".to_string(),
            message: format!("no agent registered under path '{}'", agent),
        }),
    )
}
