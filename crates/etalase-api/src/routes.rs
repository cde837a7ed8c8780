use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use etalase_core::{SyncEngine, SyncScope, SyncSummary};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::verify_cron_secret;
use crate::config::AppConfig;
use crate::error::AppError;

const SYNC_COMPLETED: &str = "Data sync completed successfully";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: SyncEngine,
}

impl AppState {
    pub const fn new(config: Arc<AppConfig>, engine: SyncEngine) -> Self {
        Self { config, engine }
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/sync-data", get(sync_data).post(sync_data))
        .route("/cron", get(cron))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_cron_secret,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn require_cron_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    verify_cron_secret(request.headers(), &state.config.cron_secret)?;
    Ok(next.run(request).await)
}

/// Body of a successful sync, as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDataResponse {
    pub message: String,
    pub resellers: usize,
    pub products: usize,
    pub bundling: usize,
    pub last_sync: String,
}

impl From<&SyncSummary> for SyncDataResponse {
    fn from(summary: &SyncSummary) -> Self {
        Self {
            message: SYNC_COMPLETED.to_string(),
            resellers: summary.resellers,
            products: summary.products,
            bundling: summary.bundling,
            last_sync: summary.last_sync.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SyncDataQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn sync_data(
    State(state): State<AppState>,
    Query(query): Query<SyncDataQuery>,
) -> Result<Json<SyncDataResponse>, AppError> {
    let scope = match query.kind.as_deref() {
        None => SyncScope::All,
        Some(raw) => raw
            .parse::<SyncScope>()
            .map_err(|error| AppError::bad_request(error.to_string()))?,
    };

    let summary = run_scope(&state.engine, scope).await?;
    Ok(Json(SyncDataResponse::from(&summary)))
}

#[derive(Debug, Serialize)]
struct CronResults {
    resellers: SyncDataResponse,
    products: SyncDataResponse,
}

#[derive(Debug, Serialize)]
struct CronResponse {
    success: bool,
    timestamp: String,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<CronResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn cron(State(state): State<AppState>) -> Response {
    tracing::info!("Starting scheduled sync");
    match run_scheduled(&state.engine).await {
        Ok((resellers, products)) => Json(CronResponse {
            success: true,
            timestamp: now_iso(),
            message: "Daily sync completed successfully",
            results: Some(CronResults {
                resellers: SyncDataResponse::from(&resellers),
                products: SyncDataResponse::from(&products),
            }),
            error: None,
        })
        .into_response(),
        Err(error) => {
            tracing::error!("Scheduled sync failed: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CronResponse {
                    success: false,
                    timestamp: now_iso(),
                    message: "Daily sync failed",
                    results: None,
                    error: Some(error.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// The scheduled sequence: resellers, then products.
pub async fn run_scheduled(engine: &SyncEngine) -> Result<(SyncSummary, SyncSummary), AppError> {
    let resellers = run_scope(engine, SyncScope::Resellers).await?;
    let products = run_scope(engine, SyncScope::Products).await?;
    Ok((resellers, products))
}

async fn run_scope(engine: &SyncEngine, scope: SyncScope) -> Result<SyncSummary, AppError> {
    let summary = engine.run(scope).await.map_err(|error| {
        tracing::error!(%scope, "Sync pass aborted: {error}");
        AppError::sync_failed(error.to_string())
    })?;

    if !summary.report.is_clean() {
        tracing::warn!(
            %scope,
            record_failures = summary.report.record_failures.len(),
            kind_failures = summary.report.kind_failures.len(),
            "Sync pass finished with failures"
        );
    }
    Ok(summary)
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
