//! # Gateway API
//!
//! The axum router through which clients submit and evaluate contract
//! operations. Handlers share state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                               |
//! |--------|--------------------------|-------------------------------------------|
//! | GET    | `/health`                | Liveness probe                            |
//! | POST   | `/transactions/submit`   | Execute and commit an operation           |
//! | POST   | `/transactions/evaluate` | Execute an operation without committing   |
//! | GET    | `/history`               | Committed transaction history             |
//!
//! ## Requests
//!
//! The caller identity travels in the `x-msp-id` and `x-user-id` headers,
//! as asserted by the membership layer in front of the node. The body is:
//!
//! ```json
//! { "operation": "AgreeToTransfer",
//!   "args": [],
//!   "transient": { "asset_value": "7b22617373657449..." } }
//! ```
//!
//! Transient values are hex-encoded bytes. They are decoded into the
//! contract's transient map and dropped when the request completes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tessera_contracts::{AssetLedger, InvocationError, Transient};
use tessera_protocol::identity::{CallerIdentity, OrgId};

use crate::metrics::SharedMetrics;

/// Header carrying the caller's organization MSP ID.
pub const MSP_ID_HEADER: &str = "x-msp-id";
/// Header carrying the caller's user ID within that organization.
pub const USER_ID_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state for all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub ledger: Arc<AssetLedger>,
    pub metrics: SharedMetrics,
    /// Organizations allowed to call the gateway. Empty admits everyone.
    pub members: Arc<Vec<OrgId>>,
}

/// Builds the router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/transactions/submit", post(submit_handler))
        .route("/transactions/evaluate", post(evaluate_handler))
        .route("/history", get(history_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /transactions/*`.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub operation: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Transient key -> hex-encoded value.
    #[serde(default)]
    pub transient: HashMap<String, String>,
}

/// Error body. `error` is a stable code, `assetId` names the asset
/// involved when there is one.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    pub message: String,
}

/// A failed request, ready to render.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                asset_id: None,
                message: message.into(),
            },
        }
    }

    fn code(&self) -> &str {
        &self.body.error
    }
}

impl From<InvocationError> for ApiError {
    fn from(err: InvocationError) -> Self {
        let status = match &err {
            InvocationError::UnknownOperation(_) => StatusCode::BAD_REQUEST,
            InvocationError::Contract(e) => match e.kind() {
                "AlreadyExists" | "InvalidState" => StatusCode::CONFLICT,
                "NotFound" => StatusCode::NOT_FOUND,
                "Unauthorized" => StatusCode::FORBIDDEN,
                "AgreementMissing" | "PriceMismatch" => StatusCode::UNPROCESSABLE_ENTITY,
                "InvalidPayload" => StatusCode::BAD_REQUEST,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
        };
        let asset_id = match &err {
            InvocationError::Contract(e) if !e.asset_id().is_empty() => {
                Some(e.asset_id().to_string())
            }
            _ => None,
        };
        Self {
            status,
            body: ErrorResponse {
                error: err.kind().to_string(),
                asset_id,
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request decoding
// ---------------------------------------------------------------------------

fn caller_identity(state: &AppState, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let (org, user) = match (header(MSP_ID_HEADER), header(USER_ID_HEADER)) {
        (Some(org), Some(user)) => (OrgId::new(org), user.to_string()),
        _ => {
            return Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "MissingIdentity",
                format!("{MSP_ID_HEADER} and {USER_ID_HEADER} headers are required"),
            ))
        }
    };
    if !state.members.is_empty() && !state.members.contains(&org) {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "UnknownOrganization",
            format!("{org} is not a member of this network"),
        ));
    }
    Ok(CallerIdentity::new(org, user))
}

fn decode_transient(encoded: &HashMap<String, String>) -> Result<Transient, ApiError> {
    let mut transient = Transient::new();
    for (key, value) in encoded {
        let bytes = hex::decode(value).map_err(|e| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "InvalidPayload",
                format!("transient field {key} is not valid hex: {e}"),
            )
        })?;
        transient.insert(key.clone(), bytes);
    }
    Ok(transient)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Submit,
    Evaluate,
}

async fn run_transaction(
    state: AppState,
    headers: HeaderMap,
    request: TransactionRequest,
    mode: Mode,
) -> Result<Response, ApiError> {
    let caller = caller_identity(&state, &headers)?;
    let transient = decode_transient(&request.transient)?;

    let ledger = Arc::clone(&state.ledger);
    let operation = request.operation.clone();
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || match mode {
        Mode::Submit => ledger.invoke(&caller, &request.operation, &request.args, &transient),
        Mode::Evaluate => ledger.query(&caller, &request.operation, &request.args, &transient),
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "transaction task failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal", "transaction task failed")
    })?;
    let elapsed = started.elapsed();

    let label = match &outcome {
        Err(InvocationError::UnknownOperation(_)) => "unknown",
        _ => operation.as_str(),
    };
    match outcome {
        Ok(response) => {
            state.metrics.observe(label, "ok", elapsed);
            if mode == Mode::Submit && operation == "TransferAsset" {
                state.metrics.assets_transferred_total.inc();
            }
            Ok((StatusCode::OK, Json(serde_json::json!({ "result": response }))).into_response())
        }
        Err(err) => {
            let err = ApiError::from(err);
            state.metrics.observe(label, err.code(), elapsed);
            Err(err)
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `POST /transactions/submit`
async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransactionRequest>,
) -> Result<Response, ApiError> {
    run_transaction(state, headers, request, Mode::Submit).await
}

/// `POST /transactions/evaluate`
async fn evaluate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransactionRequest>,
) -> Result<Response, ApiError> {
    run_transaction(state, headers, request, Mode::Evaluate).await
}

/// `GET /history`
async fn history_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let ledger = Arc::clone(&state.ledger);
    let history = tokio::task::spawn_blocking(move || ledger.history())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "history task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal", "history task failed")
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "failed to read history");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Ledger", "ledger unavailable")
        })?;
    Ok(Json(history).into_response())
}
