//! HTTP API server for the KYC Vault node.
//!
//! Signed submissions are forwarded to the command loop and answered with a
//! receipt. Queries read the registry directly.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use kycvault_core::{
    Address, Caller, EventFilter, Fingerprint, IssuancePolicyKind, Receipt, SequencedEvent,
    Submission, VerifyQuery,
};
use kycvault_crypto::SignedEnvelope;
use kycvault_registry::RegistryError;

use crate::commands::{CommandError, NodeCommand};
use crate::state::NodeState;

/// Default and maximum page size of the events endpoint.
const DEFAULT_EVENT_LIMIT: usize = 100;
const MAX_EVENT_LIMIT: usize = 1000;

// --- Response types ---

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub started_at: String,
    pub uptime_secs: u64,
    pub issuance: IssuancePolicyKind,
    pub last_sequence: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

#[derive(Serialize)]
pub struct RecordResponse {
    pub holder: Address,
    pub issuer: Address,
    pub issued_at: u64,
    pub valid: bool,
}

#[derive(Serialize)]
pub struct FingerprintResponse {
    pub holder: Address,
    pub fingerprint: Fingerprint,
}

#[derive(Serialize)]
pub struct ConsentResponse {
    pub holder: Address,
    pub verifier: Address,
    pub has_consent: bool,
}

#[derive(Serialize)]
pub struct ConsentsResponse {
    pub holder: Address,
    pub verifiers: Vec<Address>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<SequencedEvent>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct NonceResponse {
    pub address: Address,
    pub nonce: u64,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub address: Option<String>,
    pub from: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn registry_status(e: &RegistryError) -> StatusCode {
    match e {
        RegistryError::InvalidInput(_) | RegistryError::Core(_) => StatusCode::BAD_REQUEST,
        RegistryError::Unauthorized { .. } | RegistryError::IssuerNotAllowed(_) => {
            StatusCode::FORBIDDEN
        }
        RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn command_status(e: &CommandError) -> StatusCode {
    match e {
        CommandError::InvalidSignature(_)
        | CommandError::InvalidCaller(_)
        | CommandError::BadNonce { .. } => StatusCode::FORBIDDEN,
        CommandError::WrongEndpoint { .. } => StatusCode::BAD_REQUEST,
        CommandError::Registry(e) => registry_status(e),
        CommandError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse::<Address>()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))
}

fn read_error(e: RegistryError) -> ApiError {
    api_error(registry_status(&e), e)
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(
    State(state): State<Arc<NodeState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: state.uptime_secs(),
        issuance: state.registry.issuance_policy(),
        last_sequence: state.registry.last_sequence().map_err(read_error)?,
    }))
}

async fn handle_issue_credential(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope<Submission>>,
) -> Result<Json<Receipt>, ApiError> {
    submit(&state, envelope, "issue_credential").await
}

async fn handle_revoke_credential(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope<Submission>>,
) -> Result<Json<Receipt>, ApiError> {
    submit(&state, envelope, "revoke_credential").await
}

async fn handle_grant_consent(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope<Submission>>,
) -> Result<Json<Receipt>, ApiError> {
    submit(&state, envelope, "grant_consent").await
}

async fn handle_revoke_consent(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope<Submission>>,
) -> Result<Json<Receipt>, ApiError> {
    submit(&state, envelope, "revoke_consent").await
}

/// Every failure, including a bad signature or a stale query, answers
/// `{valid: false}`.
async fn handle_verify_credential(
    State(state): State<Arc<NodeState>>,
    Json(envelope): Json<SignedEnvelope<VerifyQuery>>,
) -> Json<VerifyResponse> {
    let valid = match envelope.open() {
        Ok((signer, query)) => {
            if !query.is_fresh(state.unix_now(), state.verify_max_skew_secs) {
                tracing::warn!(
                    verifier = %signer,
                    issued_at = query.issued_at,
                    "verification query outside the accepted time window"
                );
                false
            } else {
                match Caller::new(signer) {
                    Ok(caller) => {
                        state
                            .registry
                            .verify_credential(&caller, query.holder, query.fingerprint)
                    }
                    Err(_) => false,
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "verification query with invalid signature");
            false
        }
    };
    Json(VerifyResponse { valid })
}

async fn handle_get_record(
    State(state): State<Arc<NodeState>>,
    Path(holder): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let holder = parse_address(&holder)?;
    let view = state.registry.get_record(&holder).map_err(read_error)?;
    Ok(Json(RecordResponse {
        holder,
        issuer: view.issuer,
        issued_at: view.issued_at,
        valid: view.valid,
    }))
}

async fn handle_get_fingerprint(
    State(state): State<Arc<NodeState>>,
    Path(holder): Path<String>,
) -> Result<Json<FingerprintResponse>, ApiError> {
    let holder = parse_address(&holder)?;
    let fingerprint = state
        .registry
        .get_fingerprint(&holder)
        .map_err(read_error)?;
    Ok(Json(FingerprintResponse {
        holder,
        fingerprint,
    }))
}

async fn handle_has_consent(
    State(state): State<Arc<NodeState>>,
    Path((holder, verifier)): Path<(String, String)>,
) -> Result<Json<ConsentResponse>, ApiError> {
    let holder = parse_address(&holder)?;
    let verifier = parse_address(&verifier)?;
    let has_consent = state
        .registry
        .has_consent(&holder, &verifier)
        .map_err(read_error)?;
    Ok(Json(ConsentResponse {
        holder,
        verifier,
        has_consent,
    }))
}

async fn handle_list_consents(
    State(state): State<Arc<NodeState>>,
    Path(holder): Path<String>,
) -> Result<Json<ConsentsResponse>, ApiError> {
    let holder = parse_address(&holder)?;
    let verifiers = state.registry.consents(&holder).map_err(read_error)?;
    Ok(Json(ConsentsResponse { holder, verifiers }))
}

async fn handle_events(
    State(state): State<Arc<NodeState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let mut filter = EventFilter::all()
        .starting_at(query.from.unwrap_or(0))
        .limit(query.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_EVENT_LIMIT));
    if let Some(raw) = query.address.as_deref() {
        filter = filter.involving(parse_address(raw)?);
    }
    let events = state.registry.events(&filter).map_err(read_error)?;
    let count = events.len();
    Ok(Json(EventsResponse { events, count }))
}

async fn handle_nonce(
    State(state): State<Arc<NodeState>>,
    Path(address): Path<String>,
) -> Result<Json<NonceResponse>, ApiError> {
    let address = parse_address(&address)?;
    let nonce = state
        .storage
        .nonce(&address)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    Ok(Json(NonceResponse { address, nonce }))
}

/// Hand a submission to the command loop and await its receipt.
async fn submit(
    state: &Arc<NodeState>,
    envelope: SignedEnvelope<Submission>,
    route: &'static str,
) -> Result<Json<Receipt>, ApiError> {
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

    let cmd = NodeCommand::Submit {
        envelope,
        route,
        reply: reply_tx,
    };

    state.command_tx.send(cmd).await.map_err(|_| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "node command loop not running",
        )
    })?;

    match reply_rx.await {
        Ok(Ok(receipt)) => Ok(Json(receipt)),
        Ok(Err(e)) => Err(api_error(command_status(&e), e)),
        Err(_) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "command loop dropped the reply channel",
        )),
    }
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/credentials/issue", post(handle_issue_credential))
        .route("/api/v1/credentials/revoke", post(handle_revoke_credential))
        .route("/api/v1/credentials/verify", post(handle_verify_credential))
        .route("/api/v1/consents/grant", post(handle_grant_consent))
        .route("/api/v1/consents/revoke", post(handle_revoke_consent))
        .route("/api/v1/consents/{holder}", get(handle_list_consents))
        .route("/api/v1/consents/{holder}/{verifier}", get(handle_has_consent))
        .route("/api/v1/records/{holder}", get(handle_get_record))
        .route("/api/v1/records/{holder}/fingerprint", get(handle_get_fingerprint))
        .route("/api/v1/events", get(handle_events))
        .route("/api/v1/accounts/{address}/nonce", get(handle_nonce))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(local_addr = %listener.local_addr()?, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
