use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::catalog::{resolve_catalog, CatalogSnapshot, GrantScheme};
use crate::config::Config;
use crate::leads::{summarize_leads, triage_submission, LeadRecord, LeadStore, LeadSubmission};
use crate::profile::{ApplicantProfile, ProfileInput};
use crate::report::{EligibilityReport, Notifier, ReportError};
use crate::triage::{find_all_matching_grants, find_best_grant, TriageResult};

#[derive(Clone)]
struct ApiState {
    config: Config,
    catalog: Arc<CatalogSnapshot>,
    leads_db_path: PathBuf,
    notifier: Arc<Notifier>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(error: ReportError) -> Self {
        let status = match error {
            ReportError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ReportError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ReportError::MissingFields | ReportError::InvalidEmail | ReportError::InvalidName => {
                StatusCode::BAD_REQUEST
            }
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Deserialize, Default)]
struct LeadsQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    catalog_fingerprint: String,
    active_schemes: usize,
}

#[derive(Debug, Serialize)]
struct BestResponse {
    profile: ApplicantProfile,
    best: Option<TriageResult>,
}

#[derive(Debug, Serialize)]
struct AllResponse {
    profile: ApplicantProfile,
    results: Vec<TriageResult>,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    source: String,
    fingerprint: String,
    schemes: Vec<GrantScheme>,
}

#[derive(Debug, Serialize)]
struct LeadResponse {
    lead_id: i64,
    record: LeadRecord,
    results: Vec<TriageResult>,
}

#[derive(Debug, Serialize)]
struct LeadsResponse {
    summary: String,
    leads: Vec<LeadRecord>,
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    report: EligibilityReport,
    delivered: Vec<String>,
    lead_marked: bool,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let catalog = resolve_catalog(&config)?;
    let limiter = Notifier::limiter_for(&config.report);
    let notifier = Notifier::from_config(&config.report, limiter)?;
    info!(
        schemes = catalog.schemes.len(),
        fingerprint = %catalog.fingerprint,
        sinks = notifier.sink_count(),
        "loaded grant catalog"
    );

    let state = ApiState {
        leads_db_path: config.resolved_leads_db_path(),
        config,
        catalog: Arc::new(catalog),
        notifier: Arc::new(notifier),
    };

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/triage/best", post(triage_best))
        .route("/v1/triage/all", post(triage_all))
        .route("/v1/catalog", get(show_catalog))
        .route("/v1/leads", post(submit_lead).get(list_leads))
        .route("/v1/report", post(send_report))
        .route("/v1/config", get(show_config))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        catalog_fingerprint: state.catalog.fingerprint.clone(),
        active_schemes: state.catalog.active().count(),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn triage_best(
    State(state): State<ApiState>,
    Json(input): Json<ProfileInput>,
) -> ApiResult<BestResponse> {
    let profile = input.into_profile();
    let best = find_best_grant(&state.catalog.schemes, &profile);
    Ok(ok(BestResponse { profile, best }))
}

async fn triage_all(
    State(state): State<ApiState>,
    Json(input): Json<ProfileInput>,
) -> ApiResult<AllResponse> {
    let profile = input.into_profile();
    let results = find_all_matching_grants(&state.catalog.schemes, &profile);
    Ok(ok(AllResponse { profile, results }))
}

async fn show_catalog(State(state): State<ApiState>) -> Json<ApiResponse<CatalogResponse>> {
    ok(CatalogResponse {
        source: state.catalog.source.clone(),
        fingerprint: state.catalog.fingerprint.clone(),
        schemes: state.catalog.schemes.clone(),
    })
}

async fn submit_lead(
    State(state): State<ApiState>,
    Json(submission): Json<LeadSubmission>,
) -> ApiResult<LeadResponse> {
    let outcome = triage_submission(&submission, &state.catalog)?;
    let store = open_store(&state)?;
    let lead_id = store
        .insert_lead(&outcome.record)
        .map_err(ApiError::internal)?;
    info!(lead_id, email = %outcome.record.email, "stored lead");

    let mut record = outcome.record;
    record.id = lead_id;
    Ok(ok(LeadResponse {
        lead_id,
        record,
        results: outcome.results,
    }))
}

async fn list_leads(
    State(state): State<ApiState>,
    Query(query): Query<LeadsQuery>,
) -> ApiResult<LeadsResponse> {
    let limit = query.limit.unwrap_or(50);
    if limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than zero"));
    }
    let store = open_store(&state)?;
    let leads = store.list_leads(limit).map_err(ApiError::internal)?;
    Ok(ok(LeadsResponse {
        summary: summarize_leads(&leads),
        leads,
    }))
}

async fn send_report(
    State(state): State<ApiState>,
    Json(submission): Json<LeadSubmission>,
) -> ApiResult<ReportResponse> {
    let outcome = triage_submission(&submission, &state.catalog)?;
    let dispatch = state.notifier.dispatch(&outcome).await?;

    let lead_marked = match open_store(&state) {
        Ok(store) => store
            .mark_email_sent(&outcome.record.email)
            .unwrap_or_else(|err| {
                warn!("could not update lead email status: {err:#}");
                false
            }),
        Err(err) => {
            warn!("could not open lead store: {}", err.message);
            false
        }
    };

    Ok(ok(ReportResponse {
        report: dispatch.report,
        delivered: dispatch.delivered,
        lead_marked,
    }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn open_store(state: &ApiState) -> std::result::Result<LeadStore, ApiError> {
    LeadStore::open(&state.leads_db_path).map_err(ApiError::internal)
}
