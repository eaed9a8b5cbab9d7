//! Crestline Verification Service
//!
//! Multi-family consistency verification, tiered discrepancy
//! resolution and the human-review gate for loan-underwriting deals,
//! with a hash-chained audit trail over every automatic decision.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

mod audit;
mod cross_checks;
mod math_checks;
mod ocr_compare;
mod resolver;
mod review_gate;
mod service;
mod suite;

use crestline_models::{ReviewItem, VerificationReport};
use crestline_utils::{init_logging, AppConfig, EngineError};
use service::{DealSubmission, ResolvePassOutcome, VerificationService};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging)?;
    info!("Starting Crestline Verification Service");

    let service = VerificationService::new(&config)?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/deals/verify", post(verify_deal))
        .route("/api/v1/deals/:deal_id/resolve", post(resolve_deal))
        .route("/api/v1/deals/:deal_id/report", get(get_report))
        .route("/api/v1/deals/:deal_id/review-items", get(list_review_items))
        .route("/api/v1/review-items/:id/confirm", post(confirm_review_item))
        .route("/api/v1/review-items/:id/correct", post(correct_review_item))
        .route("/api/v1/audit/:entity_id", get(get_audit_trail))
        .route("/api/v1/audit/verify-chain", post(verify_audit_chain))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8084));
    let listener = TcpListener::bind(&addr).await?;
    info!("Verification Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "verification",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn to_http(error: EngineError) -> (StatusCode, String) {
    (
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        error.to_string(),
    )
}

async fn verify_deal(
    State(service): State<VerificationService>,
    Json(submission): Json<DealSubmission>,
) -> Json<VerificationReport> {
    Json(service.submit_and_verify(submission).await)
}

async fn resolve_deal(
    State(service): State<VerificationService>,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ResolvePassOutcome>, (StatusCode, String)> {
    service.resolve_pass(deal_id).await.map(Json).map_err(to_http)
}

async fn get_report(
    State(service): State<VerificationService>,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<VerificationReport>, (StatusCode, String)> {
    service
        .report_for(deal_id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No report for deal".to_string()))
}

async fn list_review_items(
    State(service): State<VerificationService>,
    Path(deal_id): Path<Uuid>,
) -> Json<Vec<ReviewItem>> {
    Json(service.review_items_for(deal_id).await)
}

#[derive(Debug, Serialize)]
pub struct ReviewActionResponse {
    pub item: ReviewItem,
    pub can_proceed: bool,
}

async fn confirm_review_item(
    State(service): State<VerificationService>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewActionResponse>, (StatusCode, String)> {
    let (item, can_proceed) = service.confirm_review_item(id).await.map_err(to_http)?;
    Ok(Json(ReviewActionResponse { item, can_proceed }))
}

#[derive(Debug, Deserialize)]
pub struct CorrectRequest {
    pub value: String,
}

async fn correct_review_item(
    State(service): State<VerificationService>,
    Path(id): Path<Uuid>,
    Json(request): Json<CorrectRequest>,
) -> Result<Json<ReviewActionResponse>, (StatusCode, String)> {
    let (item, can_proceed) =
        service.correct_review_item(id, &request.value).await.map_err(to_http)?;
    Ok(Json(ReviewActionResponse { item, can_proceed }))
}

async fn get_audit_trail(
    State(service): State<VerificationService>,
    Path(entity_id): Path<Uuid>,
) -> Json<Vec<audit::AuditEntry>> {
    Json(service.audit_log().entries_for(entity_id).await)
}

#[derive(Debug, Serialize)]
pub struct ChainVerificationResponse {
    pub is_valid: bool,
    pub entries_checked: usize,
    pub broken_entries: Vec<Uuid>,
}

async fn verify_audit_chain(
    State(service): State<VerificationService>,
) -> Json<ChainVerificationResponse> {
    let broken = service.audit_log().verify_chain().await;
    let entries_checked = service.audit_log().len().await;
    Json(ChainVerificationResponse {
        is_valid: broken.is_empty(),
        entries_checked,
        broken_entries: broken,
    })
}
