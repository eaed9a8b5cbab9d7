//! Crestline Document Engine Service
//!
//! Classification, extraction routing and schema validation for
//! scanned loan-underwriting documents. Consumes OCR adapter output;
//! never runs OCR itself.

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

mod classifier;
mod extractor;
mod field_mapper;
mod ocr_adapter;
mod registry;
mod schema_validator;
mod structuring;

use crestline_models::{ExtractionRecord, OcrAnalysis};
use crestline_utils::{init_logging, AppConfig, EngineError};
use extractor::{DocumentEngine, ProcessOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging)?;
    info!("Starting Crestline Document Engine Service");

    let engine = DocumentEngine::new(&config)?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/deals/:deal_id/documents", post(register_document))
        .route("/api/v1/deals/:deal_id/process", post(process_deal))
        .route("/api/v1/documents/:id", get(get_document))
        .route("/api/v1/documents/:id/process", post(process_document))
        .route("/api/v1/documents/:id/extraction", get(get_extraction))
        .layer(TraceLayer::new_for_http())
        .with_state(engine);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8083));
    let listener = TcpListener::bind(&addr).await?;
    info!("Document Engine Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "document-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn to_http(error: EngineError) -> (StatusCode, String) {
    (
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        error.to_string(),
    )
}

/// Document registration request: OCR output inline, or a reference
/// for the engine to fetch through the adapter
#[derive(Debug, Deserialize)]
pub struct RegisterDocumentRequest {
    pub file_name: String,
    pub ocr: Option<OcrAnalysis>,
    pub document_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document_id: Uuid,
    pub deal_id: Uuid,
    pub file_name: String,
    pub doc_type: Option<String>,
    pub detected_year: Option<i32>,
    pub stage: String,
    pub stage_error: Option<String>,
}

async fn register_document(
    State(engine): State<DocumentEngine>,
    Path(deal_id): Path<Uuid>,
    Json(request): Json<RegisterDocumentRequest>,
) -> Result<Json<DocumentResponse>, (StatusCode, String)> {
    let document = engine
        .register_document(deal_id, &request.file_name, request.ocr, request.document_ref.as_deref())
        .await
        .map_err(to_http)?;

    Ok(Json(DocumentResponse {
        document_id: document.id,
        deal_id: document.deal_id,
        file_name: document.file_name,
        doc_type: document.doc_type.map(|t| t.to_string()),
        detected_year: document.detected_year,
        stage: document.stage.to_string(),
        stage_error: document.stage_error,
    }))
}

async fn get_document(
    State(engine): State<DocumentEngine>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, (StatusCode, String)> {
    let document = engine
        .get_document(id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Document not found".to_string()))?;

    Ok(Json(DocumentResponse {
        document_id: document.id,
        deal_id: document.deal_id,
        file_name: document.file_name,
        doc_type: document.doc_type.map(|t| t.to_string()),
        detected_year: document.detected_year,
        stage: document.stage.to_string(),
        stage_error: document.stage_error,
    }))
}

async fn process_document(
    State(engine): State<DocumentEngine>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessOutcome>, (StatusCode, String)> {
    engine.process_document(id).await.map(Json).map_err(to_http)
}

async fn process_deal(
    State(engine): State<DocumentEngine>,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<Vec<ProcessOutcome>>, (StatusCode, String)> {
    engine.process_deal(deal_id).await.map(Json).map_err(to_http)
}

async fn get_extraction(
    State(engine): State<DocumentEngine>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExtractionRecord>, (StatusCode, String)> {
    engine
        .get_extraction(id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No extraction for document".to_string()))
}
