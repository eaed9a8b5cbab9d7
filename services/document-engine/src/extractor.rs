//! Document engine
//!
//! Orchestrates classification, extraction routing and schema
//! validation per document, and fans out over a deal. Derived records
//! follow delete-then-recreate semantics so re-running any stage after
//! a partial failure never duplicates side effects.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crestline_models::{
    DocType, DocumentRecord, ExtractionMethod, ExtractionRecord, OcrAnalysis, ProcessingStage,
    UsageMetrics,
};
use crestline_utils::llm::CompletionClient;
use crestline_utils::{AppConfig, EngineError, EngineResult};

use crate::classifier;
use crate::field_mapper::{map_typed_fields, MappingOutcome};
use crate::ocr_adapter::OcrClient;
use crate::registry::TypeRegistry;
use crate::schema_validator;
use crate::structuring;

/// Per-document processing summary returned to callers
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessOutcome {
    pub document_id: Uuid,
    pub doc_type: Option<DocType>,
    pub stage: ProcessingStage,
    pub method: Option<ExtractionMethod>,
    pub validation_error_count: usize,
    pub error: Option<String>,
}

/// Document understanding engine service state
#[derive(Clone)]
pub struct DocumentEngine {
    documents: Arc<RwLock<HashMap<Uuid, DocumentRecord>>>,
    ocr_outputs: Arc<RwLock<HashMap<String, OcrAnalysis>>>,
    extractions: Arc<RwLock<HashMap<Uuid, ExtractionRecord>>>,
    registry: Arc<TypeRegistry>,
    completion: Arc<CompletionClient>,
    ocr_client: Arc<OcrClient>,
    max_tokens: u32,
}

impl DocumentEngine {
    pub fn new(config: &AppConfig) -> EngineResult<Self> {
        Ok(Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            ocr_outputs: Arc::new(RwLock::new(HashMap::new())),
            extractions: Arc::new(RwLock::new(HashMap::new())),
            registry: Arc::new(TypeRegistry::new(config.model.prompt_version.clone())?),
            completion: Arc::new(CompletionClient::new(&config.model)?),
            ocr_client: Arc::new(OcrClient::new(&config.ocr)?),
            max_tokens: config.model.max_tokens,
        })
    }

    /// Register a document with its OCR output attached, or fetch the
    /// output from the adapter when only a reference is provided.
    pub async fn register_document(
        &self,
        deal_id: Uuid,
        file_name: &str,
        ocr: Option<OcrAnalysis>,
        document_ref: Option<&str>,
    ) -> EngineResult<DocumentRecord> {
        let analysis = match (ocr, document_ref) {
            (Some(analysis), _) => analysis,
            (None, Some(reference)) => self.ocr_client.analyze_typed(reference).await?,
            (None, None) => {
                return Err(EngineError::validation(
                    "ocr",
                    "either an OCR payload or a document reference is required",
                ))
            }
        };

        let mut document = DocumentRecord::new(deal_id, file_name, "");
        document.ocr_ref = format!("ocr/{}", document.id);

        self.ocr_outputs.write().await.insert(document.ocr_ref.clone(), analysis);
        self.documents.write().await.insert(document.id, document.clone());

        info!(document_id = %document.id, deal_id = %deal_id, file_name, "document registered");
        Ok(document)
    }

    pub async fn get_document(&self, id: Uuid) -> Option<DocumentRecord> {
        self.documents.read().await.get(&id).cloned()
    }

    pub async fn deal_documents(&self, deal_id: Uuid) -> Vec<DocumentRecord> {
        self.documents.read().await.values().filter(|d| d.deal_id == deal_id).cloned().collect()
    }

    pub async fn get_extraction(&self, document_id: Uuid) -> Option<ExtractionRecord> {
        self.extractions.read().await.get(&document_id).cloned()
    }

    pub async fn get_ocr(&self, document_id: Uuid) -> Option<OcrAnalysis> {
        let ocr_ref = self.documents.read().await.get(&document_id)?.ocr_ref.clone();
        self.ocr_outputs.read().await.get(&ocr_ref).cloned()
    }

    /// Run classification, extraction and validation for one document.
    /// Safe to re-run: stage writes are idempotent and the extraction
    /// record is replaced, not accumulated.
    pub async fn process_document(&self, document_id: Uuid) -> EngineResult<ProcessOutcome> {
        let document = self
            .get_document(document_id)
            .await
            .ok_or_else(|| EngineError::not_found(format!("document {}", document_id)))?;
        let ocr = self
            .get_ocr(document_id)
            .await
            .ok_or_else(|| EngineError::not_found(format!("ocr output for {}", document_id)))?;

        // Classification: three deterministic tiers, then the model.
        let mut classification_usage = UsageMetrics::default();
        let deterministic = classifier::classify(&ocr.raw_text, &ocr.key_value_pairs);
        let (doc_type, method) = match deterministic.doc_type {
            Some(doc_type) => (doc_type, deterministic.method),
            None => {
                let model = classifier::classify_with_model(&self.completion, &ocr).await;
                classification_usage.input_tokens = model.input_tokens;
                classification_usage.output_tokens = model.output_tokens;
                classification_usage.cost_usd =
                    self.completion.cost_usd(model.input_tokens, model.output_tokens);
                (model.doc_type, "model")
            }
        };
        let detected_year = classifier::detect_year(&ocr.raw_text);

        info!(document_id = %document_id, doc_type = %doc_type, method, "document classified");
        self.update_document(document_id, |doc| {
            doc.doc_type = Some(doc_type);
            doc.detected_year = detected_year;
            doc.advance_to(ProcessingStage::Classified).map_err(EngineError::internal)
        })
        .await?;

        if doc_type == DocType::Other {
            // No canonical schema: explicit typed failure, recorded on
            // the document so the deal surfaces it.
            let error = EngineError::unsupported_document_type(doc_type.to_string());
            self.update_document(document_id, |doc| {
                doc.stage_error = Some(error.to_string());
                doc.advance_to(ProcessingStage::Error).map_err(EngineError::internal)
            })
            .await?;
            return Ok(ProcessOutcome {
                document_id,
                doc_type: Some(doc_type),
                stage: ProcessingStage::Error,
                method: None,
                validation_error_count: 0,
                error: Some(error.to_string()),
            });
        }

        // Route: deterministic mapping for typed standardized forms,
        // model-assisted structuring for everything else.
        let (raw_data, extraction_method, raw_response, mut usage, mut errors) =
            match self.registry.field_map(doc_type) {
                Some(field_map) if ocr.has_typed_fields() => {
                    match map_typed_fields(doc_type, field_map, &ocr) {
                        MappingOutcome::Mapped(tree) => {
                            (tree, ExtractionMethod::Deterministic, None, UsageMetrics::default(), Vec::new())
                        }
                        MappingOutcome::Miss => {
                            warn!(document_id = %document_id, "deterministic pass empty; falling back to model");
                            let outcome = structuring::structure_document(
                                &self.completion,
                                &self.registry,
                                doc_type,
                                &ocr,
                                self.max_tokens,
                            )
                            .await?;
                            (
                                outcome.data,
                                ExtractionMethod::ModelFallback,
                                outcome.raw_response,
                                outcome.usage,
                                outcome.parse_errors,
                            )
                        }
                    }
                }
                _ => {
                    let outcome = structuring::structure_document(
                        &self.completion,
                        &self.registry,
                        doc_type,
                        &ocr,
                        self.max_tokens,
                    )
                    .await?;
                    (
                        outcome.data,
                        ExtractionMethod::ModelPrimary,
                        outcome.raw_response,
                        outcome.usage,
                        outcome.parse_errors,
                    )
                }
            };

        usage.add(&classification_usage);

        // Schema validation: errors accumulate, data is never dropped.
        let validated = schema_validator::validate(doc_type, &raw_data)?;
        errors.extend(validated.errors);

        let mut record = ExtractionRecord::new(
            document.id,
            extraction_method,
            validated.data,
            self.registry.prompt_version(),
        );
        record.validation_errors = errors;
        record.raw_response = raw_response;
        record.model = match extraction_method {
            ExtractionMethod::Deterministic => None,
            _ => Some(self.completion.model.clone()),
        };
        record.usage = usage;

        let validation_error_count = record.validation_errors.len();

        // One live extraction per document: replace, never accumulate.
        self.extractions.write().await.insert(document_id, record);
        self.update_document(document_id, |doc| {
            doc.advance_to(ProcessingStage::Extracted).map_err(EngineError::internal)
        })
        .await?;

        info!(
            document_id = %document_id,
            method = %extraction_method,
            validation_error_count,
            "extraction complete"
        );

        Ok(ProcessOutcome {
            document_id,
            doc_type: Some(doc_type),
            stage: ProcessingStage::Extracted,
            method: Some(extraction_method),
            validation_error_count,
            error: None,
        })
    }

    /// Process every document in a deal. Documents are independent, so
    /// they run concurrently; individual failures are contained and
    /// reported beside successful siblings. Only a deal with no usable
    /// extraction at all is a terminal failure.
    pub async fn process_deal(&self, deal_id: Uuid) -> EngineResult<Vec<ProcessOutcome>> {
        let documents = self.deal_documents(deal_id).await;
        if documents.is_empty() {
            return Err(EngineError::not_found(format!("documents for deal {}", deal_id)));
        }

        let mut handles = Vec::with_capacity(documents.len());
        for document in &documents {
            let engine = self.clone();
            let document_id = document.id;
            handles.push(tokio::spawn(async move { engine.process_document(document_id).await }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, document) in handles.into_iter().zip(documents.iter()) {
            match handle.await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(error)) => outcomes.push(ProcessOutcome {
                    document_id: document.id,
                    doc_type: document.doc_type,
                    stage: ProcessingStage::Error,
                    method: None,
                    validation_error_count: 0,
                    error: Some(error.to_string()),
                }),
                Err(join_error) => outcomes.push(ProcessOutcome {
                    document_id: document.id,
                    doc_type: document.doc_type,
                    stage: ProcessingStage::Error,
                    method: None,
                    validation_error_count: 0,
                    error: Some(join_error.to_string()),
                }),
            }
        }

        if outcomes.iter().all(|o| o.error.is_some()) {
            return Err(EngineError::extraction(format!(
                "no usable extraction for any document in deal {}",
                deal_id
            )));
        }
        Ok(outcomes)
    }

    async fn update_document<F>(&self, document_id: Uuid, update: F) -> EngineResult<()>
    where
        F: FnOnce(&mut DocumentRecord) -> EngineResult<()>,
    {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(&document_id)
            .ok_or_else(|| EngineError::not_found(format!("document {}", document_id)))?;
        update(document)
    }
}
