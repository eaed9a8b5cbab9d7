//! Model-assisted structuring adapter
//!
//! Assembles one textual context from the OCR output (raw text, a
//! page-grouped key-value summary, flattened tables) and submits it
//! with the type-specific instruction template. An unparseable
//! response is not an error: the pipeline continues with an empty
//! result plus a validation-error entry so the field surfaces for
//! review.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crestline_models::{DocType, OcrAnalysis, UsageMetrics, ValidationError};
use crestline_utils::llm::{extract_json_object, CompletionClient};
use crestline_utils::EngineResult;

use crate::registry::TypeRegistry;

/// Raw structuring outcome, before schema validation
#[derive(Debug)]
pub struct StructuringOutcome {
    pub data: Value,
    pub raw_response: Option<String>,
    pub usage: UsageMetrics,
    pub parse_errors: Vec<ValidationError>,
}

/// Structure one document with the model. Only an unregistered type is
/// an `Err`; transport failures and malformed responses degrade to an
/// empty result with recorded errors.
pub async fn structure_document(
    client: &CompletionClient,
    registry: &TypeRegistry,
    doc_type: DocType,
    ocr: &OcrAnalysis,
    max_tokens: u32,
) -> EngineResult<StructuringOutcome> {
    let instruction = registry.instruction_for(doc_type)?;

    let context = build_context(ocr);

    let response = match client.structure(&instruction, &context, max_tokens).await {
        Ok(response) => response,
        Err(error) => {
            warn!(%error, doc_type = %doc_type, "structuring call failed");
            return Ok(StructuringOutcome {
                data: json!({}),
                raw_response: None,
                usage: UsageMetrics::default(),
                parse_errors: vec![ValidationError::new(
                    "$",
                    format!("model structuring call failed: {}", error),
                )],
            });
        }
    };

    let usage = UsageMetrics {
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
        cost_usd: client.cost_usd(response.input_tokens, response.output_tokens),
    };

    match extract_json_object(&response.text) {
        Some(data) => {
            debug!(doc_type = %doc_type, "structuring response parsed");
            Ok(StructuringOutcome {
                data,
                raw_response: Some(response.text),
                usage,
                parse_errors: Vec::new(),
            })
        }
        None => {
            warn!(doc_type = %doc_type, "unparseable structuring response");
            Ok(StructuringOutcome {
                data: json!({}),
                raw_response: Some(response.text),
                usage,
                parse_errors: vec![ValidationError::new(
                    "$",
                    "unparseable model response; no JSON object found",
                )],
            })
        }
    }
}

/// Assemble the single textual context the model sees: document text,
/// key-value pairs grouped by page, and every table flattened to rows.
pub fn build_context(ocr: &OcrAnalysis) -> String {
    let mut context = String::new();

    context.push_str("== DOCUMENT TEXT ==\n");
    context.push_str(&ocr.raw_text);
    context.push('\n');

    if !ocr.key_value_pairs.is_empty() {
        context.push_str("\n== DETECTED FIELDS ==\n");
        let mut pages: Vec<u32> = ocr.key_value_pairs.iter().map(|kv| kv.page).collect();
        pages.sort_unstable();
        pages.dedup();
        for page in pages {
            context.push_str(&format!("-- page {} --\n", page));
            for kv in ocr.pairs_on_page(page) {
                context.push_str(&format!(
                    "{}: {} (confidence {:.2})\n",
                    kv.key, kv.value, kv.confidence
                ));
            }
        }
    }

    if !ocr.tables.is_empty() {
        context.push_str("\n== TABLES ==\n");
        for (index, table) in ocr.tables.iter().enumerate() {
            context.push_str(&format!("-- table {} on page {} --\n", index + 1, table.page));
            for row in &table.rows {
                context.push_str(&row.join(" | "));
                context.push('\n');
            }
        }
    }

    context
}
