//! Resolution audit log
//!
//! Every automatic decision carries an audit trail: classification
//! outcomes, resolution attempts, gate decisions and human review
//! actions are appended to a hash chain so the trail is tamper-evident
//! for re-extraction audits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Verify,
    Flag,
    AttemptResolution,
    Resolve,
    Escalate,
    GateDecision,
    ReviewConfirmed,
    ReviewCorrected,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verify => write!(f, "verify"),
            Self::Flag => write!(f, "flag"),
            Self::AttemptResolution => write!(f, "attempt_resolution"),
            Self::Resolve => write!(f, "resolve"),
            Self::Escalate => write!(f, "escalate"),
            Self::GateDecision => write!(f, "gate_decision"),
            Self::ReviewConfirmed => write!(f, "review_confirmed"),
            Self::ReviewCorrected => write!(f, "review_corrected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub hash: String,
    pub previous_hash: Option<String>,
}

/// Append-only, hash-chained audit log
#[derive(Clone, Default)]
pub struct AuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(
        &self,
        action: AuditAction,
        entity_type: &str,
        entity_id: Uuid,
        details: serde_json::Value,
    ) -> AuditEntry {
        let mut entries = self.entries.write().await;
        let previous_hash = entries.last().map(|e| e.hash.clone());

        let mut entry = AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            entity_type: entity_type.to_string(),
            entity_id,
            details,
            hash: String::new(),
            previous_hash: previous_hash.clone(),
        };
        entry.hash = calculate_hash(&entry, previous_hash.as_deref());

        entries.push(entry.clone());
        entry
    }

    pub async fn entries_for(&self, entity_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }

    /// Walk the whole chain and return the ids of any entries whose
    /// hash no longer matches their content and predecessor.
    pub async fn verify_chain(&self) -> Vec<Uuid> {
        let entries = self.entries.read().await;
        let mut broken = Vec::new();
        let mut previous_hash: Option<String> = None;

        for entry in entries.iter() {
            let expected = calculate_hash(entry, previous_hash.as_deref());
            if entry.hash != expected {
                broken.push(entry.id);
            }
            previous_hash = Some(entry.hash.clone());
        }
        broken
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn calculate_hash(entry: &AuditEntry, previous_hash: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.id.to_string().as_bytes());
    hasher.update(entry.timestamp.to_rfc3339().as_bytes());
    hasher.update(entry.action.to_string().as_bytes());
    hasher.update(entry.entity_type.as_bytes());
    hasher.update(entry.entity_id.to_string().as_bytes());
    hasher.update(entry.details.to_string().as_bytes());

    if let Some(prev) = previous_hash {
        hasher.update(prev.as_bytes());
    }

    hex::encode(hasher.finalize())
}
