//! Wire types for a batch of SID-targeted edits: `EditIntent` and the
//! envelopes that carry it in and `BatchResult` that carries the outcome
//! back out, exactly as drawn up for the external interface.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    ReplaceSectionAndTitle,
    ReplaceSectionContentOnly,
    InsertSectionAndTitle,
    InsertSectionContentOnly,
    DeleteSectionAndTitle,
    DeleteSectionContentOnly,
}

impl IntentKind {
    pub fn is_delete(self) -> bool {
        matches!(
            self,
            IntentKind::DeleteSectionAndTitle | IntentKind::DeleteSectionContentOnly
        )
    }

    pub fn is_insert(self) -> bool {
        matches!(
            self,
            IntentKind::InsertSectionAndTitle | IntentKind::InsertSectionContentOnly
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionPosition {
    Before,
    After,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPosition {
    Before,
    After,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMatchSpec {
    pub match_content: String,
    #[serde(default)]
    pub context_before: Option<String>,
    #[serde(default)]
    pub context_after: Option<String>,
    #[serde(default)]
    pub position: Option<MatchPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTarget {
    pub sid: String,
    #[serde(default)]
    pub line_range: Option<LineRange>,
    #[serde(default)]
    pub content_match: Option<ContentMatchSpec>,
    #[serde(default)]
    pub insertion_position: Option<InsertionPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditIntent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    pub target: EditTarget,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub validate_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBatch {
    pub target_file: String,
    pub intents: Vec<EditIntent>,
}

/// One intent's failure, carrying the offending intent back alongside a
/// split `errorKind`/`errorMessage` (code vs. human text) and a concrete
/// `suggestion`, per spec.md's `BatchResult.failedIntents` shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedIntent {
    pub intent: EditIntent,
    pub error_kind: String,
    pub error_message: String,
    pub suggestion: String,
}

impl FailedIntent {
    pub fn new(intent: EditIntent, error: ErrorKind, suggestion: String) -> Self {
        FailedIntent {
            error_kind: error.code().to_string(),
            error_message: error.to_string(),
            intent,
            suggestion,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedIntent {
    pub index: usize,
    pub sid: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    pub execution_millis: u128,
    pub document_utf16_length: usize,
    pub timestamp_unix_millis: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_rule: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success: bool,
    pub total_intents: usize,
    pub successful_intents: usize,
    pub applied_intents: Vec<AppliedIntent>,
    pub failed_intents: Vec<FailedIntent>,
    pub warnings: Vec<String>,
    pub metadata: BatchMetadata,
}

impl BatchResult {
    pub fn rejected(
        total_intents: usize,
        failed: Vec<FailedIntent>,
        warnings: Vec<String>,
        metadata: BatchMetadata,
    ) -> Self {
        BatchResult {
            success: false,
            total_intents,
            successful_intents: 0,
            applied_intents: Vec::new(),
            failed_intents: failed,
            warnings,
            metadata,
        }
    }

    pub fn applied(
        total_intents: usize,
        applied: Vec<AppliedIntent>,
        warnings: Vec<String>,
        metadata: BatchMetadata,
    ) -> Self {
        BatchResult {
            success: true,
            total_intents,
            successful_intents: applied.len(),
            applied_intents: applied,
            failed_intents: Vec::new(),
            warnings,
            metadata,
        }
    }
}
