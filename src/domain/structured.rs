//! The fixed, backend-independent output shape of a run.

use serde::{Deserialize, Serialize};

/// Final answer of a run: optional reasoning plus an ordered conversation
/// of text and artifact segments. This is the only shape the formatting
/// pass is allowed to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    pub conversation: Vec<ConversationSegment>,
}

impl StructuredResponse {
    /// Degraded-mode response preserving raw model output verbatim.
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            thinking: None,
            conversation: vec![ConversationSegment::Text {
                content: raw.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConversationSegment {
    Text { content: String },
    Artifact { artifact: Artifact },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
