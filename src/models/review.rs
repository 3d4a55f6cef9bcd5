//! Request and result values exchanged with the review backend.

use super::diff::FileChange;

/// A fully built review request.
///
/// Constructed only by the prompt builder; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRequest {
    system_prompt: String,
    label: String,
    changes: Vec<FileChange>,
    omitted: Vec<String>,
    payload: String,
    max_output_tokens: u32,
}

impl ReviewRequest {
    pub(crate) fn new(
        system_prompt: String,
        label: String,
        changes: Vec<FileChange>,
        omitted: Vec<String>,
        payload: String,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            system_prompt,
            label,
            changes,
            omitted,
            payload,
            max_output_tokens,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Branch or commit identifier used in the report title.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The changes included in the payload, in resolver order.
    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    /// Paths dropped to stay within the payload budget.
    pub fn omitted(&self) -> &[String] {
        &self.omitted
    }

    /// The rendered user message.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }
}

/// What came back from the backend, plus locally derived cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub raw_markdown: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// `None` when the model has no entry in the price table.
    pub estimated_cost_usd: Option<f64>,
}
