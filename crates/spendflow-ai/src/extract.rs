//! Single-shot expense extraction.
//!
//! Turns free expense text ("petrol 60 by card") into a structured record via
//! one non-streaming completion. The result goes back to the client for
//! review; nothing is persisted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendflow_storage::ExpenseMetadata;

use crate::error::{AiError, Result};
use crate::llm::{CompletionRequest, LlmClient, Message};

/// Structured record extracted from free expense text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedExpense {
    pub raw_text: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub spent_by: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<ExpenseMetadata>,
}

fn extraction_prompt(raw_text: &str, date_context: &str) -> String {
    format!(
        r#"Analyze the expense text and extract structured data.
Infer missing details logically (e.g. "Petrol" -> category: Transport).

Text: "{raw_text}"
Date Context: {date_context}

Output only a JSON object with this schema, no prose:
{{
  "raw_text": string (original text),
  "amount": number | null,
  "category": string (e.g. Food, Transport, Shopping, Bills, Health, Entertainment, Other),
  "payment_method": string | null (e.g. Cash, UPI, Credit Card),
  "spent_by": string (default "User" if not specified),
  "description": string (short summary),
  "metadata": {{
    "tags": string[] (3-5 relevant tags, e.g. ["fuel", "vehicle", "monthly"]),
    "sentiment": string ("neutral", "happy", "regret"),
    "urgency": string ("high", "medium", "low")
  }}
}}"#
    )
}

/// Extract a structured expense record from free text.
pub async fn extract_expense(
    client: &dyn LlmClient,
    raw_text: &str,
    date_context: Option<DateTime<Utc>>,
) -> Result<ExtractedExpense> {
    let date = date_context.unwrap_or_else(Utc::now).to_rfc3339();
    let request = CompletionRequest::new(vec![Message::user(extraction_prompt(raw_text, &date))]);

    let response = client.complete(request).await?;
    let content = response
        .content
        .ok_or_else(|| AiError::InvalidFormat("empty extraction response".to_string()))?;

    parse_extraction(&content)
}

/// Parse the model's output, tolerating ``` fences around the JSON.
fn parse_extraction(content: &str) -> Result<ExtractedExpense> {
    let cleaned = content.replace("```json", "").replace("```", "");

    serde_json::from_str(cleaned.trim()).map_err(|e| {
        AiError::InvalidFormat(format!("extraction output is not valid JSON: {}", e))
    })
}
