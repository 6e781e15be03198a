//! Expense extraction and persistence endpoints.
//!
//! Extraction and saving are two separate calls: the extracted record goes
//! back to the client for review first, and only the reviewed data is
//! committed.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spendflow_ai::extract::{self, ExtractedExpense};
use spendflow_storage::{Expense, ExpenseMetadata};
use tracing::error;

use crate::api::ApiResponse;
use crate::api::state::AppState;

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub raw_text: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct SaveExpenseRequest {
    pub raw_text: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
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

// POST /api/expenses/extract
pub async fn extract_expense(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Json<ApiResponse<ExtractedExpense>> {
    if request.raw_text.trim().is_empty() {
        return Json(ApiResponse::error("Missing text"));
    }

    match extract::extract_expense(state.llm.as_ref(), &request.raw_text, request.date).await {
        Ok(extracted) => Json(ApiResponse::ok(extracted)),
        Err(e) => {
            error!("expense extraction failed: {}", e);
            Json(ApiResponse::error(format!("Extraction failed: {}", e)))
        }
    }
}

// POST /api/expenses
pub async fn save_expense(
    State(state): State<AppState>,
    Json(request): Json<SaveExpenseRequest>,
) -> Json<ApiResponse<Expense>> {
    let mut expense = Expense::new(request.raw_text);
    if let Some(date) = request.date {
        expense.date = date;
    }
    expense.amount = request.amount;
    expense.category = request.category;
    expense.payment_method = request.payment_method;
    expense.spent_by = request.spent_by;
    expense.description = request.description;
    expense.metadata = request.metadata;

    match state.storage.expenses.insert(&expense) {
        Ok(()) => Json(ApiResponse::ok_with_message(expense, "Expense saved!")),
        Err(e) => Json(ApiResponse::error(format!("Failed to save expense: {}", e))),
    }
}

// GET /api/expenses
pub async fn list_expenses(State(state): State<AppState>) -> Json<ApiResponse<Vec<Expense>>> {
    match state.storage.expenses.list() {
        Ok(expenses) => Json(ApiResponse::ok(expenses)),
        Err(e) => Json(ApiResponse::error(format!("Failed to list expenses: {}", e))),
    }
}

// DELETE /api/expenses/{id}
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.storage.expenses.delete(&id) {
        Ok(true) => Json(ApiResponse::message("Expense deleted!")),
        Ok(false) => Json(ApiResponse::error(format!("Expense {} not found", id))),
        Err(e) => Json(ApiResponse::error(format!("Failed to delete expense: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use spendflow_ai::llm::{MockLlmClient, MockStep};
    use spendflow_storage::Storage;

    use super::*;
    use crate::api::state::AppContext;
    use crate::config::ServerConfig;

    fn test_state(client: MockLlmClient) -> (tempfile::TempDir, AppState) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Arc::new(Storage::new(db_path.to_str().unwrap()).unwrap());

        let state = Arc::new(AppContext {
            storage,
            llm: Arc::new(client),
            config: ServerConfig::test_defaults(),
        });
        (temp_dir, state)
    }

    #[tokio::test]
    async fn test_save_then_list_round_trip() {
        let (_dir, state) = test_state(MockLlmClient::new("mock"));

        let request = SaveExpenseRequest {
            raw_text: "coffee 4.50".to_string(),
            date: None,
            amount: Some(4.5),
            category: Some("Food".to_string()),
            payment_method: Some("Cash".to_string()),
            spent_by: None,
            description: None,
            metadata: None,
        };

        let saved = save_expense(State(state.clone()), Json(request)).await;
        assert!(saved.success);

        let listed = list_expenses(State(state)).await;
        let expenses = listed.0.data.unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount, Some(4.5));
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_text() {
        let (_dir, state) = test_state(MockLlmClient::new("mock"));

        let response = extract_expense(
            State(state),
            Json(ExtractRequest {
                raw_text: "   ".to_string(),
                date: None,
            }),
        )
        .await;

        assert!(!response.success);
        assert_eq!(response.0.message.as_deref(), Some("Missing text"));
    }

    #[tokio::test]
    async fn test_extract_returns_structured_record() {
        let client = MockLlmClient::from_steps(
            "mock",
            vec![MockStep::text(
                r#"{"raw_text": "bus ticket 3", "amount": 3.0, "category": "Transport"}"#,
            )],
        );
        let (_dir, state) = test_state(client);

        let response = extract_expense(
            State(state),
            Json(ExtractRequest {
                raw_text: "bus ticket 3".to_string(),
                date: None,
            }),
        )
        .await;

        let extracted = response.0.data.unwrap();
        assert_eq!(extracted.amount, Some(3.0));
        assert_eq!(extracted.category.as_deref(), Some("Transport"));
    }

    #[tokio::test]
    async fn test_delete_missing_expense_reports_error() {
        let (_dir, state) = test_state(MockLlmClient::new("mock"));

        let response = delete_expense(State(state), Path("nope".to_string())).await;
        assert!(!response.success);
    }
}
