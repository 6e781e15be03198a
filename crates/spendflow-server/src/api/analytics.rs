//! Dashboard aggregation endpoint.

use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use chrono::NaiveDate;
use serde::Serialize;
use spendflow_storage::{CategoryTotal, Expense};

use crate::api::ApiResponse;
use crate::api::state::AppState;

/// How many days of daily-trend data the summary carries.
const DAILY_TREND_DAYS: usize = 30;

#[derive(Serialize)]
pub struct CategoryShare {
    pub name: String,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Serialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Serialize)]
pub struct AnalyticsSummary {
    pub expenses: Vec<Expense>,
    pub total_spent: f64,
    pub average_spent: f64,
    pub expense_count: usize,
    pub category_data: Vec<CategoryTotal>,
    pub category_percentage: Vec<CategoryShare>,
    pub daily_data: Vec<DailySpend>,
    pub method_data: Vec<CategoryTotal>,
}

// GET /api/analytics
pub async fn get_analytics(State(state): State<AppState>) -> Json<ApiResponse<AnalyticsSummary>> {
    match state.storage.expenses.list() {
        Ok(expenses) => Json(ApiResponse::ok(summarize(expenses))),
        Err(e) => Json(ApiResponse::error(format!(
            "Failed to fetch analytics: {}",
            e
        ))),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate the whole store into the dashboard summary. An empty store
/// yields a zeroed summary, never an error.
fn summarize(expenses: Vec<Expense>) -> AnalyticsSummary {
    let expense_count = expenses.len();
    let total_spent: f64 = expenses.iter().filter_map(|e| e.amount).sum();
    let average_spent = if expense_count > 0 {
        total_spent / expense_count as f64
    } else {
        0.0
    };

    // Category breakdown; uncategorized rows count as "Other" here, unlike
    // the chat context query which drops them.
    let mut category_map: HashMap<String, f64> = HashMap::new();
    for expense in &expenses {
        let category = expense
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("Other");
        *category_map.entry(category.to_string()).or_insert(0.0) +=
            expense.amount.unwrap_or(0.0);
    }
    let mut category_data: Vec<CategoryTotal> = category_map
        .into_iter()
        .map(|(name, value)| CategoryTotal {
            name,
            value: round2(value),
        })
        .collect();
    category_data.sort_by(|a, b| b.value.total_cmp(&a.value));

    let category_percentage = category_data
        .iter()
        .map(|total| CategoryShare {
            name: total.name.clone(),
            value: total.value,
            percentage: if total_spent > 0.0 {
                round1(total.value / total_spent * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    // Daily spending trend, most recent days only.
    let mut daily_map: HashMap<NaiveDate, f64> = HashMap::new();
    for expense in &expenses {
        *daily_map.entry(expense.date.date_naive()).or_insert(0.0) +=
            expense.amount.unwrap_or(0.0);
    }
    let mut daily_data: Vec<DailySpend> = daily_map
        .into_iter()
        .map(|(date, amount)| DailySpend {
            date,
            amount: round2(amount),
        })
        .collect();
    daily_data.sort_by_key(|d| d.date);
    if daily_data.len() > DAILY_TREND_DAYS {
        daily_data.drain(..daily_data.len() - DAILY_TREND_DAYS);
    }

    // Payment method breakdown.
    let mut method_map: HashMap<String, f64> = HashMap::new();
    for expense in &expenses {
        let method = expense.payment_method.as_deref().unwrap_or("Unknown");
        *method_map.entry(method.to_string()).or_insert(0.0) +=
            expense.amount.unwrap_or(0.0);
    }
    let mut method_data: Vec<CategoryTotal> = method_map
        .into_iter()
        .map(|(name, value)| CategoryTotal {
            name,
            value: round2(value),
        })
        .collect();
    method_data.sort_by(|a, b| b.value.total_cmp(&a.value));

    AnalyticsSummary {
        expenses,
        total_spent: round2(total_spent),
        average_spent: round2(average_spent),
        expense_count,
        category_data,
        category_percentage,
        daily_data,
        method_data,
    }
}
