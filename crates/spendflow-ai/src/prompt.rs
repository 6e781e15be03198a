//! Analyst system preamble and keyword-gated context assembly.
//!
//! The assembler inspects the user's latest message for coarse keyword
//! signals and, when they fire, inlines stored expense data into the system
//! preamble. This is a heuristic, not a classifier: a message like "my last
//! haircut" pulls in recent transactions too, and that is accepted behavior.

use chrono::{DateTime, Utc};
use serde::Serialize;
use spendflow_storage::ExpenseStorage;

/// Fixed system preamble for the financial analyst assistant.
pub const ANALYST_SYSTEM_PROMPT: &str = r#"You are a financial analyst assistant for a personal expense tracking app. You help the user understand their spending habits, provide data-driven insights, and visualize data when it adds value.

## Behavior
- Tone: professional, clear, conversational.
- Structure responses logically: summary, details, insights, recommendations.
- Base every figure on the expense data provided in this prompt; if the data is insufficient, say so plainly.
- Use pie charts for category breakdowns and proportions, bar charts for rankings or time comparisons. Use charts sparingly, with descriptive titles.

## Chart Format
When a chart helps, end your response with:
[CHART:type|title|data]
Where:
- type: "pie" or "bar"
- title: chart title
- data: JSON array like [{"name":"Food","value":200}]

Example: [CHART:pie|Spending by Category|[{"name":"Food","value":500},{"name":"Transport","value":200}]]"#;

/// How many transactions the recent-expenses block carries.
const RECENT_LIMIT: usize = 10;

const RECENT_KEYWORDS: &[&str] = &["recent", "last", "latest"];
const CATEGORY_KEYWORDS: &[&str] = &["category", "categories", "spending", "distribution"];

#[derive(Serialize)]
struct ContextRow<'a> {
    date: DateTime<Utc>,
    amount: Option<f64>,
    category: Option<&'a str>,
    description: Option<&'a str>,
}

/// Builds the per-request system preamble: the fixed analyst prompt plus any
/// context blocks selected by the user's latest message.
pub struct ContextAssembler<'a> {
    expenses: &'a ExpenseStorage,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(expenses: &'a ExpenseStorage) -> Self {
        Self { expenses }
    }

    /// Assemble the system preamble for one request.
    ///
    /// Context blocks are appended in a fixed order and never overwrite each
    /// other. A failed query logs a warning and omits its block; it is never
    /// fatal to the request.
    pub fn assemble(&self, last_user_message: &str) -> String {
        let mut prompt = ANALYST_SYSTEM_PROMPT.to_string();
        let lower = last_user_message.to_lowercase();

        if RECENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            match self.expenses.recent(RECENT_LIMIT) {
                Ok(expenses) if !expenses.is_empty() => {
                    let rows: Vec<ContextRow> = expenses
                        .iter()
                        .map(|e| ContextRow {
                            date: e.date,
                            amount: e.amount,
                            category: e.category.as_deref(),
                            description: e.description.as_deref().or(Some(e.raw_text.as_str())),
                        })
                        .collect();
                    prompt.push_str("\n\nRecent Expense Transactions:\n");
                    prompt.push_str(&serde_json::to_string_pretty(&rows).unwrap_or_default());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("failed to load recent expenses for chat context: {}", e);
                }
            }
        }

        if CATEGORY_KEYWORDS.iter().any(|k| lower.contains(k)) {
            match self.expenses.category_totals() {
                Ok(totals) if !totals.is_empty() => {
                    prompt.push_str("\n\nCategory Distribution:\n");
                    prompt.push_str(&serde_json::to_string_pretty(&totals).unwrap_or_default());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("failed to load category totals for chat context: {}", e);
                }
            }
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use redb::Database;
    use spendflow_storage::Expense;
    use tempfile::tempdir;

    use super::*;

    fn seeded_storage() -> (tempfile::TempDir, ExpenseStorage) {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        let storage = ExpenseStorage::new(db).unwrap();

        let mut coffee = Expense::new("coffee 4.50");
        coffee.amount = Some(4.5);
        coffee.category = Some("Food".to_string());
        storage.insert(&coffee).unwrap();

        let mut fuel = Expense::new("petrol fill-up");
        fuel.amount = Some(60.0);
        fuel.category = Some("Transport".to_string());
        storage.insert(&fuel).unwrap();

        (temp_dir, storage)
    }

    #[test]
    fn test_recency_keyword_adds_transactions_block() {
        let (_dir, storage) = seeded_storage();
        let assembler = ContextAssembler::new(&storage);

        let prompt = assembler.assemble("Show me recent expenses");
        assert!(prompt.starts_with(ANALYST_SYSTEM_PROMPT));
        assert!(prompt.contains("Recent Expense Transactions"));
        assert!(prompt.contains("coffee 4.50"));
    }

    #[test]
    fn test_category_keyword_adds_distribution_block() {
        let (_dir, storage) = seeded_storage();
        let assembler = ContextAssembler::new(&storage);

        let prompt = assembler.assemble("What is my spending by category?");
        assert!(prompt.contains("Category Distribution"));
        assert!(prompt.contains("Transport"));
    }

    #[test]
    fn test_both_blocks_concatenate_in_fixed_order() {
        let (_dir, storage) = seeded_storage();
        let assembler = ContextAssembler::new(&storage);

        let prompt = assembler.assemble("show my latest spending");
        let transactions = prompt.find("Recent Expense Transactions").unwrap();
        let distribution = prompt.find("Category Distribution").unwrap();
        assert!(transactions < distribution);
    }

    #[test]
    fn test_no_keywords_means_bare_preamble() {
        let (_dir, storage) = seeded_storage();
        let assembler = ContextAssembler::new(&storage);

        assert_eq!(assembler.assemble("Hello there"), ANALYST_SYSTEM_PROMPT);
    }

    #[test]
    fn test_false_positive_keyword_still_triggers() {
        // Heuristic, not a classifier: accepted behavior.
        let (_dir, storage) = seeded_storage();
        let assembler = ContextAssembler::new(&storage);

        let prompt = assembler.assemble("how much was my last haircut");
        assert!(prompt.contains("Recent Expense Transactions"));
    }

    #[test]
    fn test_empty_store_omits_blocks() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.db")).unwrap());
        let storage = ExpenseStorage::new(db).unwrap();
        let assembler = ContextAssembler::new(&storage);

        assert_eq!(
            assembler.assemble("recent spending please"),
            ANALYST_SYSTEM_PROMPT
        );
    }
}
