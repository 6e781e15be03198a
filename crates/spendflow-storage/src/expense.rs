//! Expense storage - typed table wrapper for expense records.

use anyhow::Result;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const EXPENSE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("expenses");

/// Free-form enrichment attached to an expense by the extraction step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

/// A single expense record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub date: DateTime<Utc>,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExpenseMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Create a new expense record dated now with a fresh id.
    pub fn new(raw_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            date: now,
            raw_text: raw_text.into(),
            amount: None,
            category: None,
            payment_method: None,
            description: None,
            spent_by: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-category spending total, ready for chart payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub value: f64,
}

/// Typed expense storage backed by a single redb table.
pub struct ExpenseStorage {
    db: Arc<Database>,
}

impl ExpenseStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(EXPENSE_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert or replace an expense record.
    pub fn insert(&self, expense: &Expense) -> Result<()> {
        let data = serde_json::to_vec(expense)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(EXPENSE_TABLE)?;
            table.insert(expense.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get an expense by id.
    pub fn get(&self, id: &str) -> Result<Option<Expense>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXPENSE_TABLE)?;

        if let Some(value) = table.get(id)? {
            Ok(Some(serde_json::from_slice(value.value())?))
        } else {
            Ok(None)
        }
    }

    /// List all expenses, newest first.
    pub fn list(&self) -> Result<Vec<Expense>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXPENSE_TABLE)?;

        let mut expenses = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            expenses.push(serde_json::from_slice::<Expense>(value.value())?);
        }
        expenses.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(expenses)
    }

    /// The `limit` most recent expenses, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Expense>> {
        let mut expenses = self.list()?;
        expenses.truncate(limit);
        Ok(expenses)
    }

    /// Total amount spent per category, largest first.
    ///
    /// Expenses with an empty or missing category label are excluded.
    pub fn category_totals(&self) -> Result<Vec<CategoryTotal>> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for expense in self.list()? {
            let Some(category) = expense.category.as_deref() else {
                continue;
            };
            if category.is_empty() {
                continue;
            }
            *totals.entry(category.to_string()).or_insert(0.0) += expense.amount.unwrap_or(0.0);
        }

        let mut totals: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(name, value)| CategoryTotal { name, value })
            .collect();
        totals.sort_by(|a, b| b.value.total_cmp(&a.value));

        Ok(totals)
    }

    /// Delete an expense by id, returning whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(EXPENSE_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use tempfile::tempdir;

    fn test_storage() -> (tempfile::TempDir, ExpenseStorage) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        let storage = ExpenseStorage::new(db).unwrap();
        (temp_dir, storage)
    }

    fn expense_on(day: u32, amount: f64, category: Option<&str>) -> Expense {
        let mut expense = Expense::new(format!("expense on day {}", day));
        expense.date = Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap();
        expense.amount = Some(amount);
        expense.category = category.map(str::to_string);
        expense
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, storage) = test_storage();

        let expense = expense_on(1, 42.5, Some("Food"));
        storage.insert(&expense).unwrap();

        let retrieved = storage.get(&expense.id).unwrap().unwrap();
        assert_eq!(retrieved.raw_text, expense.raw_text);
        assert_eq!(retrieved.amount, Some(42.5));
        assert_eq!(retrieved.category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_recent_is_newest_first_and_bounded() {
        let (_dir, storage) = test_storage();

        for day in 1..=5 {
            storage.insert(&expense_on(day, day as f64, None)).unwrap();
        }

        let recent = storage.recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].date.day(), 5);
        assert_eq!(recent[1].date.day(), 4);
        assert_eq!(recent[2].date.day(), 3);
    }

    #[test]
    fn test_category_totals_skip_empty_labels() {
        let (_dir, storage) = test_storage();

        storage.insert(&expense_on(1, 100.0, Some("Food"))).unwrap();
        storage.insert(&expense_on(2, 50.0, Some("Food"))).unwrap();
        storage
            .insert(&expense_on(3, 30.0, Some("Transport")))
            .unwrap();
        storage.insert(&expense_on(4, 999.0, Some(""))).unwrap();
        storage.insert(&expense_on(5, 999.0, None)).unwrap();

        let totals = storage.category_totals().unwrap();
        assert_eq!(
            totals,
            vec![
                CategoryTotal {
                    name: "Food".to_string(),
                    value: 150.0
                },
                CategoryTotal {
                    name: "Transport".to_string(),
                    value: 30.0
                },
            ]
        );
    }

    #[test]
    fn test_delete() {
        let (_dir, storage) = test_storage();

        let expense = expense_on(1, 10.0, None);
        storage.insert(&expense).unwrap();

        assert!(storage.delete(&expense.id).unwrap());
        assert!(!storage.delete(&expense.id).unwrap());
        assert!(storage.get(&expense.id).unwrap().is_none());
    }
}
