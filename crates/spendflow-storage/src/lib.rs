//! SpendFlow Storage - embedded persistence layer
//!
//! This crate provides the persistence layer for SpendFlow, using redb as the
//! embedded database. The database is created once at process start, owned by
//! the [`Storage`] manager, and handed to request handlers explicitly; there is
//! no process-global connection cache.
//!
//! # Tables
//!
//! - `expenses` - Expense records, keyed by uuid, JSON-encoded rows

pub mod expense;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use expense::{CategoryTotal, Expense, ExpenseMetadata, ExpenseStorage};

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub expenses: ExpenseStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let expenses = ExpenseStorage::new(db.clone())?;

        Ok(Self { db, expenses })
    }

    /// Access the underlying database handle.
    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_storage_initialization() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Storage::new(db_path.to_str().unwrap()).unwrap();

        assert!(storage.expenses.list().unwrap().is_empty());
    }
}
