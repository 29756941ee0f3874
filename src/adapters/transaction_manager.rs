//! Transaction Manager for atomic multi-table writes
//!
//! Every logical write that touches more than one table (a prediction with its
//! reasoning, an outcome with its market status change) runs inside one
//! `ManagedTransaction`. Commit on success; rollback on error or drop.

use crate::error::{MaverickError, Result};
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, instrument, warn};

/// Transaction scope identifier for tracking and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionScope {
    /// Prediction insert plus optional reasoning trace
    PredictionWithReasoning,
    /// Outcome insert plus market status change
    Resolution,
}

impl std::fmt::Display for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PredictionWithReasoning => write!(f, "prediction_with_reasoning"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Transaction Manager for atomic database operations
#[derive(Clone)]
pub struct TransactionManager {
    pool: SqlitePool,
}

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Begin a new transaction with scope tracking
    #[instrument(skip(self))]
    pub async fn begin(&self, scope: TransactionScope) -> Result<ManagedTransaction> {
        let tx = self.pool.begin().await?;
        debug!("Started transaction for scope: {}", scope);
        Ok(ManagedTransaction {
            tx: Some(tx),
            scope,
            committed: false,
        })
    }
}

/// Scoped transaction; rolled back unless `commit` succeeds
pub struct ManagedTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
    scope: TransactionScope,
    committed: bool,
}

impl ManagedTransaction {
    /// Get mutable reference to the underlying connection for executing queries
    /// Use as: `.execute(tx.executor()?).await`
    pub fn executor(&mut self) -> Result<&mut SqliteConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(MaverickError::Internal(format!(
                "transaction for scope {} already finished",
                self.scope
            ))),
        }
    }

    pub fn scope(&self) -> TransactionScope {
        self.scope
    }

    /// Commit the transaction
    pub async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            self.committed = true;
            debug!("Committed transaction for scope: {}", self.scope);
        }
        Ok(())
    }

    /// Rollback the transaction explicitly
    pub async fn rollback(mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            warn!("Rolled back transaction for scope: {}", self.scope);
        }
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err`, returning the original error unchanged
    pub async fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                let scope = self.scope;
                if let Err(rollback_err) = self.rollback().await {
                    warn!("Rollback for scope {} failed: {}", scope, rollback_err);
                }
                Err(e)
            }
        }
    }
}

impl Drop for ManagedTransaction {
    fn drop(&mut self) {
        if self.tx.is_some() && !self.committed {
            // Transaction will be rolled back automatically by sqlx
            warn!(
                "Transaction for scope {} was dropped without commit - rolling back",
                self.scope
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn test_transaction_scope_display() {
        assert_eq!(
            TransactionScope::PredictionWithReasoning.to_string(),
            "prediction_with_reasoning"
        );
        assert_eq!(TransactionScope::Resolution.to_string(), "resolution");
    }

    #[tokio::test]
    async fn test_finish_commits_on_ok() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE t (v INTEGER)")
            .execute(&pool)
            .await
            .unwrap();

        let manager = TransactionManager::new(pool.clone());
        let mut tx = manager.begin(TransactionScope::Resolution).await.unwrap();
        let inserted = sqlx::query("INSERT INTO t (v) VALUES (1)")
            .execute(tx.executor().unwrap())
            .await
            .map(|_| ())
            .map_err(MaverickError::from);
        tx.finish(inserted).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_finish_rolls_back_on_err() {
        let pool = pool().await;
        sqlx::query("CREATE TABLE t (v INTEGER)")
            .execute(&pool)
            .await
            .unwrap();

        let manager = TransactionManager::new(pool.clone());
        let mut tx = manager.begin(TransactionScope::Resolution).await.unwrap();
        sqlx::query("INSERT INTO t (v) VALUES (1)")
            .execute(tx.executor().unwrap())
            .await
            .unwrap();
        let failed: Result<()> = Err(MaverickError::Internal("forced".into()));
        let err = tx.finish(failed).await.unwrap_err();
        assert!(matches!(err, MaverickError::Internal(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
