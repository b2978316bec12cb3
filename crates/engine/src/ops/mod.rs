use std::future::Future;
use std::pin::Pin;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{EngineError, ResultEngine};

mod accounts;
mod deposits;
mod transfers;

/// Future returned by a unit of work running inside a database transaction.
pub(crate) type TxFuture<'t, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 't>>;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Runs `work` as one unit of work inside a database transaction.
    ///
    /// Commits on success and returns the unit's result. On failure the
    /// transaction is rolled back and the original error returned unchanged;
    /// if the rollback itself fails, both errors are surfaced together as
    /// [`EngineError::RollbackFailed`]. No retries happen at this layer.
    pub(crate) async fn with_tx<T, F>(&self, work: F) -> ResultEngine<T>
    where
        F: for<'t> FnOnce(&'t Engine, &'t DatabaseTransaction) -> TxFuture<'t, T>,
    {
        let db_tx = self.database.begin().await?;
        match work(self, &db_tx).await {
            Ok(value) => {
                db_tx.commit().await?;
                Ok(value)
            }
            Err(err) => match db_tx.rollback().await {
                Ok(()) => Err(err),
                Err(rollback_err) => {
                    tracing::warn!(
                        error = %err,
                        rollback_error = %rollback_err,
                        "rollback failed after aborted unit of work"
                    );
                    Err(EngineError::RollbackFailed {
                        source: Box::new(err),
                        rollback: rollback_err,
                    })
                }
            },
        }
    }

    pub(crate) fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
