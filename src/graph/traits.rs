//! Core traits for graph database abstraction.
//!
//! - [`CypherExecutor`] - Run Cypher; every backend implements it
//! - [`SqlExecutor`] - Run SQL; used for DDL such as index declarations
//! - [`Transaction`] - Commit or roll back a unit of work
//! - [`GraphClient`] - Pooled client that can open transactions

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher queries against a graph database.
///
/// Repositories depend on this trait only, held as `Arc<dyn CypherExecutor>`,
/// so the concrete backend is chosen once at startup.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a Cypher query and returns a stream of result rows.
    ///
    /// Use this for queries that return data (MATCH ... RETURN).
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a Cypher query without returning results.
    ///
    /// Use this for mutations (CREATE, MERGE, DELETE, SET).
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

/// Executes SQL statements against the database.
///
/// Only backends built on a relational engine implement this. The schema
/// bootstrapper needs it because AGE declares indexes in SQL, not Cypher.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes one or more SQL statements without returning results.
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError>;
}

/// Transaction lifecycle management.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits the transaction, making all changes permanent.
    async fn commit(self) -> Result<(), AppError>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self) -> Result<(), AppError>;
}

/// A graph database client that can begin transactions.
///
/// Auto-commit queries go through the [`CypherExecutor`] methods and hold a
/// pooled connection only for the lifetime of their row stream.
#[async_trait]
pub trait GraphClient: CypherExecutor {
    /// The transaction type returned by this client.
    type Tx<'a>: Transaction + CypherExecutor + SqlExecutor
    where
        Self: 'a;

    /// Begins a new transaction on a dedicated pooled connection.
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}
