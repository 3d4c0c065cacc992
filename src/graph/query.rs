//! Query builder for fluent Cypher query construction.

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A builder for constructing and executing Cypher queries.
///
/// ```ignore
/// let rows = Query::new(&*graph, "MATCH (p:Product {id: $id}) RETURN p")
///     .param("id", "42")
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    cypher: String,
    params: Params,
    bind_error: Option<AppError>,
}

impl<'a, E: CypherExecutor + ?Sized> Query<'a, E> {
    pub fn new(executor: &'a E, cypher: &str) -> Self {
        Self {
            executor,
            cypher: cypher.to_string(),
            params: Params::new(),
            bind_error: None,
        }
    }

    /// Binds a parameter referenced in Cypher as `$name`.
    ///
    /// A value that fails to serialize is reported when the query executes.
    pub fn param<T: Serialize>(mut self, name: &str, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(json_value) => {
                self.params.insert(name.to_string(), json_value);
            }
            Err(e) => {
                self.bind_error.get_or_insert_with(|| {
                    AppError::Internal(format!("failed to bind parameter '{}': {}", name, e))
                });
            }
        }
        self
    }

    /// Executes the query and returns a stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        if let Some(err) = self.bind_error {
            return Err(err);
        }
        self.executor
            .execute_cypher(&self.cypher, self.params)
            .await
    }

    /// Executes the query and collects all rows.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the query and returns the first row, if any.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let mut stream = self.execute().await?;
        stream.next().await.transpose()
    }

    /// Executes the query without returning results.
    pub async fn run(self) -> Result<(), AppError> {
        if let Some(err) = self.bind_error {
            return Err(err);
        }
        self.executor.run_cypher(&self.cypher, self.params).await
    }
}

/// Extension trait providing `executor.query("...")`.
pub trait QueryExt: CypherExecutor {
    fn query(&self, cypher: &str) -> Query<'_, Self> {
        Query::new(self, cypher)
    }
}

impl<E: CypherExecutor + ?Sized> QueryExt for E {}
