//! Recording executor for unit tests of Cypher-backed repositories.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A query the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub cypher: String,
    pub params: Params,
    /// True when issued through `run_cypher`.
    pub write: bool,
}

enum Scripted {
    Rows(Vec<Row>),
    Fail(String),
}

/// Answers queries from a script, in order; unscripted queries get no rows.
#[derive(Default)]
pub struct MockExecutor {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.script.lock().unwrap().push_back(Scripted::Rows(rows));
    }

    /// Queue a query failure for the next query.
    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("no query was issued")
    }

    fn answer(&self, cypher: &str, params: Params, write: bool) -> Result<Vec<Row>, AppError> {
        self.calls.lock().unwrap().push(RecordedCall {
            cypher: cypher.to_string(),
            params,
            write,
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Fail(message)) => Err(AppError::Query {
                message,
                query: cypher.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl CypherExecutor for MockExecutor {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let rows = self.answer(cypher, params, false)?;
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.answer(cypher, params, true).map(|_| ())
    }
}
