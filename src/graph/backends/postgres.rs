//! PostgreSQL + Apache AGE backend.
//!
//! Cypher runs through AGE's `cypher()` SQL function; connections come from a
//! bounded deadpool pool and go back to it when the row stream (or the
//! transaction) holding them is dropped.
//!
//! ```ignore
//! use graphmart::graph::backends::postgres::PostgresClient;
//! use graphmart::graph::QueryExt;
//!
//! let client = PostgresClient::connect(&config.postgres).await?;
//! let rows = client.query("MATCH (p:Product) RETURN p").fetch_all().await?;
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use deadpool_postgres::{
    Manager, ManagerConfig, Object, Pool, PoolError, RecyclingMethod, Runtime, TimeoutType,
};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value as JsonValue;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::NoTls;

use crate::config::PostgresConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{CypherExecutor, GraphClient, SqlExecutor, Transaction};

/// Cypher parameters in agtype's binary format.
///
/// `cypher()` only accepts its parameter map as `agtype`, so the JSON is sent
/// with a leading version byte. Values travel as a bound parameter and are
/// never spliced into the query text.
#[derive(Debug, Clone)]
struct Agtype(String);

impl ToSql for Agtype {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.extend_from_slice(&[1]);
        out.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        // agtype's OID differs per installation
        ty.name() == "agtype"
    }

    to_sql_checked!();
}

/// PostgreSQL + Apache AGE graph client.
///
/// Cheap to clone; the pool is reference counted.
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
    graph_name: Arc<str>,
}

impl PostgresClient {
    /// Builds the connection pool. No connection is opened until first use.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config = config.uri.parse().map_err(|e| {
            AppError::Internal(format!("Invalid PostgreSQL connection string: {}", e))
        })?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(config.pool_size)
            .wait_timeout(Some(config.acquire_timeout()))
            .create_timeout(Some(config.acquire_timeout()))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create connection pool: {}", e)))?;

        tracing::info!(
            graph = %config.graph_name,
            pool_size = config.pool_size,
            "PostgreSQL pool ready"
        );

        Ok(Self {
            pool,
            graph_name: Arc::from(config.graph_name.as_str()),
        })
    }

    /// Checks a connection out of the pool and prepares the AGE session.
    async fn get_connection(&self) -> Result<Object, AppError> {
        let conn = self.pool.get().await.map_err(pool_error)?;

        conn.batch_execute("LOAD 'age'; SET search_path = ag_catalog, \"$user\", public;")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to initialize AGE session: {}", e)))?;

        Ok(conn)
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    /// Creates the AGE graph unless it already exists.
    pub async fn ensure_graph_exists(&self) -> Result<(), AppError> {
        let conn = self.get_connection().await?;

        // create_graph has no IF NOT EXISTS form
        let sql = format!(
            r#"
            DO $$
            BEGIN
                IF NOT EXISTS (
                    SELECT 1 FROM ag_catalog.ag_graph WHERE name = '{name}'
                ) THEN
                    PERFORM ag_catalog.create_graph('{name}');
                END IF;
            END $$;
            "#,
            name = self.graph_name
        );

        conn.batch_execute(&sql)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to ensure graph exists: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl CypherExecutor for PostgresClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let conn = self.get_connection().await?;
        execute_pg_cypher_owned(conn, self.graph_name.clone(), cypher.to_string(), params)
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        drain(self.execute_cypher(cypher, params).await?).await
    }
}

#[async_trait]
impl SqlExecutor for PostgresClient {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        let conn = self.get_connection().await?;
        conn.batch_execute(sql)
            .await
            .map_err(|e| AppError::Internal(format!("SQL execution failed: {}", db_error_detail(&e))))
    }
}

#[async_trait]
impl GraphClient for PostgresClient {
    type Tx<'a> = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let conn = self.get_connection().await?;

        conn.batch_execute("BEGIN")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to begin transaction: {}", e)))?;

        Ok(PostgresTransaction {
            conn,
            graph_name: self.graph_name.clone(),
            finished: false,
        })
    }
}

/// A transaction pinned to one pooled connection.
///
/// Must be committed or rolled back explicitly.
pub struct PostgresTransaction {
    conn: Object,
    graph_name: Arc<str>,
    finished: bool,
}

#[async_trait]
impl CypherExecutor for PostgresTransaction {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        execute_pg_cypher(&self.conn, &self.graph_name, cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        drain(self.execute_cypher(cypher, params).await?).await
    }
}

#[async_trait]
impl SqlExecutor for PostgresTransaction {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        self.conn.batch_execute(sql).await.map_err(|e| {
            AppError::Internal(format!("SQL execution failed: {}", db_error_detail(&e)))
        })
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(mut self) -> Result<(), AppError> {
        self.finished = true;
        self.conn
            .batch_execute("COMMIT")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(mut self) -> Result<(), AppError> {
        self.finished = true;
        self.conn
            .batch_execute("ROLLBACK")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to rollback transaction: {}", e)))
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("PostgresTransaction dropped without commit or rollback");
        }
    }
}

/// Only waiting on a full pool is exhaustion; failing to open or recycle a
/// connection is a store failure.
fn pool_error(e: PoolError) -> AppError {
    match e {
        PoolError::Timeout(TimeoutType::Wait) => {
            AppError::ResourceExhausted("no database connection available".to_string())
        }
        other => AppError::Internal(format!("Failed to get connection from pool: {}", other)),
    }
}

async fn drain(mut stream: RowStream<'_>) -> Result<(), AppError> {
    while let Some(result) = stream.next().await {
        result?;
    }
    Ok(())
}

/// Severity, message and SQLSTATE of a database error, or the plain error text.
fn db_error_detail(e: &tokio_postgres::Error) -> String {
    e.as_db_error()
        .map(|db_err| {
            format!(
                "{}: {} ({})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            )
        })
        .unwrap_or_else(|| e.to_string())
}

/// Maps a failed Cypher statement; unique index violations become `Constraint`.
fn cypher_error(e: tokio_postgres::Error, cypher: &str) -> AppError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        return AppError::Constraint(db_error_detail(&e));
    }
    AppError::Query {
        message: format!("Cypher query failed: {}", db_error_detail(&e)),
        query: cypher.to_string(),
    }
}

/// Runs Cypher on a borrowed connection (transactions).
async fn execute_pg_cypher<'a>(
    conn: &'a Object,
    graph_name: &str,
    cypher: &str,
    params: Params,
) -> Result<RowStream<'a>, AppError> {
    let (sql, agtype_param) = build_age_query(graph_name, cypher, &params)?;

    let stream = match &agtype_param {
        None => {
            conn.query_raw::<_, &Agtype, _>(&sql, std::iter::empty())
                .await
        }
        Some(param) => conn.query_raw(&sql, std::iter::once(param)).await,
    }
    .map_err(|e| cypher_error(e, cypher))?;

    let cypher = cypher.to_string();
    Ok(Box::pin(
        stream
            .map_ok(|row| parse_pg_row(&row))
            .map_err(move |e| cypher_error(e, &cypher)),
    ))
}

/// Runs Cypher on an owned connection (auto-commit).
///
/// The generator owns the connection, so it returns to the pool when the
/// stream is dropped.
fn execute_pg_cypher_owned(
    conn: Object,
    graph_name: Arc<str>,
    cypher: String,
    params: Params,
) -> Result<RowStream<'static>, AppError> {
    use async_stream::try_stream;

    let (sql, agtype_param) = build_age_query(&graph_name, &cypher, &params)?;
    tracing::trace!(%sql, "executing cypher");

    Ok(Box::pin(try_stream! {
        let stream = match &agtype_param {
            None => conn.query_raw::<_, &Agtype, _>(&sql, std::iter::empty()).await,
            Some(param) => conn.query_raw(&sql, std::iter::once(param)).await,
        }
        .map_err(|e| cypher_error(e, &cypher))?;

        futures::pin_mut!(stream);
        while let Some(pg_row) = stream.try_next().await.map_err(|e| cypher_error(e, &cypher))? {
            yield parse_pg_row(&pg_row);
        }
    }))
}

/// Wraps Cypher in the SQL AGE expects.
///
/// The column list must mirror the RETURN clause, e.g. `RETURN p, count(u) AS
/// buyers` becomes `as ("p" agtype, "buyers" agtype)`. Write-only queries get
/// a single placeholder column and yield no rows.
fn build_age_query(
    graph_name: &str,
    cypher: &str,
    params: &Params,
) -> Result<(String, Option<Agtype>), AppError> {
    use crate::graph::{extract_return_columns, ParseError};

    let columns_sql = match extract_return_columns(cypher) {
        Ok(columns) => columns
            .iter()
            // quoted, so names like "count" are not read as keywords
            .map(|name| format!("\"{}\" agtype", name.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", "),
        Err(ParseError::NoReturnClause) => "result agtype".to_string(),
        Err(ParseError::ReturnStarNotSupported) => {
            return Err(AppError::Internal(
                "RETURN * is not supported - please specify columns explicitly".into(),
            ));
        }
        Err(ParseError::InvalidSyntax(msg)) => {
            return Err(AppError::Query {
                message: format!("Cypher syntax error: {}", msg),
                query: cypher.to_string(),
            });
        }
    };

    if params.is_empty() {
        let sql = format!(
            "SELECT * FROM cypher('{}', $$ {} $$) as ({})",
            graph_name, cypher, columns_sql
        );
        Ok((sql, None))
    } else {
        let sql = format!(
            "SELECT * FROM cypher('{}', $$ {} $$, $1) as ({})",
            graph_name, cypher, columns_sql
        );
        let params_json = serde_json::to_string(params)
            .map_err(|e| AppError::Internal(format!("Failed to serialize parameters: {}", e)))?;
        Ok((sql, Some(Agtype(params_json))))
    }
}

/// Converts a PostgreSQL row into a [`Row`], decoding agtype columns as JSON.
fn parse_pg_row(pg_row: &tokio_postgres::Row) -> Row {
    fn get<'a, T, F>(row: &'a tokio_postgres::Row, idx: usize, f: F) -> JsonValue
    where
        T: tokio_postgres::types::FromSql<'a>,
        F: FnOnce(T) -> Option<JsonValue>,
    {
        row.try_get::<_, T>(idx)
            .ok()
            .and_then(f)
            .unwrap_or(JsonValue::Null)
    }

    let mut data = HashMap::new();

    for (idx, column) in pg_row.columns().iter().enumerate() {
        let value = match column.type_().name() {
            "agtype" => get(pg_row, idx, |v: AgtypeValue| Some(v.0)),
            "int2" => get(pg_row, idx, |v: i16| Some(v.into())),
            "int4" => get(pg_row, idx, |v: i32| Some(v.into())),
            "int8" => get(pg_row, idx, |v: i64| Some(v.into())),
            "float4" => get(pg_row, idx, |v: f32| {
                serde_json::Number::from_f64(v as f64).map(JsonValue::Number)
            }),
            "float8" => get(pg_row, idx, |v: f64| {
                serde_json::Number::from_f64(v).map(JsonValue::Number)
            }),
            "bool" => get(pg_row, idx, |v: bool| Some(JsonValue::Bool(v))),
            "json" | "jsonb" => get(pg_row, idx, |v: JsonValue| Some(v)),
            _ => get(pg_row, idx, |v: String| Some(JsonValue::String(v))),
        };

        data.insert(column.name().to_string(), value);
    }

    Row::new(data)
}

/// agtype column reader: version byte, then JSON with optional type suffix.
#[derive(Debug)]
struct AgtypeValue(JsonValue);

impl<'a> tokio_postgres::types::FromSql<'a> for AgtypeValue {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(AgtypeValue(decode_agtype(raw)?))
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "agtype"
    }
}

fn decode_agtype(raw: &[u8]) -> Result<JsonValue, Box<dyn Error + Sync + Send>> {
    let Some((&version, rest)) = raw.split_first() else {
        return Ok(JsonValue::Null);
    };
    let json_bytes = if version == 1 { rest } else { raw };
    let text = std::str::from_utf8(json_bytes)?;

    let clean = text
        .trim_end_matches("::vertex")
        .trim_end_matches("::edge")
        .trim_end_matches("::path")
        .trim_end_matches("::numeric");

    Ok(serde_json::from_str(clean)?)
}
