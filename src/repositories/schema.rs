//! Schema bootstrap for the AGE backend.

use async_trait::async_trait;

use crate::error::{AppError, OperationExt};
use crate::graph::backends::postgres::PostgresClient;
use crate::graph::{GraphClient, SqlExecutor, Transaction};

use super::SchemaRepository;

const VERTEX_LABELS: &[&str] = &["User", "Product", "Category", "Price"];

/// `(label, property, unique)`
const INDEXES: &[(&str, &str, bool)] = &[
    ("User", "email", true),
    ("User", "id", true),
    ("Product", "id", true),
    ("Category", "name", true),
    ("Product", "name", false),
    ("Product", "category", false),
    ("Product", "price", false),
];

/// Declares labels and indexes in the AGE graph.
///
/// AGE keeps each label in its own table, so uniqueness is a unique
/// expression index over the property.
#[derive(Clone)]
pub struct AgeSchemaRepository {
    client: PostgresClient,
}

impl AgeSchemaRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

/// Statements creating any missing label or index; each one is idempotent.
fn schema_statements(graph: &str) -> Vec<String> {
    let labels = VERTEX_LABELS.iter().map(|label| {
        format!(
            r#"
            DO $$
            BEGIN
                IF NOT EXISTS (
                    SELECT 1 FROM ag_catalog.ag_label l
                    JOIN ag_catalog.ag_graph g ON l.graph = g.graphid
                    WHERE g.name = '{graph}' AND l.name = '{label}'
                ) THEN
                    PERFORM ag_catalog.create_vlabel('{graph}', '{label}');
                END IF;
            END $$;
            "#
        )
    });

    let indexes = INDEXES.iter().map(|(label, property, unique)| {
        format!(
            r#"CREATE {unique}INDEX IF NOT EXISTS idx_{graph}_{table}_{property}
                ON {graph}."{label}" ((ag_catalog.agtype_access_operator(properties, '"{property}"')::text));"#,
            unique = if *unique { "UNIQUE " } else { "" },
            table = label.to_lowercase(),
        )
    });

    labels.chain(indexes).collect()
}

#[async_trait]
impl SchemaRepository for AgeSchemaRepository {
    async fn ensure_schema(&self) -> Result<(), AppError> {
        let graph = self.client.graph_name();
        tracing::info!("Ensuring graph '{}' exists...", graph);
        self.client
            .ensure_graph_exists()
            .await
            .in_operation("schema.ensure_graph")?;

        let tx = self.client.begin().await.in_operation("schema.ensure_schema")?;
        for statement in schema_statements(graph) {
            if let Err(e) = tx.execute_sql(&statement).await {
                tx.rollback().await?;
                return Err(e.in_operation("schema.ensure_schema"));
            }
        }
        tx.commit().await.in_operation("schema.ensure_schema")?;

        tracing::info!(
            labels = VERTEX_LABELS.len(),
            indexes = INDEXES.len(),
            "schema ready"
        );
        Ok(())
    }
}
