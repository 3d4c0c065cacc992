//! Cypher catalog repository.

use async_trait::async_trait;

use crate::context::AppGraph;
use crate::error::{AppError, OperationExt};
use crate::graph::{Node, QueryExt, Row};
use crate::models::{Category, Product, ProductSeed};

use super::{validate_seeds, CatalogRepository};

/// Catalog queries over a Cypher executor.
#[derive(Clone)]
pub struct CypherCatalogRepository {
    graph: AppGraph,
}

impl CypherCatalogRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    async fn fetch_products(
        &self,
        cypher: &str,
        params: &[(&str, &str)],
        operation: &'static str,
    ) -> Result<Vec<Product>, AppError> {
        let mut query = self.graph.query(cypher);
        for (name, value) in params {
            query = query.param(name, value);
        }
        let rows = query.fetch_all().await.in_operation(operation)?;
        rows.iter()
            .map(|row| product_from_row(row, "p"))
            .collect::<Result<Vec<_>, _>>()
            .in_operation(operation)
    }

    async fn find(&self, id: &str) -> Result<Option<Product>, AppError> {
        let row = self
            .graph
            .query("MATCH (p:Product {id: $id}) RETURN p")
            .param("id", id)
            .fetch_one()
            .await?;

        row.map(|row| product_from_row(&row, "p")).transpose()
    }

    async fn seed_product(&self, seed: &ProductSeed) -> Result<(), AppError> {
        let product = seed.to_product();

        self.graph
            .query(
                "CREATE (p:Product {
                     id: $id,
                     name: $name,
                     description: $description,
                     price: $price,
                     category: $category,
                     imageUrl: $image_url,
                     stock: $stock,
                     tags: $tags
                 })",
            )
            .param("id", &product.id)
            .param("name", &product.name)
            .param("description", &product.description)
            .param("price", product.price)
            .param("category", &product.category)
            .param("image_url", &product.image_url)
            .param("stock", product.stock)
            .param("tags", &product.tags)
            .run()
            .await?;

        self.graph
            .query(
                "MATCH (p:Product {id: $id})
                 MERGE (c:Category {name: $category})
                 CREATE (p)-[:BELONGS_TO]->(c)",
            )
            .param("id", &product.id)
            .param("category", &product.category)
            .run()
            .await?;

        self.graph
            .query(
                "MATCH (p:Product {id: $id})
                 MERGE (pr:Price {value: $price})
                 CREATE (p)-[:HAS_PRICE]->(pr)",
            )
            .param("id", &product.id)
            .param("price", product.price)
            .run()
            .await
    }
}

/// Decodes the Product vertex in `column`.
pub(super) fn product_from_row(row: &Row, column: &str) -> Result<Product, AppError> {
    let node: Node = row.get(column)?;
    node.into_model()
}

#[async_trait]
impl CatalogRepository for CypherCatalogRepository {
    async fn list_all(&self, category: Option<&str>) -> Result<Vec<Product>, AppError> {
        match category {
            Some(category) => {
                self.fetch_products(
                    "MATCH (p:Product) WHERE p.category = $category RETURN p ORDER BY p.name",
                    &[("category", category)],
                    "catalog.list_all",
                )
                .await
            }
            None => {
                self.fetch_products(
                    "MATCH (p:Product) RETURN p ORDER BY p.name",
                    &[],
                    "catalog.list_all",
                )
                .await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Product, AppError> {
        self.find(id)
            .await
            .in_operation("catalog.get_by_id")?
            .ok_or_else(|| AppError::ProductNotFound(id.to_string()))
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, AppError> {
        self.fetch_products(
            "MATCH (p:Product)-[:BELONGS_TO]->(c:Category {name: $category})
             RETURN p ORDER BY p.name",
            &[("category", category)],
            "catalog.get_by_category",
        )
        .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Product>, AppError> {
        let term = term.to_lowercase();
        tracing::debug!(%term, "searching catalog");

        self.fetch_products(
            "MATCH (p:Product)
             WHERE toLower(p.name) CONTAINS $term
                OR toLower(p.description) CONTAINS $term
                OR toLower(p.category) CONTAINS $term
             RETURN p ORDER BY p.name",
            &[("term", term.as_str())],
            "catalog.search",
        )
        .await
    }

    async fn recommend(&self, id: &str, limit: usize) -> Result<Vec<Product>, AppError> {
        if self.find(id).await.in_operation("catalog.recommend")?.is_none() {
            return Err(AppError::ProductNotFound(id.to_string()));
        }

        // AGE does not accept a parameter in LIMIT
        let cypher = format!(
            "MATCH (p:Product {{id: $id}})-[:BELONGS_TO]->(c:Category)<-[:BELONGS_TO]-(other:Product)
             WHERE other.id <> p.id
             WITH other, count(DISTINCT c) AS shared
             OPTIONAL MATCH (u:User)-[r]->(other)
             WHERE type(r) = 'PURCHASED' OR type(r) = 'LIKES'
             WITH other, shared, count(DISTINCT u) AS buyers
             RETURN other AS p, shared, buyers
             ORDER BY shared DESC, buyers DESC, p.id ASC
             LIMIT {}",
            limit
        );

        self.fetch_products(&cypher, &[("id", id)], "catalog.recommend")
            .await
    }

    async fn similar(&self, id: &str) -> Result<Vec<Product>, AppError> {
        if self.find(id).await.in_operation("catalog.similar")?.is_none() {
            return Err(AppError::ProductNotFound(id.to_string()));
        }

        self.fetch_products(
            "MATCH (:Product {id: $id})-[:SIMILAR_TO]-(p:Product)
             RETURN DISTINCT p ORDER BY p.name",
            &[("id", id)],
            "catalog.similar",
        )
        .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows = self
            .graph
            .query(
                "MATCH (c:Category)
                 OPTIONAL MATCH (p:Product)-[:BELONGS_TO]->(c)
                 WITH c, count(p) AS products
                 RETURN c, products
                 ORDER BY c.name",
            )
            .fetch_all()
            .await
            .in_operation("catalog.list_categories")?;

        rows.iter()
            .map(|row| -> Result<Category, AppError> {
                let node: Node = row.get("c")?;
                Ok(Category {
                    name: node.get("name")?,
                    description: node.get_opt("description")?,
                    product_count: row.get("products")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .in_operation("catalog.list_categories")
    }

    async fn seed(&self, products: &[ProductSeed]) -> Result<usize, AppError> {
        validate_seeds(products)?;
        tracing::info!(products = products.len(), "seeding catalog");

        self.graph
            .query("MATCH (n) DETACH DELETE n")
            .run()
            .await
            .in_operation("catalog.seed")?;

        for seed in products {
            self.seed_product(seed).await.in_operation("catalog.seed")?;
        }

        self.graph
            .query(
                "MATCH (p1:Product), (p2:Product)
                 WHERE p1.id < p2.id AND p1.category = p2.category
                 CREATE (p1)-[:SIMILAR_TO]->(p2)",
            )
            .run()
            .await
            .in_operation("catalog.seed")?;

        let count: i64 = self
            .graph
            .query("MATCH (p:Product) RETURN count(p) AS count")
            .fetch_one()
            .await
            .and_then(|row| match row {
                Some(row) => row.get("count"),
                None => Ok(0),
            })
            .in_operation("catalog.seed")?;

        tracing::info!(count, "catalog seeded");
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
