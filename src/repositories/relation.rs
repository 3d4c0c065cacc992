//! Cypher repository for cart, wishlist and purchase edges.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use crate::context::AppGraph;
use crate::cypher;
use crate::error::{AppError, OperationExt};
use crate::graph::{Edge, QueryExt};
use crate::models::{
    Product, ProductList, PurchaseDetails, PurchaseReceipt, PurchaseRecord, Quantity,
};

use super::catalog::product_from_row;
use super::RelationRepository;

/// User-to-product edges over a Cypher executor.
///
/// Edge types come from [`ProductList::edge_type`] and are the only values
/// formatted into query text.
#[derive(Clone)]
pub struct CypherRelationRepository {
    graph: AppGraph,
}

impl CypherRelationRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl RelationRepository for CypherRelationRepository {
    async fn add_to_list(
        &self,
        list: ProductList,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), AppError> {
        let cypher = format!(
            "MATCH (p:Product {{id: $product_id}})
             MERGE (u:User {{id: $user_id}})
             MERGE (u)-[:{}]->(p)
             RETURN p.id AS id",
            list.edge_type()
        );

        let row = self
            .graph
            .query(&cypher)
            .param("user_id", user_id)
            .param("product_id", product_id)
            .fetch_one()
            .await
            .in_operation("relations.add_to_list")?;

        if row.is_none() {
            return Err(AppError::ProductNotFound(product_id.to_string()));
        }
        tracing::debug!(%user_id, %product_id, %list, "added to list");
        Ok(())
    }

    async fn remove_from_list(
        &self,
        list: ProductList,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), AppError> {
        let cypher = format!(
            "MATCH (:User {{id: $user_id}})-[r:{}]->(:Product {{id: $product_id}})
             DELETE r",
            list.edge_type()
        );

        cypher!(self.graph, &cypher, user_id = user_id, product_id = product_id)
            .run()
            .await
            .in_operation("relations.remove_from_list")
    }

    async fn clear_list(&self, list: ProductList, user_id: &str) -> Result<(), AppError> {
        let cypher = format!(
            "MATCH (:User {{id: $user_id}})-[r:{}]->(:Product) DELETE r",
            list.edge_type()
        );

        cypher!(self.graph, &cypher, user_id = user_id)
            .run()
            .await
            .in_operation("relations.clear_list")
    }

    async fn list_products(
        &self,
        list: ProductList,
        user_id: &str,
    ) -> Result<Vec<Product>, AppError> {
        let cypher = format!(
            "MATCH (:User {{id: $user_id}})-[:{}]->(p:Product)
             RETURN p ORDER BY p.name",
            list.edge_type()
        );

        let rows = self
            .graph
            .query(&cypher)
            .param("user_id", user_id)
            .fetch_all()
            .await
            .in_operation("relations.list_products")?;

        rows.iter()
            .map(|row| product_from_row(row, "p"))
            .collect::<Result<Vec<_>, _>>()
            .in_operation("relations.list_products")
    }

    async fn record_purchase(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: Quantity,
    ) -> Result<PurchaseReceipt, AppError> {
        let product = self
            .graph
            .query("MATCH (p:Product {id: $id}) RETURN p")
            .param("id", product_id)
            .fetch_one()
            .await
            .and_then(|row| row.map(|row| product_from_row(&row, "p")).transpose())
            .in_operation("relations.record_purchase")?
            .ok_or_else(|| AppError::ProductNotFound(product_id.to_string()))?;

        let total_amount = quantity.total(product.price)?;
        let purchase_date = Utc::now();

        self.graph
            .query(
                "MATCH (p:Product {id: $product_id})
                 MERGE (u:User {id: $user_id})
                 CREATE (u)-[:PURCHASED {
                     quantity: $quantity,
                     totalAmount: $total_amount,
                     purchaseDate: $purchase_date
                 }]->(p)",
            )
            .param("user_id", user_id)
            .param("product_id", product_id)
            .param("quantity", quantity)
            .param("total_amount", total_amount)
            // fixed-width UTC so string order is time order
            .param(
                "purchase_date",
                purchase_date.to_rfc3339_opts(SecondsFormat::Micros, true),
            )
            .run()
            .await
            .in_operation("relations.record_purchase")?;

        tracing::debug!(
            %user_id,
            %product_id,
            quantity = quantity.get(),
            %total_amount,
            "purchase recorded"
        );

        Ok(PurchaseReceipt {
            product,
            quantity,
            total_amount,
            purchase_date,
        })
    }

    async fn purchase_history(&self, user_id: &str) -> Result<Vec<PurchaseRecord>, AppError> {
        let rows = self
            .graph
            .query(
                "MATCH (:User {id: $user_id})-[r:PURCHASED]->(p:Product)
                 RETURN p, r
                 ORDER BY r.purchaseDate DESC, id(r) DESC",
            )
            .param("user_id", user_id)
            .fetch_all()
            .await
            .in_operation("relations.purchase_history")?;

        rows.iter()
            .map(|row| -> Result<PurchaseRecord, AppError> {
                let edge: Edge = row.get("r")?;
                Ok(PurchaseRecord {
                    product: product_from_row(row, "p")?,
                    purchase_details: edge.into_model::<PurchaseDetails>()?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .in_operation("relations.purchase_history")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::graph::mock::MockExecutor;
    use crate::graph::Row;

    fn product_json(id: &str, price: f64) -> serde_json::Value {
        json!({
            "id": 11,
            "label": "Product",
            "properties": {
                "id": id,
                "name": "Denim Jacket",
                "description": "",
                "price": price,
                "category": "Men",
                "tags": ["Men"]
            }
        })
    }

    fn repo() -> (Arc<MockExecutor>, CypherRelationRepository) {
        let mock = Arc::new(MockExecutor::new());
        (mock.clone(), CypherRelationRepository::new(mock))
    }

    #[tokio::test]
    async fn test_add_to_cart_merges_edge() {
        let (mock, repo) = repo();
        mock.push_rows(vec![Row::from([("id", json!("A"))])]);

        repo.add_to_cart("u1", "A").await.unwrap();

        let call = mock.last_call();
        assert!(call.cypher.contains("MERGE (u)-[:ADDED_TO_CART]->(p)"));
        assert_eq!(call.params.get("user_id"), Some(&json!("u1")));
    }

    #[tokio::test]
    async fn test_add_to_wishlist_unknown_product() {
        let (mock, repo) = repo();
        let result = repo.add_to_wishlist("u1", "missing").await;

        assert!(matches!(result, Err(AppError::ProductNotFound(id)) if id == "missing"));
        assert!(mock.last_call().cypher.contains(":LIKES"));
    }

    #[tokio::test]
    async fn test_clear_wishlist_only_touches_likes() {
        let (mock, repo) = repo();
        repo.clear_wishlist("u1").await.unwrap();

        let call = mock.last_call();
        assert!(call.write);
        assert!(call.cypher.contains("[r:LIKES]"));
    }

    #[tokio::test]
    async fn test_record_purchase_freezes_total() {
        let (mock, repo) = repo();
        mock.push_rows(vec![Row::from([("p", product_json("A", 10.0))])]);

        let receipt = repo
            .record_purchase("u1", "A", Quantity::new(3).unwrap())
            .await
            .unwrap();

        assert_eq!(receipt.total_amount, Decimal::new(30, 0));
        let call = mock.last_call();
        assert!(call.cypher.contains("CREATE (u)-[:PURCHASED"));
        assert_eq!(call.params.get("quantity"), Some(&json!(3)));
        assert_eq!(call.params.get("total_amount"), Some(&json!(30.0)));
    }

    #[tokio::test]
    async fn test_record_purchase_unknown_product_writes_nothing() {
        let (mock, repo) = repo();
        let result = repo
            .record_purchase("u1", "missing", Quantity::new(1).unwrap())
            .await;

        assert!(matches!(result, Err(AppError::ProductNotFound(_))));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_purchase_history_decodes_edge() {
        let (mock, repo) = repo();
        mock.push_rows(vec![Row::from([
            ("p", product_json("A", 10.0)),
            (
                "r",
                json!({
                    "id": 99,
                    "label": "PURCHASED",
                    "start_id": 1,
                    "end_id": 11,
                    "properties": {
                        "quantity": 3,
                        "totalAmount": 30.0,
                        "purchaseDate": "2026-01-02T03:04:05.000006Z"
                    }
                }),
            ),
        ])]);

        let history = repo.purchase_history("u1").await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].product.id, "A");
        assert_eq!(history[0].purchase_details.quantity, 3);
        assert_eq!(history[0].purchase_details.total_amount, Decimal::new(30, 0));
        assert!(mock.last_call().cypher.contains("ORDER BY r.purchaseDate DESC"));
    }
}
