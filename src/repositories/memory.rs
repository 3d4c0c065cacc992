//! In-memory implementation of every repository contract.
//!
//! Entities live in maps keyed by their unique property and relationships in
//! typed adjacency maps, all behind one `tokio::sync::RwLock` so each call
//! sees a consistent graph. Used by the `memory` store backend and by tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{
    Category, Product, ProductList, ProductSeed, PurchaseDetails, PurchaseReceipt,
    PurchaseRecord, Quantity, User,
};

use super::{
    validate_seeds, CatalogRepository, RelationRepository, SchemaRepository, UserRepository,
};

/// One PURCHASED edge.
#[derive(Debug, Clone)]
struct Purchase {
    product_id: String,
    details: PurchaseDetails,
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
}

#[derive(Debug, Default)]
struct Arena {
    // Vertices
    products: BTreeMap<String, Product>,
    /// Category name -> description
    categories: BTreeMap<String, Option<String>>,
    prices: BTreeSet<Decimal>,
    users: HashMap<String, User>,
    /// email -> user id
    emails: HashMap<String, String>,

    // Edges
    belongs_to: HashMap<String, BTreeSet<String>>,
    has_price: HashMap<String, Decimal>,
    /// (lower id, higher id)
    similar_to: BTreeSet<(String, String)>,
    lists: HashMap<(ProductList, String), BTreeSet<String>>,
    purchases: HashMap<String, Vec<Purchase>>,
    next_seq: u64,
}

impl Arena {
    fn product(&self, id: &str) -> Result<&Product, AppError> {
        self.products
            .get(id)
            .ok_or_else(|| AppError::ProductNotFound(id.to_string()))
    }

    fn collect<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<Product> {
        let mut products: Vec<Product> = ids
            .into_iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect();
        sort_by_name(&mut products);
        products
    }

    fn categories_of(&self, product_id: &str) -> BTreeSet<String> {
        self.belongs_to.get(product_id).cloned().unwrap_or_default()
    }

    /// Distinct users with a PURCHASED or LIKES edge to `product_id`.
    fn interested_users(&self, product_id: &str) -> usize {
        let buyers = self
            .purchases
            .iter()
            .filter(|(_, edges)| edges.iter().any(|p| p.product_id == product_id))
            .map(|(user, _)| user.as_str());
        let likers = self
            .lists
            .iter()
            .filter(|((list, _), ids)| *list == ProductList::Wishlist && ids.contains(product_id))
            .map(|((_, user), _)| user.as_str());

        buyers.chain(likers).collect::<HashSet<_>>().len()
    }
}

fn sort_by_name(products: &mut [Product]) {
    products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

/// Process-local graph store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: RwLock<Arena>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes a product's price in place; recorded purchases keep theirs.
    #[cfg(test)]
    pub(crate) async fn set_price(&self, product_id: &str, price: Decimal) -> Result<(), AppError> {
        let mut arena = self.arena.write().await;
        let product = arena
            .products
            .get_mut(product_id)
            .ok_or_else(|| AppError::ProductNotFound(product_id.to_string()))?;
        product.price = price;
        arena.prices.insert(price);
        arena.has_price.insert(product_id.to_string(), price);
        Ok(())
    }

    #[cfg(test)]
    async fn similar_pairs(&self) -> BTreeSet<(String, String)> {
        self.arena.read().await.similar_to.clone()
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_all(&self, category: Option<&str>) -> Result<Vec<Product>, AppError> {
        let arena = self.arena.read().await;
        let mut products: Vec<Product> = arena
            .products
            .values()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect();
        sort_by_name(&mut products);
        Ok(products)
    }

    async fn get_by_id(&self, id: &str) -> Result<Product, AppError> {
        self.arena.read().await.product(id).cloned()
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, AppError> {
        let arena = self.arena.read().await;
        let ids = arena
            .belongs_to
            .iter()
            .filter(|(_, categories)| categories.contains(category))
            .map(|(id, _)| id);
        Ok(arena.collect(ids))
    }

    async fn search(&self, term: &str) -> Result<Vec<Product>, AppError> {
        let term = term.to_lowercase();
        let arena = self.arena.read().await;
        let mut products: Vec<Product> = arena
            .products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&term)
                    || p.description.to_lowercase().contains(&term)
                    || p.category.to_lowercase().contains(&term)
            })
            .cloned()
            .collect();
        sort_by_name(&mut products);
        Ok(products)
    }

    async fn recommend(&self, id: &str, limit: usize) -> Result<Vec<Product>, AppError> {
        let arena = self.arena.read().await;
        arena.product(id)?;
        let source = arena.categories_of(id);

        let mut ranked: Vec<(usize, usize, &Product)> = arena
            .products
            .values()
            .filter(|p| p.id != id)
            .filter_map(|p| {
                let shared = arena.categories_of(&p.id).intersection(&source).count();
                (shared > 0).then(|| (shared, arena.interested_users(&p.id), p))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, p)| p.clone())
            .collect())
    }

    async fn similar(&self, id: &str) -> Result<Vec<Product>, AppError> {
        let arena = self.arena.read().await;
        arena.product(id)?;
        let ids = arena.similar_to.iter().filter_map(|(a, b)| {
            if a == id {
                Some(b)
            } else if b == id {
                Some(a)
            } else {
                None
            }
        });
        Ok(arena.collect(ids))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let arena = self.arena.read().await;
        Ok(arena
            .categories
            .iter()
            .map(|(name, description)| Category {
                name: name.clone(),
                description: description.clone(),
                product_count: arena
                    .belongs_to
                    .values()
                    .filter(|categories| categories.contains(name))
                    .count() as i64,
            })
            .collect())
    }

    async fn seed(&self, products: &[ProductSeed]) -> Result<usize, AppError> {
        validate_seeds(products)?;

        let mut arena = self.arena.write().await;
        *arena = Arena::default();

        for seed in products {
            let product = seed.to_product();
            arena
                .categories
                .entry(product.category.clone())
                .or_insert(None);
            arena
                .belongs_to
                .entry(product.id.clone())
                .or_default()
                .insert(product.category.clone());
            arena.prices.insert(product.price);
            arena.has_price.insert(product.id.clone(), product.price);
            arena.products.insert(product.id.clone(), product);
        }

        // BTreeMap iteration is id-ordered, so every pair comes out (lower, higher)
        let ids: Vec<(String, String)> = arena
            .products
            .values()
            .map(|p| (p.id.clone(), p.category.clone()))
            .collect();
        for (i, (a, category_a)) in ids.iter().enumerate() {
            for (b, category_b) in &ids[i + 1..] {
                if category_a == category_b {
                    arena.similar_to.insert((a.clone(), b.clone()));
                }
            }
        }

        tracing::info!(count = arena.products.len(), "catalog seeded");
        Ok(arena.products.len())
    }
}

#[async_trait]
impl RelationRepository for MemoryStore {
    async fn add_to_list(
        &self,
        list: ProductList,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), AppError> {
        let mut arena = self.arena.write().await;
        arena.product(product_id)?;
        arena
            .lists
            .entry((list, user_id.to_string()))
            .or_default()
            .insert(product_id.to_string());
        Ok(())
    }

    async fn remove_from_list(
        &self,
        list: ProductList,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), AppError> {
        let mut arena = self.arena.write().await;
        if let Some(ids) = arena.lists.get_mut(&(list, user_id.to_string())) {
            ids.remove(product_id);
        }
        Ok(())
    }

    async fn clear_list(&self, list: ProductList, user_id: &str) -> Result<(), AppError> {
        self.arena
            .write()
            .await
            .lists
            .remove(&(list, user_id.to_string()));
        Ok(())
    }

    async fn list_products(
        &self,
        list: ProductList,
        user_id: &str,
    ) -> Result<Vec<Product>, AppError> {
        let arena = self.arena.read().await;
        Ok(match arena.lists.get(&(list, user_id.to_string())) {
            Some(ids) => arena.collect(ids),
            None => Vec::new(),
        })
    }

    async fn record_purchase(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: Quantity,
    ) -> Result<PurchaseReceipt, AppError> {
        let mut arena = self.arena.write().await;
        let product = arena.product(product_id)?.clone();

        let total_amount = quantity.total(product.price)?;
        let purchase_date = Utc::now();
        let seq = arena.next_seq;
        arena.next_seq += 1;

        arena
            .purchases
            .entry(user_id.to_string())
            .or_default()
            .push(Purchase {
                product_id: product_id.to_string(),
                details: PurchaseDetails {
                    quantity: quantity.get(),
                    total_amount,
                    purchase_date,
                },
                seq,
            });

        Ok(PurchaseReceipt {
            product,
            quantity,
            total_amount,
            purchase_date,
        })
    }

    async fn purchase_history(&self, user_id: &str) -> Result<Vec<PurchaseRecord>, AppError> {
        let arena = self.arena.read().await;
        let mut edges: Vec<&Purchase> = arena
            .purchases
            .get(user_id)
            .map(|edges| edges.iter().collect())
            .unwrap_or_default();

        edges.sort_by(|a, b| {
            b.details
                .purchase_date
                .cmp(&a.details.purchase_date)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                arena.products.get(&edge.product_id).map(|product| PurchaseRecord {
                    product: product.clone(),
                    purchase_details: edge.details.clone(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<(), AppError> {
        let mut arena = self.arena.write().await;
        if arena.emails.contains_key(&user.email) {
            return Err(AppError::EmailTaken(user.email.clone()));
        }
        if arena.users.contains_key(&user.id) {
            return Err(AppError::Constraint(format!("user id {} exists", user.id)));
        }
        arena.emails.insert(user.email.clone(), user.id.clone());
        arena.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let arena = self.arena.read().await;
        Ok(arena
            .emails
            .get(email)
            .and_then(|id| arena.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.arena.read().await.users.get(id).cloned())
    }
}

#[async_trait]
impl SchemaRepository for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), AppError> {
        // uniqueness is structural: every vertex map is keyed by its unique property
        Ok(())
    }
}
