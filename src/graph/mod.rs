//! Graph abstraction layer for backend-agnostic database access.
//!
//! Repositories are written against [`CypherExecutor`] and never see the
//! backend. The traits form a small hierarchy:
//!
//! - [`CypherExecutor`] - Execute Cypher queries (every backend)
//! - [`SqlExecutor`] - Execute SQL (backends on a relational engine)
//! - [`Transaction`] - Transaction lifecycle (commit/rollback)
//! - [`GraphClient`] - Connection management and transaction creation
//!
//! # Usage
//!
//! ```ignore
//! use graphmart::graph::QueryExt;
//!
//! let rows = executor
//!     .query("MATCH (p:Product) WHERE p.category = $category RETURN p")
//!     .param("category", "Women")
//!     .fetch_all()
//!     .await?;
//!
//! executor
//!     .query("MERGE (u:User {id: $id})")
//!     .param("id", user_id)
//!     .run()
//!     .await?;
//! ```

mod cypher;
mod macros;
mod node;
mod query;
mod row;
mod traits;

pub mod backends;

#[cfg(test)]
pub(crate) mod mock;

pub use cypher::{extract_return_columns, ParseError};
pub use node::{Edge, Node};
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{CypherExecutor, GraphClient, SqlExecutor, Transaction};

#[doc(inline)]
pub use crate::cypher;
