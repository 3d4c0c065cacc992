//! Cypher user repository.

use async_trait::async_trait;

use crate::context::AppGraph;
use crate::error::{AppError, OperationExt};
use crate::graph::{Node, QueryExt};
use crate::models::User;

use super::UserRepository;

#[derive(Clone)]
pub struct CypherUserRepository {
    graph: AppGraph,
}

impl CypherUserRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    async fn find_one(
        &self,
        cypher: &str,
        key: &str,
        value: &str,
        operation: &'static str,
    ) -> Result<Option<User>, AppError> {
        self.graph
            .query(cypher)
            .param(key, value)
            .fetch_one()
            .await
            .and_then(|row| {
                row.map(|row| row.get::<Node>("u").and_then(Node::into_model))
                    .transpose()
            })
            .in_operation(operation)
    }
}

#[async_trait]
impl UserRepository for CypherUserRepository {
    async fn create(&self, user: &User) -> Result<(), AppError> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(AppError::EmailTaken(user.email.clone()));
        }

        let result = self
            .graph
            .query(
                "CREATE (:User {id: $id, name: $name, email: $email, password: $password})",
            )
            .param("id", &user.id)
            .param("name", &user.name)
            .param("email", &user.email)
            .param("password", &user.password_hash)
            .run()
            .await;

        match result {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "user registered");
                Ok(())
            }
            // lost a race with a concurrent registration
            Err(AppError::Constraint(_)) => Err(AppError::EmailTaken(user.email.clone())),
            Err(e) => Err(e.in_operation("users.create")),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one(
            "MATCH (u:User {email: $email}) RETURN u",
            "email",
            email,
            "users.find_by_email",
        )
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        // User vertices merged by cart or purchase writes carry only an id
        self.find_one(
            "MATCH (u:User {id: $id}) WHERE u.email IS NOT NULL RETURN u",
            "id",
            id,
            "users.find_by_id",
        )
        .await
    }
}
