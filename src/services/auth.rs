//! Registration and login.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use serde::Serialize;

use crate::context::{AppUsers, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{normalize_email, PublicUser, User};
use crate::services::TokenService;

const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// Password authentication over the user repository.
#[derive(FromContext, Clone)]
pub struct AuthService {
    users: AppUsers,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: AppUsers, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    /// Creates an account and signs the new user in.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name, implausible email or short password;
    /// `EmailTaken` when the email is registered already.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if !is_plausible_email(&email) {
            return Err(AppError::Validation("Please include a valid email".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken(email));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            password_hash: hash_password(password.to_string()).await?,
        };
        self.users.create(&user).await?;

        self.session_for(&user)
    }

    /// Signs in with email and password.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        self.session_for(&user)
    }

    /// The account a verified token belongs to.
    ///
    /// Fails with `UserNotFound` once the account is gone, e.g. after a
    /// catalog reseed wiped the graph.
    pub async fn current_user(&self, user_id: &str) -> Result<PublicUser, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| PublicUser::from(&user))
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Resolves a bearer token to its user id.
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        self.tokens.verify(token)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, AppError> {
        Ok(AuthSession {
            token: self.tokens.issue(&user.id)?,
            user: PublicUser::from(user),
        })
    }
}

/// One `@`, a non-empty local part, and a dotted domain without spaces.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

// Argon2 runs on the blocking pool.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| AppError::Internal(format!("stored password hash is malformed: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::repositories::{MemoryStore, UserRepository};

    fn service() -> (Arc<MemoryStore>, AuthService) {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::with_ttl("test-secret", Duration::hours(1));
        (store.clone(), AuthService::new(store, tokens))
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let (_, auth) = service();

        let registered = auth
            .register("Asha", "Asha@Example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(registered.user.email, "asha@example.com");
        assert_eq!(auth.verify(&registered.token).unwrap(), registered.user.id);

        let session = auth
            .authenticate("asha@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.user, registered.user);
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let (store, auth) = service();
        auth.register("Asha", "asha@example.com", "hunter22")
            .await
            .unwrap();

        let stored = store.find_by_email("asha@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "hunter22");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_taken_email_keeps_original() {
        let (store, auth) = service();
        auth.register("Asha", "asha@example.com", "hunter22")
            .await
            .unwrap();
        let before = store.find_by_email("asha@example.com").await.unwrap().unwrap();

        let result = auth.register("Imposter", "ASHA@example.com", "different").await;
        assert!(matches!(result, Err(AppError::EmailTaken(_))));

        let after = store.find_by_email("asha@example.com").await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let (_, auth) = service();
        auth.register("Asha", "asha@example.com", "hunter22")
            .await
            .unwrap();

        assert!(matches!(
            auth.authenticate("asha@example.com", "wrong-pass").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("nobody@example.com", "hunter22").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (_, auth) = service();

        for (name, email, password) in [
            ("  ", "asha@example.com", "hunter22"),
            ("Asha", "not-an-email", "hunter22"),
            ("Asha", "asha@localhost", "hunter22"),
            ("Asha", "asha@example.com", "short"),
        ] {
            assert!(
                matches!(
                    auth.register(name, email, password).await,
                    Err(AppError::Validation(_))
                ),
                "expected validation error for {name:?} {email:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_current_user() {
        let (_, auth) = service();
        let session = auth
            .register("Asha", "asha@example.com", "hunter22")
            .await
            .unwrap();

        let user = auth.current_user(&session.user.id).await.unwrap();
        assert_eq!(user, session.user);

        assert!(matches!(
            auth.current_user("no-such-user").await,
            Err(AppError::UserNotFound(id)) if id == "no-such-user"
        ));
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("a@@b.co"));
        assert!(!is_plausible_email("a b@c.de"));
        assert!(!is_plausible_email("a@b..c"));
        assert!(!is_plausible_email("@b.co"));
    }
}
