//! `Storage`-backed implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{AuthConfig, SecurityConfig};
use crate::constants::limits::MAX_USERNAME_LEN;
use crate::db::{Storage, StoreError};
use crate::domain::{AuthToken, UserId};
use crate::services::auth_service::{AuthContext, AuthError, AuthService, RegisterOutcome};
use crate::services::clock::Clock;
use crate::services::password;

pub struct StoreAuthService {
    store: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    token_ttl: chrono::Duration,
    security: SecurityConfig,
    /// Hash checked against when the username is unknown, so both failure
    /// paths cost one Argon2 verification.
    dummy_hash: OnceCell<String>,
}

impl StoreAuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        auth: &AuthConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            clock,
            token_ttl: auth.token_ttl(),
            security,
            dummy_hash: OnceCell::new(),
        }
    }

    fn expiry_from_now(&self) -> DateTime<Utc> {
        self.clock
            .now()
            .checked_add_signed(self.token_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    async fn issue_token(&self, user_id: UserId) -> Result<AuthToken, AuthError> {
        let token = AuthToken::generate();
        let expires_at = self.expiry_from_now();

        self.store.create_token(user_id, &token, expires_at).await?;

        Ok(token)
    }

    async fn burn_verification(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| {
                password::hash_password_blocking("pam-dummy-password", &self.security)
            })
            .await;

        if let Ok(hash) = dummy {
            let _ = password::verify_password_blocking(hash, password).await;
        }
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::Validation("Username is required".to_string()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} bytes"
        )));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    Ok(())
}

#[async_trait]
impl AuthService for StoreAuthService {
    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterOutcome, AuthError> {
        validate_credentials(username, password)?;

        let password_hash = password::hash_password_blocking(password, &self.security).await?;

        let user_id = match self.store.create_user(username, &password_hash).await {
            Ok(id) => id,
            Err(StoreError::DuplicateUsername) => {
                info!("Registration rejected, username already exists");
                metrics::counter!("auth_registrations_total", "outcome" => "taken").increment(1);
                return Ok(RegisterOutcome::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(user_id).await?;

        info!(user_id = %user_id, "New user registered");
        metrics::counter!("auth_registrations_total", "outcome" => "success").increment(1);

        Ok(RegisterOutcome::Registered(token))
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthToken, AuthError> {
        let user = match self.store.get_user(username).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                self.burn_verification(password).await;
                metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let is_valid = match password::verify_password_blocking(&user.password_hash, password).await
        {
            Ok(valid) => valid,
            Err(e) => {
                warn!(user_id = %user.id, "Stored password hash is unreadable: {e}");
                false
            }
        };

        if !is_valid {
            metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(user.id).await?;

        info!(user_id = %user.id, "User authenticated");
        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);

        Ok(token)
    }

    async fn resolve(&self, token: &AuthToken) -> Result<AuthContext, AuthError> {
        let user = self.store.resolve_token(token, self.clock.now()).await?;

        Ok(AuthContext {
            user_id: user.id,
            username: user.username,
            token: token.clone(),
        })
    }

    async fn prolong(&self, token: &AuthToken) -> Result<(), AuthError> {
        let expires_at = self.expiry_from_now();
        self.store.prolong_token(token, expires_at).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::clock::ManualClock;

    struct Harness {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        service: StoreAuthService,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let service = StoreAuthService::new(
            store.clone(),
            clock.clone(),
            &AuthConfig {
                token_expiry_seconds: 300,
            },
            SecurityConfig {
                argon2_memory_cost_kib: 256,
                argon2_time_cost: 1,
                argon2_parallelism: 1,
            },
        );
        Harness {
            store,
            clock,
            service,
        }
    }

    fn registered(outcome: RegisterOutcome) -> AuthToken {
        match outcome {
            RegisterOutcome::Registered(token) => token,
            RegisterOutcome::UsernameTaken => panic!("expected a fresh registration"),
        }
    }

    #[tokio::test]
    async fn longest_allowed_expiry_resolves_on_sqlite() {
        let store = Arc::new(crate::db::Store::in_memory().await.unwrap());
        let service = StoreAuthService::new(
            store,
            Arc::new(crate::services::clock::SystemClock),
            &AuthConfig {
                token_expiry_seconds: crate::constants::limits::MAX_TOKEN_EXPIRY_SECONDS,
            },
            SecurityConfig {
                argon2_memory_cost_kib: 256,
                argon2_time_cost: 1,
                argon2_parallelism: 1,
            },
        );

        let token = registered(service.register("alice", "pw1").await.unwrap());
        assert_eq!(service.resolve(&token).await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn register_issues_a_resolvable_token() {
        let h = harness();
        let token = registered(h.service.register("alice", "pw1").await.unwrap());

        let ctx = h.service.resolve(&token).await.unwrap();
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.token, token);
    }

    #[tokio::test]
    async fn register_never_stores_the_plaintext() {
        let h = harness();
        h.service.register("alice", "pw1").await.unwrap();

        let user = h.store.get_user("alice").await.unwrap();
        assert_ne!(user.password_hash, "pw1");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn duplicate_username_is_an_outcome_not_an_error() {
        let h = harness();
        h.service.register("alice", "pw1").await.unwrap();
        let before = h.store.get_user("alice").await.unwrap();

        let outcome = h.service.register("alice", "other").await.unwrap();
        assert_eq!(outcome, RegisterOutcome::UsernameTaken);

        let after = h.store.get_user("alice").await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let h = harness();
        assert!(matches!(
            h.service.register("", "pw").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            h.service.register("bob", "").await,
            Err(AuthError::Validation(_))
        ));
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert!(matches!(
            h.service.register(&long, "pw").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let h = harness();
        h.service.register("real_user", "right").await.unwrap();

        let ghost = h.service.authenticate("ghost", "x").await.unwrap_err();
        let wrong = h.service.authenticate("real_user", "wrong_pwd").await.unwrap_err();

        assert!(matches!(ghost, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(ghost.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn every_login_gets_its_own_token() {
        let h = harness();
        let first = registered(h.service.register("alice", "pw1").await.unwrap());
        let second = h.service.authenticate("alice", "pw1").await.unwrap();

        assert_ne!(first, second);
        assert!(h.service.resolve(&first).await.is_ok());
        assert!(h.service.resolve(&second).await.is_ok());
        assert_eq!(h.store.token_count().await, 2);
    }

    #[tokio::test]
    async fn token_expires_after_configured_lifetime() {
        let h = harness();
        let token = registered(h.service.register("alice", "pw1").await.unwrap());

        h.clock.advance(chrono::Duration::seconds(300));
        assert!(h.service.resolve(&token).await.is_ok());

        h.clock.advance(chrono::Duration::milliseconds(1));
        assert!(matches!(
            h.service.resolve(&token).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn prolong_slides_the_window() {
        let h = harness();
        let token = registered(h.service.register("alice", "pw1").await.unwrap());

        h.clock.advance(chrono::Duration::seconds(200));
        h.service.prolong(&token).await.unwrap();
        assert_eq!(
            h.store.token_expiry(&token).await,
            Some(h.clock.now() + chrono::Duration::seconds(300))
        );

        h.clock.advance(chrono::Duration::seconds(250));
        assert!(h.service.resolve(&token).await.is_ok());
    }

    #[tokio::test]
    async fn prolong_resurrects_an_expired_token() {
        let h = harness();
        let token = registered(h.service.register("alice", "pw1").await.unwrap());

        h.clock.advance(chrono::Duration::seconds(301));
        assert!(h.service.resolve(&token).await.is_err());

        h.service.prolong(&token).await.unwrap();
        assert!(h.service.resolve(&token).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_token_is_unauthenticated() {
        let h = harness();
        let result = h.service.resolve(&AuthToken::new("nope")).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
}
