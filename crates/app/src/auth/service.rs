//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::PgPool;
use tracing::debug;

use crate::auth::{
    Actor, AuthServiceError, hash_session_secret, parse_session_token,
    repository::PgAuthRepository,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
        }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Actor, AuthServiceError> {
        let secret = parse_session_token(bearer_token).map_err(|_| AuthServiceError::NotFound)?;

        let session = self
            .repository
            .find_active_session(&hash_session_secret(&secret), Timestamp::now())
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        debug!(
            user_uuid = %session.user_uuid,
            expires_at = ?session.expires_at,
            "session resolved"
        );

        Ok(Actor {
            user: session.user_uuid,
            role: session.role.parse()?,
            name: session.name,
        })
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the user it was issued for.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Actor, AuthServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use storefront::orders::Role;
    use testresult::TestResult;

    use crate::{
        auth::{UserUuid, format_session_token, generate_session_secret},
        test::{TestContext, helpers::create_session},
    };

    use super::*;

    #[tokio::test]
    async fn valid_token_resolves_to_actor() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let token = create_session(&ctx, user, "Ada", Role::Admin, None).await?;
        let actor = ctx.auth.authenticate_bearer(&token).await?;

        assert_eq!(actor.user, user);
        assert_eq!(actor.name, "Ada");
        assert_eq!(actor.role, Role::Admin);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let ctx = TestContext::new().await;
        let token = format_session_token(&generate_session_secret());

        let result = ctx.auth.authenticate_bearer(&token).await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn malformed_token_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.auth.authenticate_bearer("not-a-token").await;

        assert!(matches!(result, Err(AuthServiceError::NotFound)));
    }

    #[tokio::test]
    async fn expired_session_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let expired = Timestamp::now().checked_sub(SignedDuration::from_secs(60))?;

        let token =
            create_session(&ctx, UserUuid::new(), "Old", Role::Customer, Some(expired)).await?;

        let result = ctx.auth.authenticate_bearer(&token).await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
