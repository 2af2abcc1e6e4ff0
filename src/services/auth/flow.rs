use std::sync::Arc;

use tracing::error;

use crate::error::AppError;
use crate::repos::user_repo::{NewUser, Role, UserRecord, UserStore};
use crate::services::auth::{password::PasswordVerifier, token::TokenService};

/// Service-level registration input. Handlers map the HTTP DTO into this.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Service-level login result. Handlers map this into the HTTP DTO.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Orchestrates registration and login.
///
/// - PasswordVerifier owns hashing/verification.
/// - TokenService owns issuance; the flow persists the issued token on the
///   user row as a last-token audit field.
#[derive(Clone)]
pub struct AuthFlow {
    users: Arc<dyn UserStore>,
    passwords: PasswordVerifier,
    tokens: Arc<TokenService>,
}

impl AuthFlow {
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: PasswordVerifier,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    /// Register an account with the given role.
    ///
    /// Duplicate email surfaces as Conflict via the store.
    pub async fn register(&self, req: Registration, role: Role) -> Result<UserRecord, AppError> {
        if req.password != req.confirm_password {
            return Err(AppError::InvalidRequest(
                "passwords do not match".to_string(),
            ));
        }

        let password_hash = self.passwords.hash(&req.password).await.map_err(|e| {
            error!(error = %e, "password hashing failed during registration");
            AppError::Internal
        })?;

        let user = self
            .users
            .create(NewUser {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                password_hash,
                role,
            })
            .await?;

        Ok(user)
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !self.passwords.matches(password, &user.password_hash).await {
            return Err(AppError::Unauthorized);
        }

        let token = self.tokens.issue(&user).map_err(|e| {
            error!(user_id = user.id, error = %e, "token issuance failed");
            AppError::Internal
        })?;

        self.users
            .store_access_token(user.id, &token)
            .await
            .map_err(|e| {
                error!(user_id = user.id, error = %e, "failed to persist issued token");
                AppError::Internal
            })?;

        Ok(IssuedToken {
            access_token: token,
            token_type: "Bearer",
            expires_in: self.tokens.ttl_seconds().max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::user_repo::testing::MemoryUserStore;
    use crate::services::auth::token::SigningKey;

    fn flow_with(users: Arc<MemoryUserStore>) -> AuthFlow {
        let tokens = Arc::new(TokenService::new(
            &SigningKey::from_bytes(b"test-signing-key-0123456789abcd"),
            3600,
        ));
        AuthFlow::new(users, PasswordVerifier::new(4), tokens)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Waters".to_string(),
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn register_rejects_mismatched_confirmation() {
        let flow = flow_with(Arc::new(MemoryUserStore::default()));
        let req = Registration {
            confirm_password: "something else".to_string(),
            ..registration("alice@example.com")
        };
        assert!(matches!(
            flow.register(req, Role::User).await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let users = Arc::new(MemoryUserStore::default());
        let flow = flow_with(users.clone());

        let user = flow
            .register(registration("alice@example.com"), Role::User)
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        let stored = users.get(user.id).unwrap();
        assert_ne!(stored.password_hash, "correct horse");
        assert!(
            flow.passwords
                .matches("correct horse", &stored.password_hash)
                .await
        );
    }

    #[tokio::test]
    async fn admin_registration_grants_the_admin_role() {
        let flow = flow_with(Arc::new(MemoryUserStore::default()));
        let user = flow
            .register(registration("root@example.com"), Role::Admin)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.authorities(), vec!["ROLE_ADMIN".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let flow = flow_with(Arc::new(MemoryUserStore::default()));
        flow.register(registration("alice@example.com"), Role::User)
            .await
            .unwrap();
        assert!(matches!(
            flow.register(registration("alice@example.com"), Role::User)
                .await,
            Err(AppError::Conflict)
        ));
    }

    #[tokio::test]
    async fn login_rejects_unknown_email_and_wrong_password_alike() {
        let flow = flow_with(Arc::new(MemoryUserStore::default()));
        flow.register(registration("alice@example.com"), Role::User)
            .await
            .unwrap();

        assert!(matches!(
            flow.login("nobody@example.com", "correct horse").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            flow.login("alice@example.com", "wrong horse").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn login_issues_a_valid_token_and_persists_it() {
        let users = Arc::new(MemoryUserStore::default());
        let flow = flow_with(users.clone());
        let user = flow
            .register(registration("alice@example.com"), Role::User)
            .await
            .unwrap();

        let out = flow.login("alice@example.com", "correct horse").await.unwrap();
        assert_eq!(out.token_type, "Bearer");
        assert_eq!(out.expires_in, 3600);
        assert!(flow.tokens.is_valid(&out.access_token, &user));

        // Last issued token is recorded on the row.
        let stored = users.get(user.id).unwrap();
        assert_eq!(stored.access_token.as_deref(), Some(out.access_token.as_str()));
    }
}
