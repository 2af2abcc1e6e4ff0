/*
 * Responsibility
 * - users table access behind the UserStore trait
 * - The authentication middleware and the auth flow only see this interface;
 *   tests swap in an in-memory store
 * - DB errors are returned as RepoError
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::fmt;
use thiserror::Error;

use crate::repos::error::RepoError;

/// Granted role of an account. Stored as TEXT in the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }

    /// Authorities granted by this role. Derived from the stored role at
    /// request time, never read back from token claims.
    pub fn authorities(&self) -> Vec<String> {
        match self {
            Role::User => vec!["ROLE_USER".to_string()],
            Role::Admin => vec!["ROLE_ADMIN".to_string()],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// A persisted account row.
///
/// `access_token` is an audit field: the last token issued at login. Nothing
/// reads it back for validation (tokens are self-contained).
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub access_token: Option<String>,
}

impl UserRecord {
    /// The comparable identity key. Accounts are keyed by email.
    pub fn username(&self) -> &str {
        &self.email
    }

    pub fn authorities(&self) -> Vec<String> {
        self.role.authorities()
    }
}

/// Insert payload for registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
}

/// User lookup and persistence as the auth core needs it.
///
/// Must be safe to call concurrently from many in-flight requests.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Email match is case-insensitive; token subjects carry whatever case
    /// the client registered or logged in with.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError>;

    /// Record the last issued token on the user row (audit only).
    async fn store_access_token(&self, id: i64, token: &str) -> Result<(), RepoError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, role, access_token
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, first_name, last_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, last_name, password_hash, role, access_token
            "#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn store_access_token(&self, id: i64, token: &str) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE users
            SET access_token = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
