//! User repository: credentials and federated identity linkage.
//!
//! Uniqueness of `username` and `federated_subject` is enforced by the
//! database, never by a prior existence check, so concurrent registrations
//! of the same name resolve to exactly one winner and a `Conflict`.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use laundry_core::{AuthProvider, Email, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: Option<String>,
    email: Option<String>,
    federated_subject: Option<String>,
    active: bool,
    auth_provider: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

        let auth_provider: AuthProvider = row
            .auth_provider
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            federated_subject: row.federated_subject,
            active: row.active,
            auth_provider,
            created_at: row.created_at,
        })
    }
}

/// User row joined with its password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a local (username + password) user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_local(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, password_hash, active, auth_provider)
            VALUES ($1, $2, TRUE, 'local')
            RETURNING id, username, email, federated_subject, active, auth_provider, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username already exists"))?;

        row.try_into()
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, federated_subject, active, auth_provider, created_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, federated_subject, active, auth_provider, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash.
    ///
    /// Federated-only accounts carry an empty hash, which never verifies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, username, email, federated_subject, active, auth_provider, created_at,
                   password_hash
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = row.user.try_into()?;
        Ok(Some((user, row.password_hash)))
    }

    /// Find an account by federated subject, falling back to email.
    ///
    /// A subject match always wins over an email match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_subject_or_email(
        &self,
        subject: &str,
        email: Option<&Email>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, federated_subject, active, auth_provider, created_at
            FROM users
            WHERE federated_subject = $1
               OR ($2::text IS NOT NULL AND LOWER(email) = LOWER($2))
            ORDER BY (federated_subject IS NOT DISTINCT FROM $1) DESC, id ASC
            LIMIT 1
            ",
        )
        .bind(subject)
        .bind(email.map(Email::as_str))
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find or create the account for a federated identity, atomically.
    ///
    /// Matching is by subject first, then email. An email-matched account
    /// without a subject gets linked to this subject. New accounts use the
    /// email as username, or `federated_<subject>` when no email was
    /// asserted. A concurrent first login for the same subject loses the
    /// insert race and resolves to the winner's row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the fabricated username is taken
    /// by an unrelated account.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn resolve_federated(
        &self,
        subject: &str,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError> {
        match self.try_resolve_federated(subject, email).await {
            Err(RepositoryError::Conflict(message)) => {
                // Someone else may have created this identity concurrently
                self.find_by_subject_or_email(subject, email)
                    .await?
                    .ok_or(RepositoryError::Conflict(message))
            }
            other => other,
        }
    }

    async fn try_resolve_federated(
        &self,
        subject: &str,
        email: Option<&Email>,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, federated_subject, active, auth_provider, created_at
            FROM users
            WHERE federated_subject = $1
               OR ($2::text IS NOT NULL AND LOWER(email) = LOWER($2))
            ORDER BY (federated_subject IS NOT DISTINCT FROM $1) DESC, id ASC
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(subject)
        .bind(email.map(Email::as_str))
        .fetch_optional(&mut *tx)
        .await?;

        let row = match existing {
            Some(row) if row.federated_subject.is_none() => {
                link_subject(&mut tx, row.id, subject).await?
            }
            Some(row) => row,
            None => {
                let username = email.map_or_else(
                    || format!("federated_{subject}"),
                    |e| e.as_str().to_owned(),
                );

                sqlx::query_as::<_, UserRow>(
                    r"
                    INSERT INTO users (username, email, federated_subject, password_hash,
                                       active, auth_provider)
                    VALUES ($1, $2, $3, '', TRUE, 'federated')
                    RETURNING id, username, email, federated_subject, active, auth_provider,
                              created_at
                    ",
                )
                .bind(&username)
                .bind(email.map(Email::as_str))
                .bind(subject)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| conflict_on_unique(e, "federated account already exists"))?
            }
        };

        tx.commit().await?;

        row.try_into()
    }

    /// Activate or deactivate a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_active(&self, username: &str, active: bool) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET active = $2
            WHERE username = $1
            RETURNING id, username, email, federated_subject, active, auth_provider, created_at
            ",
        )
        .bind(username)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}

/// Attach a federated subject to an existing account inside `tx`.
async fn link_subject(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    subject: &str,
) -> Result<UserRow, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        UPDATE users
        SET federated_subject = $2
        WHERE id = $1
        RETURNING id, username, email, federated_subject, active, auth_provider, created_at
        ",
    )
    .bind(user_id)
    .bind(subject)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| conflict_on_unique(e, "federated subject already linked"))?;

    Ok(row)
}
