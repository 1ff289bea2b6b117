use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ProfileRow, UserIdentity};

/// UserRepository
///
/// Persistence contract for the identities the auth layer resolves. Lookup
/// failures are logged by the implementation and surface as `None`, which the
/// auth layer treats as "not authenticated".
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Option<UserIdentity>;

    /// Inserts or replaces the profile for `user.user_id`.
    async fn upsert_user(&self, user: UserIdentity) -> Option<UserIdentity>;
}

/// RepositoryState
///
/// The shared handle the application state carries.
pub type RepositoryState = Arc<dyn UserRepository>;

/// PostgresUserRepository
///
/// `UserRepository` backed by the `profiles` table.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    /// get_user
    ///
    /// A stored role outside the known set is logged and the profile treated as
    /// missing, so nobody is admitted under a role the guards cannot reason about.
    async fn get_user(&self, id: Uuid) -> Option<UserIdentity> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, role FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })?;

        match UserIdentity::try_from(row) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(user_id = %id, "profile has invalid role: {}", e);
                None
            }
        }
    }

    async fn upsert_user(&self, user: UserIdentity) -> Option<UserIdentity> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (id, email, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role
            RETURNING id, email, role
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => UserIdentity::try_from(row).ok(),
            Err(e) => {
                tracing::error!("upsert_user error: {:?}", e);
                None
            }
        }
    }
}

/// InMemoryUserRepository
///
/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserIdentity>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I: IntoIterator<Item = UserIdentity>>(users: I) -> Self {
        let users = users.into_iter().map(|u| (u.user_id, u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user(&self, id: Uuid) -> Option<UserIdentity> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    async fn upsert_user(&self, user: UserIdentity) -> Option<UserIdentity> {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.user_id, user.clone());
        Some(user)
    }
}
