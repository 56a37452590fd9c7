//! PostgreSQL implementation of the item store.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::connect::{DatabaseTarget, Establishment, RetryPolicy, establish};
use crate::domain::{Item, ItemId, ItemPatch, NewItem, now};
use crate::error::GatewayError;

type ItemRow = (i64, String, String, DateTime<Utc>, DateTime<Utc>);

const ITEM_COLUMNS: &str = "id, name, description, created_at, updated_at";

fn item_from_row((id, name, description, created_at, updated_at): ItemRow) -> Item {
    Item {
        id: ItemId::new(id),
        name,
        description,
        created_at,
        updated_at,
    }
}

fn db_error(e: sqlx::Error) -> GatewayError {
    GatewayError::BackendTransient(e.to_string())
}

/// PostgreSQL-backed item store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `target` and verifies it with `SELECT 1`,
    /// retrying according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfiguration`] if the target cannot
    /// be turned into connect options. Unreachability is not an error; it
    /// is reported through [`Establishment::Unreachable`].
    pub async fn connect(
        target: &DatabaseTarget,
        policy: &RetryPolicy,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Establishment<Self, sqlx::Error>, GatewayError> {
        let options = target.connect_options()?;
        let acquire_timeout = policy.probe_timeout;

        let outcome = establish(policy, "store", target, || {
            let options = options.clone();
            async move {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(min_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await?;
                sqlx::query("SELECT 1").execute(&pool).await?;
                Ok::<_, sqlx::Error>(pool)
            }
        })
        .await;

        Ok(outcome.map(Self::new))
    }

    /// Creates the `items` table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::BackendTransient`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), GatewayError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS items (\
                id BIGSERIAL PRIMARY KEY, \
                name TEXT NOT NULL, \
                description TEXT NOT NULL DEFAULT '', \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()\
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    /// Inserts a new item and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::BackendTransient`] on database failure.
    pub async fn insert(&self, new: NewItem) -> Result<Item, GatewayError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "INSERT INTO items (name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) RETURNING {ITEM_COLUMNS}"
        ))
        .bind(new.name)
        .bind(new.description)
        .bind(now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(item_from_row(row))
    }

    /// Loads one item.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no row has this id, or a
    /// [`GatewayError::BackendTransient`] on database failure.
    pub async fn get(&self, id: ItemId) -> Result<Item, GatewayError> {
        sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(item_from_row)
        .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    /// Loads every item ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::BackendTransient`] on database failure.
    pub async fn list(&self) -> Result<Vec<Item>, GatewayError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(item_from_row).collect())
    }

    /// Applies a patch to an existing row and refreshes `updated_at`.
    ///
    /// The existence check and the write are one statement, so a missing
    /// row is reported without touching anything.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no row has this id, or a
    /// [`GatewayError::BackendTransient`] on database failure.
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, GatewayError> {
        sqlx::query_as::<_, ItemRow>(&format!(
            "UPDATE items SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                updated_at = $4 \
             WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id.get())
        .bind(patch.name)
        .bind(patch.description)
        .bind(now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(item_from_row)
        .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    /// Deletes a row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no row has this id, or a
    /// [`GatewayError::BackendTransient`] on database failure.
    pub async fn delete(&self, id: ItemId) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
