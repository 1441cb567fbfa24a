use crate::models::Drink;
use async_trait::async_trait;
use sqlx::PgPool;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use thiserror::Error;

/// RepositoryError
///
/// Failure signal from the persistence layer. Absence of a row is *not* an error: lookups
/// return `Ok(None)` and the caller decides what a missing drink means.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("title already exists: {0}")]
    DuplicateTitle(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Resource Store for the `drinks` table. `recipe` is opaque text at this layer; shape
/// validation happens in the handlers before anything reaches the store.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Every drink, ascending by id.
    async fn list(&self) -> RepositoryResult<Vec<Drink>>;
    /// Inserts a row and returns it with its generated id.
    async fn create(&self, title: String, recipe: String) -> RepositoryResult<Drink>;
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Drink>>;
    /// Writes the title and recipe of an already persisted drink back to the store.
    async fn update(&self, drink: &Drink) -> RepositoryResult<Drink>;
    /// Hard delete. Any partial transaction is rolled back before an error is returned.
    async fn delete(&self, drink: &Drink) -> RepositoryResult<()>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a pooled connection.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation on `title` to `DuplicateTitle`.
fn classify(err: sqlx::Error, title: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::DuplicateTitle(title.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list(&self) -> RepositoryResult<Vec<Drink>> {
        sqlx::query_as::<_, Drink>("SELECT id, title, recipe FROM drinks ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("list drinks error: {:?}", e);
                RepositoryError::Database(e)
            })
    }

    async fn create(&self, title: String, recipe: String) -> RepositoryResult<Drink> {
        sqlx::query_as::<_, Drink>(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(&title)
        .bind(&recipe)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("create drink error: {:?}", e);
            classify(e, &title)
        })
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Drink>> {
        sqlx::query_as::<_, Drink>("SELECT id, title, recipe FROM drinks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("find drink {} error: {:?}", id, e);
                RepositoryError::Database(e)
            })
    }

    /// Last write wins: no version column, no row lock.
    async fn update(&self, drink: &Drink) -> RepositoryResult<Drink> {
        sqlx::query_as::<_, Drink>(
            "UPDATE drinks SET title = $2, recipe = $3 WHERE id = $1 RETURNING id, title, recipe",
        )
        .bind(drink.id)
        .bind(&drink.title)
        .bind(&drink.recipe)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("update drink {} error: {:?}", drink.id, e);
            classify(e, &drink.title)
        })?
        // The row vanished between lookup and write (concurrent delete).
        .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))
    }

    async fn delete(&self, drink: &Drink) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Err(e) = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(drink.id)
            .execute(&mut *tx)
            .await
        {
            tracing::error!("delete drink {} error: {:?}", drink.id, e);
            // Leave the pooled connection clean for the next request.
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("rollback after failed delete error: {:?}", rollback_err);
            }
            return Err(RepositoryError::Database(e));
        }

        tx.commit().await?;
        Ok(())
    }
}

/// InMemoryRepository
///
/// Process-local `Repository` with the same observable contract as the Postgres one:
/// monotonic ids that are never reused, unique titles, ascending id order.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: Mutex<MemoryTable>,
}

#[derive(Default)]
struct MemoryTable {
    last_id: i32,
    rows: BTreeMap<i32, Drink>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> RepositoryResult<std::sync::MutexGuard<'_, MemoryTable>> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory table lock poisoned".to_string()))
    }
}

impl MemoryTable {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|row| row.title == title && Some(row.id) != except)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list(&self) -> RepositoryResult<Vec<Drink>> {
        Ok(self.table()?.rows.values().cloned().collect())
    }

    async fn create(&self, title: String, recipe: String) -> RepositoryResult<Drink> {
        let mut table = self.table()?;
        if table.title_taken(&title, None) {
            return Err(RepositoryError::DuplicateTitle(title));
        }
        table.last_id += 1;
        let drink = Drink {
            id: table.last_id,
            title,
            recipe,
        };
        table.rows.insert(drink.id, drink.clone());
        Ok(drink)
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Drink>> {
        Ok(self.table()?.rows.get(&id).cloned())
    }

    async fn update(&self, drink: &Drink) -> RepositoryResult<Drink> {
        let mut table = self.table()?;
        if table.title_taken(&drink.title, Some(drink.id)) {
            return Err(RepositoryError::DuplicateTitle(drink.title.clone()));
        }
        match table.rows.get_mut(&drink.id) {
            Some(row) => {
                row.title = drink.title.clone();
                row.recipe = drink.recipe.clone();
                Ok(row.clone())
            }
            None => Err(RepositoryError::Database(sqlx::Error::RowNotFound)),
        }
    }

    async fn delete(&self, drink: &Drink) -> RepositoryResult<()> {
        self.table()?.rows.remove(&drink.id);
        Ok(())
    }
}
