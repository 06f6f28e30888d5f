use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::{sqlstate, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::core::error::{AppError, Result};
use crate::features::categories::models::Category;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<Category>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Fails with `CategoryAlreadyExists` when the name is taken.
    async fn create(&self, name: &str) -> Result<Category>;

    /// Returns `None` when no category has this id.
    async fn update(&self, id: &str, name: &str) -> Result<Option<Category>>;

    /// Returns `false` when nothing was deleted. Fails with `CategoryHasMovies`
    /// when movies still reference the category.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn count_movies(&self, id: &str) -> Result<i64>;
}

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, created_at, updated_at";

fn map_write_error(e: sqlx::Error, action: &str) -> AppError {
    match sqlstate(&e).as_deref() {
        Some(UNIQUE_VIOLATION) => AppError::CategoryAlreadyExists,
        Some(FOREIGN_KEY_VIOLATION) => AppError::CategoryHasMovies,
        _ => {
            tracing::error!("Failed to {} category: {:?}", action, e);
            AppError::Database(e)
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        let query = format!(
            "SELECT {} FROM categories ORDER BY name ASC",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category by id: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE name = $1",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get category by name: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn create(&self, name: &str) -> Result<Category> {
        let query = format!(
            "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(Uuid::now_v7().to_string())
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "create"))
    }

    async fn update(&self, id: &str, name: &str) -> Result<Option<Category>> {
        let query = format!(
            r#"
            UPDATE categories
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "update"))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "delete"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_movies(&self, id: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count movies for category: {:?}", e);
                AppError::Database(e)
            })
    }
}
