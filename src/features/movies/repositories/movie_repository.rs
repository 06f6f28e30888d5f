use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::{sqlstate, violated_constraint, FOREIGN_KEY_VIOLATION};
use crate::core::error::{AppError, Result};
use crate::features::movies::models::{
    Movie, MovieChanges, MovieFilter, MovieRecord, MovieSort, NewMovie, WatchedMovie,
    WatchedMovieEntry, WatchedMovieRecord,
};
use crate::shared::pagination::PageParams;

/// Movies and the watched relation between users and movies
#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// One page of movies matching `filter`. Ties on the sort key are broken by id.
    async fn list(
        &self,
        filter: &MovieFilter,
        sort: MovieSort,
        page: PageParams,
    ) -> Result<Vec<Movie>>;

    async fn count(&self, filter: &MovieFilter) -> Result<i64>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Movie>>;

    /// Fails with `CategoryNotFound` when the category does not exist.
    async fn create(&self, movie: NewMovie) -> Result<Movie>;

    /// Returns `None` when no movie has this id.
    async fn update(&self, id: &str, changes: MovieChanges) -> Result<Option<Movie>>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Movies released at or after `cutoff`, newest first
    async fn released_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Movie>>;

    /// Inserts the (user, movie) pair or refreshes its `watched_at`.
    async fn mark_watched(
        &self,
        user_id: &str,
        movie_id: &str,
        watched_at: DateTime<Utc>,
    ) -> Result<WatchedMovie>;

    /// Most recently watched first
    async fn list_watched(&self, user_id: &str) -> Result<Vec<WatchedMovieEntry>>;
}

pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MOVIE_COLUMNS: &str = r#"
    m.id, m.title, m.description, m.release_date, m.duration, m.rating, m.category_id,
    m.created_at, m.updated_at,
    c.name AS category_name, c.created_at AS category_created_at,
    c.updated_at AS category_updated_at
"#;

// Unset filters are bound as NULL and short-circuit their condition
const MOVIE_FILTER: &str = r#"
    ($1::TEXT IS NULL OR m.title ILIKE $1)
    AND ($2::TEXT IS NULL OR m.category_id = $2)
"#;

/// Turns user input into an ILIKE substring pattern, escaping its wildcards.
pub fn title_pattern(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len() + 2);
    escaped.push('%');
    for c in title.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn category_fk_error(e: sqlx::Error, action: &str) -> AppError {
    match sqlstate(&e).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => AppError::CategoryNotFound,
        _ => {
            tracing::error!("Failed to {} movie: {:?}", action, e);
            AppError::Database(e)
        }
    }
}

/// Foreign key from `watched_movies.movie_id` to `movies`
const WATCHED_MOVIE_FK: &str = "watched_movies_movie_id_fkey";

/// Only the movie reference means the movie is gone. A violated user reference
/// stays a database error.
fn is_missing_movie(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some(FOREIGN_KEY_VIOLATION) && constraint == Some(WATCHED_MOVIE_FK)
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn list(
        &self,
        filter: &MovieFilter,
        sort: MovieSort,
        page: PageParams,
    ) -> Result<Vec<Movie>> {
        let query = format!(
            r#"
            SELECT {}
            FROM movies m
            JOIN categories c ON c.id = m.category_id
            WHERE {}
            ORDER BY {} {} NULLS LAST, m.id {}
            LIMIT $3 OFFSET $4
            "#,
            MOVIE_COLUMNS,
            MOVIE_FILTER,
            sort.field.column(),
            sort.order.keyword(),
            sort.order.keyword()
        );

        let records: Vec<MovieRecord> = sqlx::query_as(&query)
            .bind(filter.title.as_deref().map(title_pattern))
            .bind(filter.category_id.as_deref())
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list movies: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(records.into_iter().map(Movie::from).collect())
    }

    async fn count(&self, filter: &MovieFilter) -> Result<i64> {
        let query = format!("SELECT COUNT(*) FROM movies m WHERE {}", MOVIE_FILTER);
        sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.title.as_deref().map(title_pattern))
            .bind(filter.category_id.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count movies: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Movie>> {
        let query = format!(
            r#"
            SELECT {}
            FROM movies m
            JOIN categories c ON c.id = m.category_id
            WHERE m.id = $1
            "#,
            MOVIE_COLUMNS
        );

        let record: Option<MovieRecord> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get movie by id: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(record.map(Movie::from))
    }

    async fn create(&self, movie: NewMovie) -> Result<Movie> {
        let query = format!(
            r#"
            WITH m AS (
                INSERT INTO movies (id, title, description, release_date, duration, rating, category_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {}
            FROM m
            JOIN categories c ON c.id = m.category_id
            "#,
            MOVIE_COLUMNS
        );

        let record: MovieRecord = sqlx::query_as(&query)
            .bind(Uuid::now_v7().to_string())
            .bind(&movie.title)
            .bind(&movie.description)
            .bind(movie.release_date)
            .bind(movie.duration)
            .bind(movie.rating)
            .bind(&movie.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| category_fk_error(e, "create"))?;

        Ok(record.into())
    }

    async fn update(&self, id: &str, changes: MovieChanges) -> Result<Option<Movie>> {
        let query = format!(
            r#"
            WITH m AS (
                UPDATE movies
                SET title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    release_date = COALESCE($4, release_date),
                    duration = COALESCE($5, duration),
                    rating = COALESCE($6, rating),
                    category_id = COALESCE($7, category_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {}
            FROM m
            JOIN categories c ON c.id = m.category_id
            "#,
            MOVIE_COLUMNS
        );

        let record: Option<MovieRecord> = sqlx::query_as(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.release_date)
            .bind(changes.duration)
            .bind(changes.rating)
            .bind(&changes.category_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| category_fk_error(e, "update"))?;

        Ok(record.map(Movie::from))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete movie: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn released_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Movie>> {
        let query = format!(
            r#"
            SELECT {}
            FROM movies m
            JOIN categories c ON c.id = m.category_id
            WHERE m.release_date >= $1
            ORDER BY m.release_date DESC, m.id DESC
            "#,
            MOVIE_COLUMNS
        );

        let records: Vec<MovieRecord> = sqlx::query_as(&query)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list new releases: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(records.into_iter().map(Movie::from).collect())
    }

    async fn mark_watched(
        &self,
        user_id: &str,
        movie_id: &str,
        watched_at: DateTime<Utc>,
    ) -> Result<WatchedMovie> {
        sqlx::query_as::<_, WatchedMovie>(
            r#"
            INSERT INTO watched_movies (id, user_id, movie_id, watched_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, movie_id)
            DO UPDATE SET watched_at = EXCLUDED.watched_at, updated_at = NOW()
            RETURNING id, user_id, movie_id, watched_at, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id)
        .bind(movie_id)
        .bind(watched_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_missing_movie(
                sqlstate(&e).as_deref(),
                violated_constraint(&e).as_deref(),
            ) {
                return AppError::MovieNotFound;
            }
            tracing::error!("Failed to mark movie as watched: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list_watched(&self, user_id: &str) -> Result<Vec<WatchedMovieEntry>> {
        let query = format!(
            r#"
            SELECT w.id AS watched_id, w.user_id, w.watched_at,
                   w.created_at AS watched_created_at, w.updated_at AS watched_updated_at,
                   {}
            FROM watched_movies w
            JOIN movies m ON m.id = w.movie_id
            JOIN categories c ON c.id = m.category_id
            WHERE w.user_id = $1
            ORDER BY w.watched_at DESC, w.id DESC
            "#,
            MOVIE_COLUMNS
        );

        let records: Vec<WatchedMovieRecord> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list watched movies: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(records.into_iter().map(WatchedMovieEntry::from).collect())
    }
}
