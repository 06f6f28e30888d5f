use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::movies::models::{Movie, MovieRecord};

/// One row of the user/movie watched relation
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct WatchedMovie {
    pub id: String,
    pub user_id: String,
    pub movie_id: String,
    pub watched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Watched relation joined with its movie and the movie's category
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedMovieEntry {
    pub watched: WatchedMovie,
    pub movie: Movie,
}

#[derive(Debug, Clone, FromRow)]
pub struct WatchedMovieRecord {
    pub watched_id: String,
    pub user_id: String,
    pub watched_at: DateTime<Utc>,
    pub watched_created_at: DateTime<Utc>,
    pub watched_updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub movie: MovieRecord,
}

impl From<WatchedMovieRecord> for WatchedMovieEntry {
    fn from(r: WatchedMovieRecord) -> Self {
        Self {
            watched: WatchedMovie {
                id: r.watched_id,
                user_id: r.user_id,
                movie_id: r.movie.id.clone(),
                watched_at: r.watched_at,
                created_at: r.watched_created_at,
                updated_at: r.watched_updated_at,
            },
            movie: r.movie.into(),
        }
    }
}
