use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::auth::dtos::UserResponseDto;
use crate::features::categories::dtos::CategoryResponseDto;
use crate::features::movies::models::{
    Movie, MovieFilter, MovieSort, SortField, SortOrder, WatchedMovieEntry,
};
use crate::shared::constants::MAX_QUERY_LIMIT;
use crate::shared::validation::validate_release_date;

/// Request DTO for creating a movie
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateMovieDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    /// ISO 8601 date or date-time
    #[validate(
        length(min = 1, message = "Release date is required"),
        custom(function = "validate_release_date")
    )]
    pub release_date: String,

    /// Running time in minutes
    pub duration: Option<i32>,

    pub rating: Option<f64>,

    #[validate(length(min = 1, message = "Category ID is required"))]
    pub category_id: String,
}

/// Request DTO for a partial movie update. Omitted fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateMovieDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(custom(function = "validate_release_date"))]
    pub release_date: Option<String>,

    pub duration: Option<i32>,

    pub rating: Option<f64>,

    #[validate(length(min = 1, message = "Category ID is required"))]
    pub category_id: Option<String>,
}

/// Query parameters for listing movies
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct MovieQueryParams {
    /// Case-insensitive substring of the title
    pub title: Option<String>,

    pub category_id: Option<String>,

    /// Page number (1-indexed)
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<i64>,

    /// Items per page (at most 15 are served)
    #[validate(range(
        min = 1,
        max = MAX_QUERY_LIMIT,
        message = "Limit must be between 1 and 100"
    ))]
    pub limit: Option<i64>,

    #[param(inline)]
    pub sort_by: Option<SortField>,

    #[param(inline)]
    pub sort_order: Option<SortOrder>,
}

impl MovieQueryParams {
    pub fn filter(&self) -> MovieFilter {
        MovieFilter {
            title: self.title.clone().filter(|t| !t.is_empty()),
            category_id: self.category_id.clone().filter(|c| !c.is_empty()),
        }
    }

    /// Release date descending unless asked otherwise
    pub fn sort(&self) -> MovieSort {
        MovieSort {
            field: self.sort_by.unwrap_or_default(),
            order: self.sort_order.unwrap_or_default(),
        }
    }
}

/// Request DTO for marking a movie as watched
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkWatchedDto {
    #[validate(length(min = 1, message = "Movie ID is required"))]
    pub movie_id: String,
}

/// Response DTO for movie, with its category embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponseDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub release_date: DateTime<Utc>,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: CategoryResponseDto,
}

impl From<Movie> for MovieResponseDto {
    fn from(m: Movie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            release_date: m.release_date,
            duration: m.duration,
            rating: m.rating,
            category_id: m.category_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            category: m.category.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewReleaseDto {
    #[serde(flatten)]
    pub movie: MovieResponseDto,
    pub is_new_release: bool,
}

impl From<Movie> for NewReleaseDto {
    fn from(m: Movie) -> Self {
        Self {
            movie: m.into(),
            is_new_release: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchedMovieDto {
    pub id: String,
    pub user_id: String,
    pub movie_id: String,
    pub watched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub movie: MovieResponseDto,
}

impl From<WatchedMovieEntry> for WatchedMovieDto {
    fn from(entry: WatchedMovieEntry) -> Self {
        let w = entry.watched;
        Self {
            id: w.id,
            user_id: w.user_id,
            movie_id: w.movie_id,
            watched_at: w.watched_at,
            created_at: w.created_at,
            updated_at: w.updated_at,
            movie: entry.movie.into(),
        }
    }
}

/// A user and the movies they have watched, most recent first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWatchedMoviesDto {
    #[serde(flatten)]
    pub user: UserResponseDto,
    pub watched_movies: Vec<WatchedMovieDto>,
}
