use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::features::categories::models::Category;

/// Movie together with the category it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub release_date: DateTime<Utc>,
    /// Minutes
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Category,
}

/// Flat row produced by joining `movies` with `categories`
#[derive(Debug, Clone, FromRow)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub release_date: DateTime<Utc>,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: String,
    pub category_created_at: DateTime<Utc>,
    pub category_updated_at: DateTime<Utc>,
}

impl From<MovieRecord> for Movie {
    fn from(r: MovieRecord) -> Self {
        Self {
            category: Category {
                id: r.category_id.clone(),
                name: r.category_name,
                created_at: r.category_created_at,
                updated_at: r.category_updated_at,
            },
            id: r.id,
            title: r.title,
            description: r.description,
            release_date: r.release_date,
            duration: r.duration,
            rating: r.rating,
            category_id: r.category_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Insert payload with the release date already parsed
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: Option<String>,
    pub release_date: DateTime<Utc>,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub category_id: String,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    ReleaseDate,
    Title,
    Rating,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::ReleaseDate => "m.release_date",
            SortField::Title => "m.title",
            SortField::Rating => "m.rating",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovieSort {
    pub field: SortField,
    pub order: SortOrder,
}
