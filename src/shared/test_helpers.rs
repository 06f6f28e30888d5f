use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::json;
use uuid::Uuid;

use crate::core::app::{build_router, AppServices};
use crate::core::config::{AppConfig, AuthConfig, Environment, SwaggerConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{NewUser, User};
use crate::features::auth::repositories::UserRepository;
use crate::features::auth::services::{AuthService, PasswordService, TokenService};
use crate::features::categories::models::Category;
use crate::features::categories::repositories::CategoryRepository;
use crate::features::movies::models::{
    Movie, MovieChanges, MovieFilter, MovieSort, NewMovie, SortField, SortOrder, WatchedMovie,
    WatchedMovieEntry,
};
use crate::features::movies::repositories::MovieRepository;
use crate::shared::pagination::PageParams;

pub const TEST_JWT_SECRET: &str = "test-secret";

#[derive(Debug, Clone)]
struct StoredMovie {
    id: String,
    title: String,
    description: Option<String>,
    release_date: DateTime<Utc>,
    duration: Option<i32>,
    rating: Option<f64>,
    category_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreState {
    users: Vec<User>,
    categories: Vec<Category>,
    movies: Vec<StoredMovie>,
    watched: Vec<WatchedMovie>,
}

impl StoreState {
    fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn hydrate(&self, movie: &StoredMovie) -> Option<Movie> {
        let category = self.category(&movie.category_id)?.clone();
        Some(Movie {
            id: movie.id.clone(),
            title: movie.title.clone(),
            description: movie.description.clone(),
            release_date: movie.release_date,
            duration: movie.duration,
            rating: movie.rating,
            category_id: movie.category_id.clone(),
            created_at: movie.created_at,
            updated_at: movie.updated_at,
            category,
        })
    }

    fn matching(&self, filter: &MovieFilter) -> Vec<&StoredMovie> {
        let needle = filter.title.as_deref().map(str::to_lowercase);
        self.movies
            .iter()
            .filter(|m| {
                needle
                    .as_deref()
                    .is_none_or(|n| m.title.to_lowercase().contains(n))
            })
            .filter(|m| {
                filter
                    .category_id
                    .as_deref()
                    .is_none_or(|c| m.category_id == c)
            })
            .collect()
    }
}

/// Repository implementation backed by plain vectors. Enforces the same
/// uniqueness and referential rules as the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.lock().categories.push(category.clone());
        category
    }

    pub fn seed_movie(
        &self,
        title: &str,
        category_id: &str,
        release_date: DateTime<Utc>,
        rating: Option<f64>,
    ) -> Movie {
        let now = Utc::now();
        let stored = StoredMovie {
            id: Uuid::now_v7().to_string(),
            title: title.to_string(),
            description: None,
            release_date,
            duration: None,
            rating,
            category_id: category_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.lock();
        state.movies.push(stored.clone());
        state.hydrate(&stored).unwrap()
    }

    pub fn seed_user(&self, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            password: "not-a-real-hash".to_string(),
            name: Name().fake(),
            created_at: now,
            updated_at: now,
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn watched_records(&self) -> Vec<WatchedMovie> {
        self.lock().watched.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::UserAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7().to_string(),
            email: user.email,
            password: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Category>> {
        let mut categories = self.lock().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        Ok(self.lock().category(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create(&self, name: &str) -> Result<Category> {
        if self.find_by_name(name).await?.is_some() {
            return Err(AppError::CategoryAlreadyExists);
        }
        Ok(self.seed_category(name))
    }

    async fn update(&self, id: &str, name: &str) -> Result<Option<Category>> {
        let mut state = self.lock();
        if state.categories.iter().any(|c| c.name == name && c.id != id) {
            return Err(AppError::CategoryAlreadyExists);
        }
        let Some(category) = state.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.name = name.to_string();
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.lock();
        if state.movies.iter().any(|m| m.category_id == id) {
            return Err(AppError::CategoryHasMovies);
        }
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        Ok(state.categories.len() < before)
    }

    async fn count_movies(&self, id: &str) -> Result<i64> {
        Ok(self
            .lock()
            .movies
            .iter()
            .filter(|m| m.category_id == id)
            .count() as i64)
    }
}

fn compare_movies(a: &StoredMovie, b: &StoredMovie, sort: MovieSort) -> Ordering {
    let directed = |ordering: Ordering| match sort.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    let primary = match sort.field {
        SortField::ReleaseDate => directed(a.release_date.cmp(&b.release_date)),
        SortField::Title => directed(a.title.cmp(&b.title)),
        // NULL ratings sort last whatever the direction
        SortField::Rating => match (a.rating, b.rating) {
            (Some(x), Some(y)) => directed(x.total_cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };

    primary.then_with(|| directed(a.id.cmp(&b.id)))
}

#[async_trait]
impl MovieRepository for InMemoryStore {
    async fn list(
        &self,
        filter: &MovieFilter,
        sort: MovieSort,
        page: PageParams,
    ) -> Result<Vec<Movie>> {
        let state = self.lock();
        let mut movies = state.matching(filter);
        movies.sort_by(|a, b| compare_movies(a, b, sort));

        Ok(movies
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .filter_map(|m| state.hydrate(m))
            .collect())
    }

    async fn count(&self, filter: &MovieFilter) -> Result<i64> {
        Ok(self.lock().matching(filter).len() as i64)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Movie>> {
        let state = self.lock();
        Ok(state
            .movies
            .iter()
            .find(|m| m.id == id)
            .and_then(|m| state.hydrate(m)))
    }

    async fn create(&self, movie: NewMovie) -> Result<Movie> {
        let mut state = self.lock();
        if state.category(&movie.category_id).is_none() {
            return Err(AppError::CategoryNotFound);
        }
        let now = Utc::now();
        let stored = StoredMovie {
            id: Uuid::now_v7().to_string(),
            title: movie.title,
            description: movie.description,
            release_date: movie.release_date,
            duration: movie.duration,
            rating: movie.rating,
            category_id: movie.category_id,
            created_at: now,
            updated_at: now,
        };
        state.movies.push(stored.clone());
        state.hydrate(&stored).ok_or(AppError::CategoryNotFound)
    }

    async fn update(&self, id: &str, changes: MovieChanges) -> Result<Option<Movie>> {
        let mut state = self.lock();
        if let Some(category_id) = changes.category_id.as_deref() {
            if state.category(category_id).is_none() {
                return Err(AppError::CategoryNotFound);
            }
        }
        let Some(movie) = state.movies.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            movie.title = title;
        }
        if let Some(description) = changes.description {
            movie.description = Some(description);
        }
        if let Some(release_date) = changes.release_date {
            movie.release_date = release_date;
        }
        if let Some(duration) = changes.duration {
            movie.duration = Some(duration);
        }
        if let Some(rating) = changes.rating {
            movie.rating = Some(rating);
        }
        if let Some(category_id) = changes.category_id {
            movie.category_id = category_id;
        }
        movie.updated_at = Utc::now();

        let movie = movie.clone();
        Ok(state.hydrate(&movie))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.lock();
        let before = state.movies.len();
        state.movies.retain(|m| m.id != id);
        state.watched.retain(|w| w.movie_id != id);
        Ok(state.movies.len() < before)
    }

    async fn released_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Movie>> {
        let state = self.lock();
        let mut movies: Vec<&StoredMovie> = state
            .movies
            .iter()
            .filter(|m| m.release_date >= cutoff)
            .collect();
        movies.sort_by(|a, b| compare_movies(a, b, MovieSort::default()));
        Ok(movies.into_iter().filter_map(|m| state.hydrate(m)).collect())
    }

    async fn mark_watched(
        &self,
        user_id: &str,
        movie_id: &str,
        watched_at: DateTime<Utc>,
    ) -> Result<WatchedMovie> {
        let mut state = self.lock();
        if !state.movies.iter().any(|m| m.id == movie_id) {
            return Err(AppError::MovieNotFound);
        }
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::Internal(
                "watched_movies_user_id_fkey violated".to_string(),
            ));
        }

        if let Some(existing) = state
            .watched
            .iter_mut()
            .find(|w| w.user_id == user_id && w.movie_id == movie_id)
        {
            existing.watched_at = watched_at;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let watched = WatchedMovie {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
            watched_at,
            created_at: now,
            updated_at: now,
        };
        state.watched.push(watched.clone());
        Ok(watched)
    }

    async fn list_watched(&self, user_id: &str) -> Result<Vec<WatchedMovieEntry>> {
        let state = self.lock();
        let mut entries: Vec<WatchedMovieEntry> = state
            .watched
            .iter()
            .filter(|w| w.user_id == user_id)
            .filter_map(|w| {
                let stored = state.movies.iter().find(|m| m.id == w.movie_id)?;
                Some(WatchedMovieEntry {
                    watched: w.clone(),
                    movie: state.hydrate(stored)?,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.watched
                .watched_at
                .cmp(&a.watched.watched_at)
                .then_with(|| b.watched.id.cmp(&a.watched.id))
        });
        Ok(entries)
    }
}

pub fn test_token_service() -> TokenService {
    TokenService::new(TEST_JWT_SECRET, Duration::from_secs(7 * 24 * 60 * 60))
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expires_in: Duration::from_secs(7 * 24 * 60 * 60),
        bcrypt_cost: 4,
    }
}

pub fn test_auth_service(store: InMemoryStore) -> AuthService {
    AuthService::new(
        Arc::new(store),
        Arc::new(test_token_service()),
        PasswordService::new(4),
    )
}

/// Full router over an in-memory store, driven through `axum-test`
pub fn test_server(store: InMemoryStore) -> TestServer {
    let services = AppServices::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store),
        &test_auth_config(),
    );
    let app = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: Environment::Test,
        cors_allowed_origins: vec!["*".to_string()],
        max_request_body_size: 1024 * 1024,
    };
    let swagger = SwaggerConfig {
        username: None,
        password: None,
        title: "Movie Catalog API".to_string(),
        version: "0.1.0".to_string(),
        description: "Test".to_string(),
    };

    TestServer::new(build_router(&services, &app, &swagger)).unwrap()
}

/// Registers a random user and returns a bearer token for it
pub async fn register_and_login(server: &TestServer) -> String {
    let email: String = SafeEmail().fake();
    let name: String = Name().fake();

    server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": "secret123", "name": name }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": "secret123" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .unwrap()
}
