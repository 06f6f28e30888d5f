use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{AppConfig, AuthConfig, Environment, SwaggerConfig};
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::repositories::UserRepository;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::services::{AuthService, PasswordService, TokenService};
use crate::features::categories::repositories::CategoryRepository;
use crate::features::categories::routes as categories_routes;
use crate::features::categories::services::CategoryService;
use crate::features::movies::repositories::MovieRepository;
use crate::features::movies::routes as movies_routes;
use crate::features::movies::services::MovieService;
use crate::shared::types::ApiResponse;

/// Every service the router needs, wired to a set of repositories
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub categories: Arc<CategoryService>,
    pub movies: Arc<MovieService>,
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        movies: Arc<dyn MovieRepository>,
        auth_config: &AuthConfig,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            &auth_config.jwt_secret,
            auth_config.jwt_expires_in,
        ));
        let passwords = PasswordService::new(auth_config.bcrypt_cost);

        Self {
            auth: Arc::new(AuthService::new(users, tokens, passwords)),
            categories: Arc::new(CategoryService::new(Arc::clone(&categories))),
            movies: Arc::new(MovieService::new(movies, categories)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBanner {
    pub status: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_as: Option<AuthenticatedUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthBanner {
    pub timestamp: String,
    pub environment: String,
}

/// Service status banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = ApiResponse<StatusBanner>)
    ),
    tag = "system"
)]
pub async fn root(user: Option<AuthenticatedUser>) -> Json<ApiResponse<StatusBanner>> {
    Json(ApiResponse::success(
        Some(StatusBanner {
            status: "running".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            authenticated_as: user,
        }),
        Some("Movie Management API".to_string()),
    ))
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is running", body = ApiResponse<HealthBanner>)
    ),
    tag = "system"
)]
pub async fn health(State(environment): State<Environment>) -> Json<ApiResponse<HealthBanner>> {
    Json(ApiResponse::success(
        Some(HealthBanner {
            timestamp: Utc::now().to_rfc3339(),
            environment: environment.to_string(),
        }),
        Some("Server is running".to_string()),
    ))
}

fn swagger_routes(config: &SwaggerConfig) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    match config.credentials() {
        Some(credentials) => {
            tracing::info!("Swagger UI basic auth enabled");
            swagger.layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
        }
        None => {
            tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
            swagger
        }
    }
}

/// Assemble the full application: routes, auth, error shaping and HTTP layers.
pub fn build_router(services: &AppServices, app: &AppConfig, swagger: &SwaggerConfig) -> Router {
    // Protected routes (require bearer token)
    let protected_routes = Router::new()
        .merge(categories_routes::routes(Arc::clone(&services.categories)))
        .merge(movies_routes::routes(Arc::clone(&services.movies)))
        .route_layer(from_fn_with_state(
            Arc::clone(&services.auth),
            middleware::auth_middleware,
        ));

    // Root banner personalizes itself when a valid token is sent
    let root_route = Router::new()
        .route("/", get(root))
        .route_layer(from_fn_with_state(
            Arc::clone(&services.auth),
            middleware::optional_auth_middleware,
        ));

    let public_routes = Router::new()
        .merge(auth_routes::public_routes(Arc::clone(&services.auth)))
        .merge(root_route)
        .merge(
            Router::new()
                .route("/health", get(health))
                .with_state(app.environment),
        );

    Router::new()
        .merge(swagger_routes(swagger))
        .merge(protected_routes)
        .merge(public_routes)
        .fallback(middleware::route_not_found)
        .layer(DefaultBodyLimit::max(app.max_request_body_size))
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(from_fn_with_state(
            app.environment,
            middleware::expose_error_detail,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(middleware::cors_layer(app.cors_allowed_origins.clone()))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};

    use super::*;
    use crate::shared::test_helpers::{register_and_login, test_server, InMemoryStore};

    #[tokio::test]
    async fn test_register_twice_is_rejected() {
        let server = test_server(InMemoryStore::new());
        let payload = json!({ "email": "ana@example.com", "password": "secret123", "name": "Ana" });

        let first = server.post("/api/auth/register").json(&payload).await;
        first.assert_status(StatusCode::CREATED);
        let body: Value = first.json();
        assert_eq!(body["success"], true);
        assert!(body.get("data").is_none());

        let second = server.post("/api/auth/register").json(&payload).await;
        second.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = second.json();
        assert_eq!(body["error"], "Registration failed");
        assert_eq!(body["message"], "User already exists with this email");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let server = test_server(InMemoryStore::new());
        server
            .post("/api/auth/register")
            .json(&json!({ "email": "ana@example.com", "password": "secret123", "name": "Ana" }))
            .await
            .assert_status(StatusCode::CREATED);

        let wrong_password = server
            .post("/api/auth/login")
            .json(&json!({ "email": "ana@example.com", "password": "nope-nope" }))
            .await;
        let unknown_email = server
            .post("/api/auth/login")
            .json(&json!({ "email": "bob@example.com", "password": "secret123" }))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());
    }

    #[tokio::test]
    async fn test_login_returns_user_without_password() {
        let server = test_server(InMemoryStore::new());
        server
            .post("/api/auth/register")
            .json(&json!({ "email": "ana@example.com", "password": "secret123", "name": "Ana" }))
            .await;

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "ana@example.com", "password": "secret123" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["data"]["user"]["email"], "ana@example.com");
        assert!(body["data"]["user"].get("password").is_none());
        assert!(body["data"]["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let server = test_server(InMemoryStore::new());
        let response = server.post("/api/auth/register").json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation error");
        let fields: Vec<&str> = body["data"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "name", "password"]);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let server = test_server(InMemoryStore::new());

        let missing = server.get("/api/categories").await;
        missing.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(missing.json::<Value>()["error"], "Access token required");

        let invalid = server
            .get("/api/movies")
            .authorization_bearer("garbage")
            .await;
        invalid.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.json::<Value>()["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_auth_runs_before_validation() {
        let server = test_server(InMemoryStore::new());
        server
            .post("/api/movies")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let store = InMemoryStore::new();
        let server = test_server(store.clone());
        let token = register_and_login(&server).await;

        let created = server
            .post("/api/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Drama" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let id = created.json::<Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        server
            .post("/api/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Drama" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        store.seed_movie("Heat", &id, Utc::now(), None);
        let blocked = server
            .delete(&format!("/api/categories/{}", id))
            .authorization_bearer(&token)
            .await;
        blocked.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = blocked.json();
        assert_eq!(body["error"], "Failed to delete category");
        assert_eq!(body["message"], "Cannot delete category with associated movies");

        let missing = server
            .get("/api/categories/does-not-exist")
            .authorization_bearer(&token)
            .await;
        missing.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            missing.json::<Value>()["message"],
            "Category with the specified ID does not exist"
        );
    }

    #[tokio::test]
    async fn test_movie_create_and_sorted_listing() {
        let store = InMemoryStore::new();
        let category = store.seed_category("Sci-Fi");
        let server = test_server(store.clone());
        let token = register_and_login(&server).await;

        for (title, rating) in [("Alien", json!(8.5)), ("Dune", json!(null)), ("Brazil", json!(7.9))] {
            server
                .post("/api/movies")
                .authorization_bearer(&token)
                .json(&json!({
                    "title": title,
                    "releaseDate": "2020-01-01",
                    "rating": rating,
                    "categoryId": category.id,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/api/movies?sortBy=rating&sortOrder=asc")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let titles: Vec<&str> = body["data"]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Brazil", "Alien", "Dune"]);
        assert_eq!(body["data"]["data"][0]["category"]["name"], "Sci-Fi");
        assert_eq!(body["data"]["pagination"]["total"], 3);
    }

    #[tokio::test]
    async fn test_movie_listing_validates_query() {
        let server = test_server(InMemoryStore::new());
        let token = register_and_login(&server).await;

        let response = server
            .get("/api/movies?page=0&limit=500")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let fields: Vec<String> = response.json::<Value>()["data"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["limit", "page"]);
    }

    #[tokio::test]
    async fn test_movie_listing_far_past_last_page() {
        let store = InMemoryStore::new();
        let category = store.seed_category("Drama");
        store.seed_movie("Heat", &category.id, Utc::now(), None);
        let server = test_server(store);
        let token = register_and_login(&server).await;

        let response = server
            .get("/api/movies?page=9223372036854775807&limit=15")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["data"]["data"].as_array().unwrap().is_empty());
        assert_eq!(body["data"]["pagination"]["page"], 1);
        assert_eq!(body["data"]["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn test_movie_with_unknown_category_is_rejected() {
        let server = test_server(InMemoryStore::new());
        let token = register_and_login(&server).await;

        let response = server
            .post("/api/movies")
            .authorization_bearer(&token)
            .json(&json!({ "title": "Heat", "releaseDate": "1995-12-15", "categoryId": "missing" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Failed to create movie");
        assert_eq!(body["message"], "Category not found");
    }

    #[tokio::test]
    async fn test_new_releases_flagged() {
        let store = InMemoryStore::new();
        let category = store.seed_category("Drama");
        store.seed_movie("Fresh", &category.id, Utc::now() - Duration::days(3), None);
        store.seed_movie("Stale", &category.id, Utc::now() - Duration::days(60), None);
        let server = test_server(store);
        let token = register_and_login(&server).await;

        let response = server
            .get("/api/movies/new-releases")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let movies = body["data"].as_array().unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0]["title"], "Fresh");
        assert_eq!(movies[0]["isNewRelease"], true);
    }

    #[tokio::test]
    async fn test_watching_twice_keeps_one_record() {
        let store = InMemoryStore::new();
        let category = store.seed_category("Drama");
        let movie = store.seed_movie("Heat", &category.id, Utc::now(), Some(8.3));
        let server = test_server(store.clone());
        let token = register_and_login(&server).await;

        for _ in 0..2 {
            let response = server
                .post("/api/movies/watch")
                .authorization_bearer(&token)
                .json(&json!({ "movieId": movie.id }))
                .await;
            response.assert_status_ok();
            assert_eq!(response.json::<Value>()["message"], "Movie marked as watched");
        }
        assert_eq!(store.watched_records().len(), 1);

        let response = server
            .get("/api/movies/users-watched")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let users = body["data"].as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["watchedMovies"][0]["movie"]["title"], "Heat");
    }

    #[tokio::test]
    async fn test_watching_unknown_movie() {
        let server = test_server(InMemoryStore::new());
        let token = register_and_login(&server).await;

        let response = server
            .post("/api/movies/watch")
            .authorization_bearer(&token)
            .json(&json!({ "movieId": "missing" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Failed to mark movie as watched");
        assert_eq!(body["message"], "Movie not found");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let server = test_server(InMemoryStore::new());
        let response = server.get("/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route GET /nope not found");
    }

    #[tokio::test]
    async fn test_root_banner_names_caller() {
        let server = test_server(InMemoryStore::new());

        let anonymous: Value = server.get("/").await.json();
        assert_eq!(anonymous["message"], "Movie Management API");
        assert_eq!(anonymous["data"]["status"], "running");
        assert!(anonymous["data"].get("authenticatedAs").is_none());

        let token = register_and_login(&server).await;
        let named: Value = server.get("/").authorization_bearer(&token).await.json();
        assert!(named["data"]["authenticatedAs"]["email"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_health_and_security_headers() {
        let server = test_server(InMemoryStore::new());
        let response = server.get("/health").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["environment"], "test");
        assert_eq!(
            response.header(HeaderName::from_static("x-content-type-options")),
            "nosniff"
        );
        assert!(response.maybe_header("x-request-id").is_some());
    }
}
