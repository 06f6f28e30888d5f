use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::movies::handlers;
use crate::features::movies::services::MovieService;

/// Create routes for the movies feature
///
/// Every route requires authentication; the caller applies the auth middleware.
pub fn routes(service: Arc<MovieService>) -> Router {
    Router::new()
        .route(
            "/api/movies",
            get(handlers::list_movies).post(handlers::create_movie),
        )
        .route("/api/movies/new-releases", get(handlers::new_releases))
        .route("/api/movies/users-watched", get(handlers::users_watched))
        .route("/api/movies/watch", post(handlers::mark_watched))
        .route(
            "/api/movies/{id}",
            get(handlers::get_movie)
                .put(handlers::update_movie)
                .delete(handlers::delete_movie),
        )
        .with_state(service)
}
