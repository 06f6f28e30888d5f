use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::core::app::{HealthBanner, StatusBanner, __path_health, __path_root};
use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::movies::{
    dtos as movies_dtos, handlers as movies_handlers, models as movies_models,
};
use crate::shared::pagination::{Paginated, PaginationMeta};
use crate::shared::types::ApiResponse;
use crate::shared::validation::{FieldError, ValidationErrorData};

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        health,
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        // Categories (protected)
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::get_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Movies (protected)
        movies_handlers::list_movies,
        movies_handlers::create_movie,
        movies_handlers::new_releases,
        movies_handlers::users_watched,
        movies_handlers::mark_watched,
        movies_handlers::get_movie,
        movies_handlers::update_movie,
        movies_handlers::delete_movie,
    ),
    components(
        schemas(
            // Shared
            FieldError,
            ValidationErrorData,
            PaginationMeta,
            ApiResponse<ValidationErrorData>,
            StatusBanner,
            HealthBanner,
            ApiResponse<StatusBanner>,
            ApiResponse<HealthBanner>,
            // Auth
            auth::model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::UserResponseDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            // Categories
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::CategoryResponseDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Movies
            movies_models::SortField,
            movies_models::SortOrder,
            movies_dtos::CreateMovieDto,
            movies_dtos::UpdateMovieDto,
            movies_dtos::MarkWatchedDto,
            movies_dtos::MovieResponseDto,
            movies_dtos::NewReleaseDto,
            movies_dtos::WatchedMovieDto,
            movies_dtos::UserWatchedMoviesDto,
            Paginated<movies_dtos::MovieResponseDto>,
            ApiResponse<movies_dtos::MovieResponseDto>,
            ApiResponse<Paginated<movies_dtos::MovieResponseDto>>,
            ApiResponse<Vec<movies_dtos::NewReleaseDto>>,
            ApiResponse<Vec<movies_dtos::UserWatchedMoviesDto>>,
        )
    ),
    tags(
        (name = "system", description = "Status and health banners"),
        (name = "auth", description = "Registration and login"),
        (name = "categories", description = "Movie categories"),
        (name = "movies", description = "Movie catalog, new releases and watched movies"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Movie Catalog API",
        version = "0.1.0",
        description = "API documentation for the movie catalog",
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by protected operations
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
