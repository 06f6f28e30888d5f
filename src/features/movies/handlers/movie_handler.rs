use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::core::error::{AppError, Result};
use crate::core::extractor::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::movies::dtos::{
    CreateMovieDto, MarkWatchedDto, MovieQueryParams, MovieResponseDto, NewReleaseDto,
    UpdateMovieDto, UserWatchedMoviesDto,
};
use crate::features::movies::services::MovieService;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;
use crate::shared::validation::IdParams;

/// List movies with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/movies",
    params(MovieQueryParams),
    responses(
        (status = 200, description = "Page of movies", body = ApiResponse<Paginated<MovieResponseDto>>),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_movies(
    State(service): State<Arc<MovieService>>,
    ValidatedQuery(params): ValidatedQuery<MovieQueryParams>,
) -> Result<Json<ApiResponse<Paginated<MovieResponseDto>>>> {
    let page = service.list(&params).await?;
    Ok(Json(ApiResponse::success(Some(page), None)))
}

/// Create a movie in an existing category
#[utoipa::path(
    post,
    path = "/api/movies",
    request_body = CreateMovieDto,
    responses(
        (status = 201, description = "Movie created", body = ApiResponse<MovieResponseDto>),
        (status = 400, description = "Validation error or unknown category"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_movie(
    State(service): State<Arc<MovieService>>,
    ValidatedJson(dto): ValidatedJson<CreateMovieDto>,
) -> Result<(StatusCode, Json<ApiResponse<MovieResponseDto>>)> {
    let movie = service
        .create(dto)
        .await
        .map_err(|e| e.during("Failed to create movie"))?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(movie),
            Some("Movie created successfully".to_string()),
        )),
    ))
}

/// Movies released within the last 21 days
#[utoipa::path(
    get,
    path = "/api/movies/new-releases",
    responses(
        (status = 200, description = "New releases, newest first", body = ApiResponse<Vec<NewReleaseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn new_releases(
    State(service): State<Arc<MovieService>>,
) -> Result<Json<ApiResponse<Vec<NewReleaseDto>>>> {
    let movies = service.new_releases().await?;
    Ok(Json(ApiResponse::success(Some(movies), None)))
}

/// The authenticated user with the movies they have watched
#[utoipa::path(
    get,
    path = "/api/movies/users-watched",
    responses(
        (status = 200, description = "Watched movies, most recent first", body = ApiResponse<Vec<UserWatchedMoviesDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn users_watched(
    user: AuthenticatedUser,
    State(service): State<Arc<MovieService>>,
) -> Result<Json<ApiResponse<Vec<UserWatchedMoviesDto>>>> {
    let users = service.users_watched(user).await?;
    Ok(Json(ApiResponse::success(Some(users), None)))
}

/// Mark a movie as watched by the authenticated user
#[utoipa::path(
    post,
    path = "/api/movies/watch",
    request_body = MarkWatchedDto,
    responses(
        (status = 200, description = "Movie marked as watched"),
        (status = 400, description = "Validation error or unknown movie"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_watched(
    user: AuthenticatedUser,
    State(service): State<Arc<MovieService>>,
    ValidatedJson(dto): ValidatedJson<MarkWatchedDto>,
) -> Result<Json<ApiResponse<()>>> {
    service
        .mark_watched(&user.id, &dto.movie_id)
        .await
        .map_err(|e| e.during("Failed to mark movie as watched"))?;
    Ok(Json(ApiResponse::message("Movie marked as watched")))
}

/// Get movie by id
#[utoipa::path(
    get,
    path = "/api/movies/{id}",
    params(IdParams),
    responses(
        (status = 200, description = "Movie found", body = ApiResponse<MovieResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Movie not found")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_movie(
    State(service): State<Arc<MovieService>>,
    ValidatedPath(params): ValidatedPath<IdParams>,
) -> Result<Json<ApiResponse<MovieResponseDto>>> {
    let movie = service.get(&params.id).await?.ok_or_else(|| {
        AppError::NotFound("Movie with the specified ID does not exist".to_string())
    })?;
    Ok(Json(ApiResponse::success(Some(movie), None)))
}

/// Partially update a movie
#[utoipa::path(
    put,
    path = "/api/movies/{id}",
    params(IdParams),
    request_body = UpdateMovieDto,
    responses(
        (status = 200, description = "Movie updated", body = ApiResponse<MovieResponseDto>),
        (status = 400, description = "Validation error, unknown movie or unknown category"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_movie(
    State(service): State<Arc<MovieService>>,
    ValidatedPath(params): ValidatedPath<IdParams>,
    ValidatedJson(dto): ValidatedJson<UpdateMovieDto>,
) -> Result<Json<ApiResponse<MovieResponseDto>>> {
    let movie = service
        .update(&params.id, dto)
        .await
        .map_err(|e| e.during("Failed to update movie"))?;
    Ok(Json(ApiResponse::success(
        Some(movie),
        Some("Movie updated successfully".to_string()),
    )))
}

/// Delete a movie
#[utoipa::path(
    delete,
    path = "/api/movies/{id}",
    params(IdParams),
    responses(
        (status = 200, description = "Movie deleted"),
        (status = 400, description = "Unknown movie"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "movies",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_movie(
    State(service): State<Arc<MovieService>>,
    ValidatedPath(params): ValidatedPath<IdParams>,
) -> Result<Json<ApiResponse<()>>> {
    service
        .delete(&params.id)
        .await
        .map_err(|e| e.during("Failed to delete movie"))?;
    Ok(Json(ApiResponse::message("Movie deleted successfully")))
}
