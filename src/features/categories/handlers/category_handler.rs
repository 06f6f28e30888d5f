use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::core::error::{AppError, Result};
use crate::core::extractor::{ValidatedJson, ValidatedPath};
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::ApiResponse;
use crate::shared::validation::IdParams;

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.list().await?;
    Ok(Json(ApiResponse::success(Some(categories), None)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error or name already used"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_category(
    State(service): State<Arc<CategoryService>>,
    ValidatedJson(dto): ValidatedJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let category = service
        .create(dto)
        .await
        .map_err(|e| e.during("Failed to create category"))?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created successfully".to_string()),
        )),
    ))
}

/// Get category by id
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(IdParams),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    ValidatedPath(params): ValidatedPath<IdParams>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get(&params.id).await?.ok_or_else(|| {
        AppError::NotFound("Category with the specified ID does not exist".to_string())
    })?;
    Ok(Json(ApiResponse::success(Some(category), None)))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(IdParams),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error, unknown category or name already used"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    ValidatedPath(params): ValidatedPath<IdParams>,
    ValidatedJson(dto): ValidatedJson<UpdateCategoryDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service
        .update(&params.id, dto)
        .await
        .map_err(|e| e.during("Failed to update category"))?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated successfully".to_string()),
    )))
}

/// Delete a category that no movie references
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(IdParams),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Unknown category or category still has movies"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "categories",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    ValidatedPath(params): ValidatedPath<IdParams>,
) -> Result<Json<ApiResponse<()>>> {
    service
        .delete(&params.id)
        .await
        .map_err(|e| e.during("Failed to delete category"))?;
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
