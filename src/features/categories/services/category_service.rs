use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryResponseDto, CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::repositories::CategoryRepository;

/// Service for category operations
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// List all categories ordered by name
    pub async fn list(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.categories.list().await?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<CategoryResponseDto>> {
        Ok(self.categories.find_by_id(id).await?.map(|c| c.into()))
    }

    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        if self.categories.find_by_name(&dto.name).await?.is_some() {
            return Err(AppError::CategoryAlreadyExists);
        }

        let category = self.categories.create(&dto.name).await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category.into())
    }

    pub async fn update(&self, id: &str, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        if self.categories.find_by_id(id).await?.is_none() {
            return Err(AppError::CategoryNotFound);
        }

        if let Some(existing) = self.categories.find_by_name(&dto.name).await? {
            if existing.id != id {
                return Err(AppError::CategoryAlreadyExists);
            }
        }

        self.categories
            .update(id, &dto.name)
            .await?
            .map(|c| c.into())
            .ok_or(AppError::CategoryNotFound)
    }

    /// Refuses while any movie still references the category.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.categories.find_by_id(id).await?.is_none() {
            return Err(AppError::CategoryNotFound);
        }

        if self.categories.count_movies(id).await? > 0 {
            return Err(AppError::CategoryHasMovies);
        }

        if !self.categories.delete(id).await? {
            return Err(AppError::CategoryNotFound);
        }

        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
