use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::categories::repositories::CategoryRepository;
use crate::features::movies::dtos::{
    CreateMovieDto, MovieQueryParams, MovieResponseDto, NewReleaseDto, UpdateMovieDto,
    UserWatchedMoviesDto,
};
use crate::features::movies::models::{MovieChanges, NewMovie};
use crate::features::movies::repositories::MovieRepository;
use crate::shared::constants::NEW_RELEASE_WINDOW_DAYS;
use crate::shared::pagination::{PageParams, Paginated};
use crate::shared::validation::parse_release_date;

/// Service for movie operations and the watched-movie relation
pub struct MovieService {
    movies: Arc<dyn MovieRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self { movies, categories }
    }

    /// Filtered, sorted and paginated listing
    pub async fn list(&self, params: &MovieQueryParams) -> Result<Paginated<MovieResponseDto>> {
        let page = PageParams::normalize(params.page, params.limit);
        let filter = params.filter();

        let (movies, total) = tokio::try_join!(
            self.movies.list(&filter, params.sort(), page),
            self.movies.count(&filter)
        )?;

        Ok(Paginated::new(
            movies.into_iter().map(MovieResponseDto::from).collect(),
            page.page,
            page.limit,
            total,
        ))
    }

    pub async fn get(&self, id: &str) -> Result<Option<MovieResponseDto>> {
        Ok(self.movies.find_by_id(id).await?.map(|m| m.into()))
    }

    pub async fn create(&self, dto: CreateMovieDto) -> Result<MovieResponseDto> {
        let release_date = release_date(&dto.release_date)?;

        if self.categories.find_by_id(&dto.category_id).await?.is_none() {
            return Err(AppError::CategoryNotFound);
        }

        let movie = self
            .movies
            .create(NewMovie {
                title: dto.title,
                description: dto.description,
                release_date,
                duration: dto.duration,
                rating: dto.rating,
                category_id: dto.category_id,
            })
            .await?;

        tracing::info!(movie_id = %movie.id, "Movie created");
        Ok(movie.into())
    }

    pub async fn update(&self, id: &str, dto: UpdateMovieDto) -> Result<MovieResponseDto> {
        let release_date = dto.release_date.as_deref().map(release_date).transpose()?;

        if self.movies.find_by_id(id).await?.is_none() {
            return Err(AppError::MovieNotFound);
        }

        if let Some(category_id) = dto.category_id.as_deref() {
            if self.categories.find_by_id(category_id).await?.is_none() {
                return Err(AppError::CategoryNotFound);
            }
        }

        let changes = MovieChanges {
            title: dto.title,
            description: dto.description,
            release_date,
            duration: dto.duration,
            rating: dto.rating,
            category_id: dto.category_id,
        };

        self.movies
            .update(id, changes)
            .await?
            .map(|m| m.into())
            .ok_or(AppError::MovieNotFound)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.movies.delete(id).await? {
            return Err(AppError::MovieNotFound);
        }

        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }

    /// Movies released in the last three weeks, newest first
    pub async fn new_releases(&self) -> Result<Vec<NewReleaseDto>> {
        self.new_releases_at(Utc::now()).await
    }

    pub(crate) async fn new_releases_at(&self, now: DateTime<Utc>) -> Result<Vec<NewReleaseDto>> {
        let cutoff = now - Duration::days(NEW_RELEASE_WINDOW_DAYS);
        let movies = self.movies.released_since(cutoff).await?;
        Ok(movies.into_iter().map(NewReleaseDto::from).collect())
    }

    /// Records the watch, or refreshes the timestamp when already watched.
    pub async fn mark_watched(&self, user_id: &str, movie_id: &str) -> Result<()> {
        if self.movies.find_by_id(movie_id).await?.is_none() {
            return Err(AppError::MovieNotFound);
        }

        let watched = self
            .movies
            .mark_watched(user_id, movie_id, Utc::now())
            .await?;

        tracing::debug!(
            user_id = %watched.user_id,
            movie_id = %watched.movie_id,
            "Movie marked as watched"
        );
        Ok(())
    }

    /// The caller, with every movie they have watched
    pub async fn users_watched(&self, user: AuthenticatedUser) -> Result<Vec<UserWatchedMoviesDto>> {
        let watched = self.movies.list_watched(&user.id).await?;

        Ok(vec![UserWatchedMoviesDto {
            user: user.into(),
            watched_movies: watched.into_iter().map(|w| w.into()).collect(),
        }])
    }
}

fn release_date(value: &str) -> Result<DateTime<Utc>> {
    parse_release_date(value).ok_or_else(|| {
        AppError::validation(
            "releaseDate",
            "Release date must be a valid date",
            "invalid_date",
        )
    })
}
