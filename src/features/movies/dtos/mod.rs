pub mod movie_dto;

pub use movie_dto::{
    CreateMovieDto, MarkWatchedDto, MovieQueryParams, MovieResponseDto, NewReleaseDto,
    UpdateMovieDto, UserWatchedMoviesDto, WatchedMovieDto,
};
