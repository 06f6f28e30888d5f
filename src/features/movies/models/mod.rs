pub mod movie;
pub mod watched_movie;

pub use movie::{
    Movie, MovieChanges, MovieFilter, MovieRecord, MovieSort, NewMovie, SortField, SortOrder,
};
pub use watched_movie::{WatchedMovie, WatchedMovieEntry, WatchedMovieRecord};
