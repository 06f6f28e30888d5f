pub mod movie_handler;

pub use movie_handler::{
    __path_create_movie, __path_delete_movie, __path_get_movie, __path_list_movies,
    __path_mark_watched, __path_new_releases, __path_update_movie, __path_users_watched,
    create_movie, delete_movie, get_movie, list_movies, mark_watched, new_releases,
    update_movie, users_watched,
};
