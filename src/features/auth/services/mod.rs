pub mod auth_service;
pub mod password_service;
pub mod token_service;

pub use auth_service::AuthService;
pub use password_service::PasswordService;
pub use token_service::TokenService;
