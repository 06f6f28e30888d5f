use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::{AuthenticatedUser, NewUser, TokenIdentity};
use crate::features::auth::repositories::UserRepository;
use crate::features::auth::services::password_service::PasswordService;
use crate::features::auth::services::token_service::{TokenError, TokenService};

/// Service for registration, login and per-request token resolution
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    passwords: PasswordService,
    // Compared against when the email is unknown so both login failures cost the same
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        passwords: PasswordService,
    ) -> Self {
        Self {
            users,
            tokens,
            passwords,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Register a new user. The email pre-check only improves the error; the
    /// unique constraint in the store has the final word.
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<()> {
        if self.users.find_by_email(&dto.email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = self.passwords.hash(&dto.password).await?;

        let user = self
            .users
            .create(NewUser {
                email: dto.email,
                password_hash,
                name: dto.name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(())
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let Some(user) = self.users.find_by_email(&dto.email).await? else {
            let decoy = self.decoy_hash().await?;
            self.passwords.verify(&dto.password, decoy).await?;
            return Err(AppError::InvalidCredentials);
        };

        if !self.passwords.verify(&dto.password, &user.password).await? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&TokenIdentity {
                user_id: user.id.clone(),
                email: user.email.clone(),
            })
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AuthResponseDto {
            user: user.into(),
            token,
        })
    }

    /// Resolve a bearer token to a live user.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|e: TokenError| AppError::InvalidToken(e.to_string()))?;

        self.users
            .find_by_id(&claims.user_id)
            .await?
            .map(AuthenticatedUser::from)
            .ok_or_else(|| AppError::InvalidToken("User not found".to_string()))
    }

    async fn decoy_hash(&self) -> Result<&String> {
        self.decoy_hash
            .get_or_try_init(|| self.passwords.hash("decoy-password-never-matches"))
            .await
    }
}
