use crate::models::user::User;
use crate::repositories::user_repository::UserRepository;
use crate::services::password;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is not active")]
    Inactive,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] crate::repositories::user_repository::RepositoryError),
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// Succeeds iff the email exists, the password matches and the account is active.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AuthServiceError> {
        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !password::verify_password(&request.password, &user.password_hash) {
            tracing::debug!(user_id = user.id, "login rejected: password mismatch");
            return Err(AuthServiceError::InvalidCredentials);
        }

        // Checked after the password so inactivity is not revealed to guessers.
        if !user.is_active {
            tracing::debug!(user_id = user.id, "login rejected: account inactive");
            return Err(AuthServiceError::Inactive);
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<User, AuthServiceError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}
