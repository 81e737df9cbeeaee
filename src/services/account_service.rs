use crate::models::user::{Role, User};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::email_service::{EmailError, EmailService};
use crate::services::password;
use crate::services::token_gate::{Clock, TokenError, TokenPolicy};
use crate::services::user_service::{CreateUserRequest, UserService, UserServiceError};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Token not found")]
    TokenNotFound,
    #[error("Token expired")]
    TokenExpired,
    #[error("User not found")]
    UserNotFound,
    #[error("{0}")]
    User(#[from] UserServiceError),
    #[error("Email error: {0}")]
    Email(#[from] EmailError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AccountError::TokenExpired,
        }
    }
}

impl From<password::HashingError> for AccountError {
    fn from(err: password::HashingError) -> Self {
        AccountError::User(err.into())
    }
}

pub struct RegisterRequest {
    pub email: String,
    pub user_name: String,
    pub password: String,
    pub role: Role,
    pub mobile_number: Option<String>,
}

pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Drives the account lifecycle: registration, activation, token reissue and
/// password reset. Every token-bearing operation goes through `TokenPolicy`.
pub struct AccountService {
    user_repository: Arc<dyn UserRepository>,
    user_service: Arc<UserService>,
    email_service: Arc<dyn EmailService>,
    policy: TokenPolicy,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        user_service: Arc<UserService>,
        email_service: Arc<dyn EmailService>,
        policy: TokenPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            user_service,
            email_service,
            policy,
            clock,
        }
    }

    /// Creates an inactive account and mails its activation token.
    ///
    /// A failed delivery is logged but does not undo the registration; the
    /// user can ask for a new token through `resend_activation_token`.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AccountError> {
        let user = self
            .user_service
            .create_user(CreateUserRequest {
                email: request.email,
                user_name: request.user_name,
                password: request.password,
                role: request.role,
                mobile_number: request.mobile_number,
                is_active: false,
                is_staff: false,
            })
            .await?;

        tracing::info!(user_id = user.id, "account registered");

        if let Some(token) = user.verification_token.as_deref() {
            if let Err(e) = self
                .email_service
                .send_activation_email(&user.email, token)
                .await
            {
                tracing::error!(user_id = user.id, "Failed to send activation email: {}", e);
            }
        }

        Ok(user)
    }

    /// Checks that a token exists and is fresh. No side effects.
    pub async fn verify_token(&self, token: &str) -> Result<User, AccountError> {
        self.load_fresh_token_owner(token).await
    }

    /// Activates the token's owner and consumes the token.
    pub async fn activate(&self, token: &str) -> Result<User, AccountError> {
        let mut user = self.load_fresh_token_owner(token).await?;

        // The write re-checks the token; a concurrent reissue or use makes it miss.
        match self
            .user_repository
            .activate_with_token(user.id, token.trim())
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(AccountError::TokenNotFound),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = user.id, "account activated");
        user.is_active = true;
        user.verification_token = None;
        Ok(user)
    }

    /// Issues a new token and mails a password reset link.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let (user, token) = self.reissue_token(email).await?;
        self.email_service
            .send_password_reset_email(&user.email, &token)
            .await?;
        tracing::info!(user_id = user.id, "password reset token issued");
        Ok(())
    }

    /// Issues a new token and mails a fresh activation link.
    pub async fn resend_activation_token(&self, email: &str) -> Result<(), AccountError> {
        let (user, token) = self.reissue_token(email).await?;
        self.email_service
            .send_activation_email(&user.email, &token)
            .await?;
        tracing::info!(user_id = user.id, "activation token reissued");
        Ok(())
    }

    /// Replaces the password of the token's owner and consumes the token.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AccountError> {
        let user = self.load_fresh_token_owner(&request.token).await?;

        crate::services::user_service::validate_password(&request.password)?;
        let password_hash = password::hash_password(&request.password)?;

        match self
            .user_repository
            .reset_password(user.id, request.token.trim(), &password_hash)
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = user.id, "password reset");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(AccountError::TokenNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Clears every token older than the TTL. Returns how many were cleared.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AccountError> {
        let cutoff = self.policy.cutoff(self.clock.now());
        let cleared = self.user_repository.clear_tokens_issued_before(cutoff).await?;
        if cleared > 0 {
            tracing::info!(cleared, "purged expired tokens");
        }
        Ok(cleared)
    }

    async fn load_fresh_token_owner(&self, token: &str) -> Result<User, AccountError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AccountError::TokenNotFound);
        }

        let user = self
            .user_repository
            .find_by_verification_token(token)
            .await?
            .ok_or(AccountError::TokenNotFound)?;

        if let Err(e) = self
            .policy
            .check(user.token_creation_date, self.clock.now())
        {
            tracing::debug!(user_id = user.id, "token rejected: {}", e);
            return Err(e.into());
        }

        Ok(user)
    }

    async fn reissue_token(&self, email: &str) -> Result<(User, String), AccountError> {
        let user = self
            .user_repository
            .find_by_email(email.trim())
            .await?
            .ok_or(AccountError::UserNotFound)?;

        let token = Uuid::new_v4().to_string();
        self.user_repository
            .issue_token(user.id, &token, self.clock.now())
            .await?;

        Ok((user, token))
    }
}
