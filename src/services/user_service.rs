use crate::models::user::{NewUser, Role, User};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::services::password;
use crate::services::token_gate::Clock;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // Local part, '@', and a domain with at least one dot.
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password too weak (minimum 6 characters)")]
    WeakPassword,
    #[error("User name is required")]
    MissingUserName,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

impl From<password::HashingError> for UserServiceError {
    fn from(err: password::HashingError) -> Self {
        UserServiceError::HashingError(err.0)
    }
}

pub struct CreateUserRequest {
    pub email: String,
    pub user_name: String,
    pub password: String,
    pub role: Role,
    pub mobile_number: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
}

pub struct UpdatePasswordRequest {
    pub user_id: i64,
    pub new_password: String,
}

pub fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if email.is_empty() || email.len() > 255 || email.contains("..") {
        return Err(UserServiceError::InvalidEmail);
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(UserServiceError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if !password::is_strong_enough(password) {
        return Err(UserServiceError::WeakPassword);
    }
    Ok(())
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Creates a user carrying a freshly issued verification token.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        let email = request.email.trim().to_string();
        validate_email(&email)?;

        let user_name = request.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(UserServiceError::MissingUserName);
        }

        validate_password(&request.password)?;
        let password_hash = password::hash_password(&request.password)?;

        let new_user = NewUser {
            email,
            user_name,
            password_hash,
            role: request.role,
            is_active: request.is_active,
            is_staff: request.is_staff,
            mobile_number: request.mobile_number.filter(|m| !m.trim().is_empty()),
            verification_token: Some(Uuid::new_v4().to_string()),
            token_creation_date: self.clock.now(),
        };

        match self.repository.create_user(&new_user).await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, role = %user.role, "user created");
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.repository.delete_user(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Activates without a token. Used by administrators.
    pub async fn activate_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.repository.activate(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn update_password(
        &self,
        request: UpdatePasswordRequest,
    ) -> Result<(), UserServiceError> {
        validate_password(&request.new_password)?;
        let password_hash = password::hash_password(&request.new_password)?;

        match self
            .repository
            .update_password(request.user_id, &password_hash)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        password::verify_password(password, password_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::services::token_gate::FixedClock;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::*;

    fn request(email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            user_name: "tester".to_string(),
            password: password.to_string(),
            role: Role::User,
            mobile_number: None,
            is_active: false,
            is_staff: false,
        }
    }

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("testuser@test.py").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("testuser@test").is_err());
        assert!(validate_email("Invalid email").is_err());
        assert!(validate_email("a..b@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut mock_repo = MockUserRepository::new();
        let clock = fixed_clock();
        let issued_at = clock.now();

        mock_repo
            .expect_create_user()
            .withf(move |user: &NewUser| {
                user.email == "test@example.com"
                    && user.password_hash.starts_with("$argon2")
                    && user.verification_token.is_some()
                    && user.token_creation_date == issued_at
                    && !user.is_active
            })
            .times(1)
            .returning(move |user| {
                let created = User {
                    id: 1,
                    email: user.email.clone(),
                    user_name: user.user_name.clone(),
                    password_hash: user.password_hash.clone(),
                    role: user.role,
                    is_active: user.is_active,
                    is_staff: user.is_staff,
                    mobile_number: user.mobile_number.clone(),
                    verification_token: user.verification_token.clone(),
                    token_creation_date: user.token_creation_date,
                    date_joined: user.token_creation_date,
                };
                Box::pin(async move { Ok(created) })
            });

        let service = UserService::new(Arc::new(mock_repo), clock);
        let user = service
            .create_user(request("  test@example.com ", "password123"))
            .await
            .expect("Expected Ok result");
        assert_eq!(user.email, "test@example.com");
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn test_create_user_weak_password() {
        let service = UserService::new(Arc::new(MockUserRepository::new()), fixed_clock());
        let result = service
            .create_user(request("test@example.com", "short"))
            .await;
        assert!(matches!(result, Err(UserServiceError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_create_user_invalid_email() {
        let service = UserService::new(Arc::new(MockUserRepository::new()), fixed_clock());
        let result = service
            .create_user(request("Invalid email", "password123"))
            .await;
        assert!(matches!(result, Err(UserServiceError::InvalidEmail)));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_maps_to_email_taken() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_create_user()
            .times(1)
            .returning(|_| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let service = UserService::new(Arc::new(mock_repo), fixed_clock());
        let result = service
            .create_user(request("taken@example.com", "password123"))
            .await;
        assert!(matches!(result, Err(UserServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_delete_user()
            .with(eq(42))
            .times(1)
            .returning(|_| Box::pin(async move { Err(RepositoryError::NotFound) }));

        let service = UserService::new(Arc::new(mock_repo), fixed_clock());
        let result = service.delete_user(42).await;
        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }
}
