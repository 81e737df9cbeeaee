use accounts_api::{
    models::Role,
    repositories::user_repository::SqliteUserRepository,
    services::{
        auth_service::{AuthService, AuthServiceError, LoginRequest},
        user_service::{CreateUserRequest, UserService},
        SystemClock,
    },
    test_utils::test_helpers,
};
use std::sync::Arc;

async fn services() -> (UserService, AuthService) {
    // Create isolated test database
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let user_service = UserService::new(repository.clone(), Arc::new(SystemClock));
    let auth_service = AuthService::new(repository);
    (user_service, auth_service)
}

fn request(email: &str, password: &str, is_active: bool) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        user_name: "auth-tester".to_string(),
        password: password.to_string(),
        role: Role::User,
        mobile_number: None,
        is_active,
        is_staff: false,
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_authenticate_success() {
    let (user_service, auth_service) = services().await;

    let created_user = user_service
        .create_user(request("auth@example.com", "correctpassword", true))
        .await
        .unwrap();

    let authenticated_user = auth_service
        .authenticate(login("auth@example.com", "correctpassword"))
        .await
        .unwrap();
    assert_eq!(authenticated_user.id, created_user.id);
    assert_eq!(authenticated_user.email, "auth@example.com");
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let (user_service, auth_service) = services().await;

    user_service
        .create_user(request("wrongpass@example.com", "correctpassword", true))
        .await
        .unwrap();

    let result = auth_service
        .authenticate(login("wrongpass@example.com", "wrongpassword"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_authenticate_nonexistent_user() {
    let (_, auth_service) = services().await;

    let result = auth_service
        .authenticate(login("nonexistent@example.com", "anypassword"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_authenticate_inactive_user() {
    let (user_service, auth_service) = services().await;

    user_service
        .create_user(request("inactive@example.com", "correctpassword", false))
        .await
        .unwrap();

    let result = auth_service
        .authenticate(login("inactive@example.com", "correctpassword"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::Inactive)));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let (user_service, auth_service) = services().await;

    let created_user = user_service
        .create_user(request("byid@example.com", "correctpassword", true))
        .await
        .unwrap();

    let found = auth_service.get_user_by_id(created_user.id).await.unwrap();
    assert_eq!(found.email, "byid@example.com");

    let missing = auth_service.get_user_by_id(created_user.id + 100).await;
    assert!(matches!(missing, Err(AuthServiceError::UserNotFound)));
}
