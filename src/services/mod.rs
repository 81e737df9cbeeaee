pub mod account_service;
pub mod auth_service;
pub mod email_service;
pub mod password;
pub mod token_gate;
pub mod user_service;

pub use account_service::{AccountError, AccountService, RegisterRequest, ResetPasswordRequest};
pub use auth_service::{AuthService, AuthServiceError, LoginRequest};
pub use email_service::{create_email_service, EmailError, EmailService, MockEmailService};
pub use token_gate::{Clock, FixedClock, SystemClock, TokenError, TokenPolicy};
pub use user_service::{UserService, UserServiceError};
