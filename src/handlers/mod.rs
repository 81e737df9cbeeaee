pub mod account_handlers;
pub mod faq_handlers;

pub use account_handlers::{
    activate_handler, forgot_password_handler, login_handler, logout_handler, me_handler,
    register_handler, resend_activation_token_handler, reset_password_handler,
    verification_handler,
};
pub use faq_handlers::list_faqs_handler;

pub async fn health_handler() -> &'static str {
    "ok"
}
