use crate::config::session::SessionLayer;
use crate::handlers;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn build_router(app_state: AppState, session_layer: SessionLayer) -> Router {
    let account_routes = Router::new()
        .route("/verification", post(handlers::verification_handler))
        .route("/activate", post(handlers::activate_handler))
        .route("/register", post(handlers::register_handler))
        .route("/forgot-password", post(handlers::forgot_password_handler))
        .route("/reset-password", post(handlers::reset_password_handler))
        .route(
            "/resend-activation-token",
            post(handlers::resend_activation_token_handler),
        )
        .route("/login", post(handlers::login_handler))
        .route("/logout", post(handlers::logout_handler))
        .route("/me", get(handlers::me_handler));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/faqs", get(handlers::list_faqs_handler))
        .nest("/api/accounts", account_routes)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
