use crate::error::Result;
use crate::models::faq::Faq;
use crate::AppState;
use axum::{extract::State, response::Json};

pub async fn list_faqs_handler(State(app_state): State<AppState>) -> Result<Json<Vec<Faq>>> {
    let faqs = app_state.faq_repository.list_faqs().await?;
    Ok(Json(faqs))
}
