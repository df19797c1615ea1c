//! Rendering and redirect helpers.

use actix_web::{HttpResponse, http::StatusCode, http::header};
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub const INDEX_URL: &str = "/";

pub fn post_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

/// Render `template` with `context` and a 200 status.
pub fn render(state: &AppState, template: &str, context: Value) -> AppResult<HttpResponse> {
    render_with_status(state, StatusCode::OK, template, context)
}

/// Re-render a form page after failed validation.
pub fn render_invalid(state: &AppState, template: &str, context: Value) -> AppResult<HttpResponse> {
    render_with_status(state, StatusCode::UNPROCESSABLE_ENTITY, template, context)
}

fn render_with_status(
    state: &AppState,
    status: StatusCode,
    template: &str,
    context: Value,
) -> AppResult<HttpResponse> {
    let rendered = state.renderer.render(template, &context)?;
    Ok(HttpResponse::build(status)
        .content_type(rendered.content_type)
        .body(rendered.body))
}

/// 302 to `location`.
pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}
