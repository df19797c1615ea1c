//! Category and location management for admins.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::forms::{CategoryForm, LocationForm};
use blogicum_shared::ApiResponse;

use super::extract::FormBody;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Refuse a slug already used by another category.
async fn ensure_slug_free(state: &AppState, slug: &str, own_id: Option<Uuid>) -> AppResult<()> {
    match state.categories.find_by_slug(slug).await? {
        Some(other) if Some(other.id) != own_id => Err(AppError::Conflict(format!(
            "Category with slug {slug} already exists"
        ))),
        _ => Ok(()),
    }
}

/// GET /admin/categories/
pub async fn list_categories(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let categories = state.categories.list_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(categories)))
}

/// POST /admin/categories/
pub async fn create_category(
    identity: Identity,
    state: web::Data<AppState>,
    body: FormBody<CategoryForm>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let draft = body.into_inner().validate()?;
    ensure_slug_free(&state, &draft.slug, None).await?;

    let category = state.categories.save(draft.into_category()).await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(category)))
}

/// POST /admin/categories/{id}/
pub async fn update_category(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: FormBody<CategoryForm>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let id = path.into_inner();
    let mut category = state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {id} not found")))?;

    let draft = body.into_inner().validate()?;
    ensure_slug_free(&state, &draft.slug, Some(id)).await?;
    draft.apply_to(&mut category);

    let category = state.categories.save(category).await?;
    tracing::info!(category_id = %id, "Category updated");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(category)))
}

/// POST /admin/categories/{id}/delete/ - posts keep existing, uncategorized.
pub async fn delete_category(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let id = path.into_inner();
    state.categories.delete(id).await?;
    tracing::info!(category_id = %id, "Category deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /admin/locations/
pub async fn list_locations(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let locations = state.locations.list_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(locations)))
}

/// POST /admin/locations/
pub async fn create_location(
    identity: Identity,
    state: web::Data<AppState>,
    body: FormBody<LocationForm>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let draft = body.into_inner().validate()?;

    let location = state.locations.save(draft.into_location()).await?;
    tracing::info!(location_id = %location.id, "Location created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(location)))
}

/// POST /admin/locations/{id}/
pub async fn update_location(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: FormBody<LocationForm>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let id = path.into_inner();
    let mut location = state
        .locations
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {id} not found")))?;

    body.into_inner().validate()?.apply_to(&mut location);
    let location = state.locations.save(location).await?;
    tracing::info!(location_id = %id, "Location updated");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(location)))
}

/// POST /admin/locations/{id}/delete/
pub async fn delete_location(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    identity.require_admin()?;
    let id = path.into_inner();
    state.locations.delete(id).await?;
    tracing::info!(location_id = %id, "Location deleted");

    Ok(HttpResponse::NoContent().finish())
}
