//! Post listings, detail page and post management.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use blogicum_core::domain::Post;
use blogicum_core::forms::{CommentForm, FormErrors, INVALID_CHOICE, ImageChange, PostDraft, PostForm};
use blogicum_core::policy::{can_modify, can_view_post};
use blogicum_core::query::{PageRequest, PostFilter, PostOrder};

use super::extract::{FormBody, PageQuery};
use super::response::{INDEX_URL, post_url, profile_url, redirect, render, render_invalid};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const POST_FORM_TEMPLATE: &str = "blog/postadd.html";

fn post_not_found(post_id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {post_id} not found"))
}

/// GET / - published posts, oldest first.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::parse(query.page.as_deref(), state.site.posts_per_page)?;
    let posts = state
        .posts
        .list(&PostFilter::published(Utc::now()), PostOrder::PublishedAsc, page)
        .await?;

    render(&state, "blog/index.html", json!({ "page_obj": posts }))
}

/// GET /category/{category_slug}/ - published posts of a published category.
pub async fn category(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| AppError::NotFound(format!("Category {slug} not found")))?;

    let page = PageRequest::parse(query.page.as_deref(), state.site.posts_per_page)?;
    let filter = PostFilter::published(Utc::now()).in_category(category.id);
    let posts = state
        .posts
        .list(&filter, PostOrder::PublishedAsc, page)
        .await?;

    render(
        &state,
        "blog/category.html",
        json!({ "category": category, "page_obj": posts }),
    )
}

/// GET /posts/{post_id}/
///
/// Hidden posts are visible to their author only.
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let card = state
        .posts
        .find_card(post_id)
        .await?
        .filter(|card| {
            can_view_post(
                viewer.user_id(),
                &card.post,
                card.category.as_ref(),
                Utc::now(),
            )
        })
        .ok_or_else(|| post_not_found(post_id))?;

    let comments = state.comments.list_for_post(post_id).await?;

    render(
        &state,
        "blog/detail.html",
        json!({ "post": card, "form": CommentForm::default(), "comments": comments }),
    )
}

/// Post form page; `errors` switches it to the 422 re-render.
async fn post_form_page(
    state: &AppState,
    form: &PostForm,
    post: Option<&Post>,
    errors: Option<FormErrors>,
) -> AppResult<HttpResponse> {
    let categories = state.categories.list_all().await?;
    let locations = state.locations.list_all().await?;
    let context = json!({
        "form": form,
        "errors": errors.clone().unwrap_or_default(),
        "post": post,
        "categories": categories,
        "locations": locations,
    });

    match errors {
        Some(_) => render_invalid(state, POST_FORM_TEMPLATE, context),
        None => render(state, POST_FORM_TEMPLATE, context),
    }
}

/// Validate the form and check that the chosen category and location exist.
async fn validate_post(state: &AppState, form: &PostForm) -> AppResult<PostDraft> {
    let draft = form.validate()?;

    let mut errors = FormErrors::new();
    if let Some(id) = draft.category_id {
        if state.categories.find_by_id(id).await?.is_none() {
            errors.add("category", INVALID_CHOICE);
        }
    }
    if let Some(id) = draft.location_id {
        if state.locations.find_by_id(id).await?.is_none() {
            errors.add("location", INVALID_CHOICE);
        }
    }

    errors.into_result(draft).map_err(AppError::from)
}

/// Owned post or the redirect a non-owner gets.
async fn owned_post(
    state: &AppState,
    identity: &Identity,
    post_id: Uuid,
) -> AppResult<Result<Post, HttpResponse>> {
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| post_not_found(post_id))?;

    if can_modify(identity.user_id, &post) {
        Ok(Ok(post))
    } else {
        tracing::warn!(%post_id, user_id = %identity.user_id, "Post change by non-author refused");
        Ok(Err(redirect(post_url(post_id))))
    }
}

/// Best-effort removal of a replaced or orphaned image.
async fn discard_image(state: &AppState, path: &str) {
    if let Err(e) = state.images.delete(path).await {
        tracing::warn!(error = %e, %path, "Failed to remove post image");
    }
}

/// Save `post`, removing a freshly stored image when the row is rejected.
async fn save_post(state: &AppState, post: Post, uploaded: Option<&str>) -> AppResult<Post> {
    match state.posts.save(post).await {
        Ok(post) => Ok(post),
        Err(e) => {
            if let Some(path) = uploaded {
                discard_image(state, path).await;
            }
            Err(e.into())
        }
    }
}

/// GET /posts/create/
pub async fn create_form(
    _identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    post_form_page(&state, &PostForm::default(), None, None).await
}

/// POST /posts/create/
pub async fn create(
    identity: Identity,
    state: web::Data<AppState>,
    body: FormBody<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let draft = match validate_post(&state, &form).await {
        Ok(draft) => draft,
        Err(AppError::Validation(errors)) => {
            return post_form_page(&state, &form, None, Some(errors)).await;
        }
        Err(e) => return Err(e),
    };

    let uploaded = match &draft.image {
        ImageChange::Replace(upload) => Some(state.images.save(upload).await?),
        ImageChange::Keep | ImageChange::Clear => None,
    };
    let mut post = draft.into_post(identity.user_id);
    post.image = uploaded.clone();

    let post = save_post(&state, post, uploaded.as_deref()).await?;
    tracing::info!(post_id = %post.id, author_id = %identity.user_id, "Post created");

    Ok(redirect(INDEX_URL))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = match owned_post(&state, &identity, path.into_inner()).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    post_form_page(&state, &PostForm::from_post(&post), Some(&post), None).await
}

/// POST /posts/{post_id}/edit/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: FormBody<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = match owned_post(&state, &identity, path.into_inner()).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let form = body.into_inner();
    let draft = match validate_post(&state, &form).await {
        Ok(draft) => draft,
        Err(AppError::Validation(errors)) => {
            return post_form_page(&state, &form, Some(&post), Some(errors)).await;
        }
        Err(e) => return Err(e),
    };

    draft.apply_to(&mut post);
    let mut uploaded = None;
    let replaced = match &draft.image {
        ImageChange::Keep => None,
        ImageChange::Clear => post.image.take(),
        ImageChange::Replace(upload) => {
            let stored = state.images.save(upload).await?;
            uploaded = Some(stored.clone());
            post.image.replace(stored)
        }
    };

    let post = save_post(&state, post, uploaded.as_deref()).await?;
    if let Some(old) = replaced {
        discard_image(&state, &old).await;
    }
    tracing::info!(post_id = %post.id, "Post updated");

    Ok(redirect(post_url(post.id)))
}

/// GET /posts/{post_id}/delete/ - confirmation page.
pub async fn delete_confirm(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = match owned_post(&state, &identity, path.into_inner()).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    render(
        &state,
        POST_FORM_TEMPLATE,
        json!({ "form": PostForm::from_post(&post), "post": post }),
    )
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = match owned_post(&state, &identity, path.into_inner()).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    state.posts.delete(post.id).await?;
    if let Some(image) = &post.image {
        discard_image(&state, image).await;
    }
    tracing::info!(post_id = %post.id, "Post deleted");

    let author = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(redirect(profile_url(&author.username)))
}
