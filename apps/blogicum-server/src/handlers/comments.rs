//! Comment creation, editing and deletion.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use blogicum_core::domain::Comment;
use blogicum_core::forms::CommentForm;
use blogicum_core::policy::{can_modify, can_view_post};

use super::extract::FormBody;
use super::response::{post_url, redirect, render, render_invalid};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const COMMENT_TEMPLATE: &str = "blog/comment.html";

/// POST /posts/{post_id}/comment/
///
/// The author and the post come from the session and the route, never from
/// the submitted form.
pub async fn add(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: FormBody<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let card = state
        .posts
        .find_card(post_id)
        .await?
        .filter(|card| {
            can_view_post(
                Some(identity.user_id),
                &card.post,
                card.category.as_ref(),
                Utc::now(),
            )
        })
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;

    let form = body.into_inner();
    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            let comments = state.comments.list_for_post(post_id).await?;
            return render_invalid(
                &state,
                "blog/detail.html",
                json!({ "post": card, "form": form, "errors": errors, "comments": comments }),
            );
        }
    };

    let comment = state
        .comments
        .save(Comment::new(post_id, identity.user_id, text))
        .await?;
    tracing::info!(comment_id = %comment.id, %post_id, "Comment added");

    Ok(redirect(post_url(post_id)))
}

/// Comment under the routed post, owned by the requester.
///
/// A comment belonging to another post is NotFound; someone else's comment
/// is Forbidden.
async fn owned_comment(
    state: &AppState,
    identity: &Identity,
    post_id: Uuid,
    comment_id: Uuid,
) -> AppResult<Comment> {
    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id} not found")))?;

    if !can_modify(identity.user_id, &comment) {
        tracing::warn!(%comment_id, user_id = %identity.user_id, "Comment change by non-author refused");
        return Err(AppError::Forbidden);
    }
    Ok(comment)
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&state, &identity, post_id, comment_id).await?;

    let form = CommentForm {
        text: comment.text.clone(),
    };
    render(
        &state,
        COMMENT_TEMPLATE,
        json!({ "form": form, "comment": comment }),
    )
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: FormBody<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let mut comment = owned_comment(&state, &identity, post_id, comment_id).await?;

    let form = body.into_inner();
    comment.text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            return render_invalid(
                &state,
                COMMENT_TEMPLATE,
                json!({ "form": form, "errors": errors, "comment": comment }),
            );
        }
    };

    state.comments.save(comment).await?;
    tracing::info!(%comment_id, "Comment updated");

    Ok(redirect(post_url(post_id)))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/ - confirmation page.
pub async fn delete_confirm(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&state, &identity, post_id, comment_id).await?;

    render(&state, COMMENT_TEMPLATE, json!({ "comment": comment }))
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    owned_comment(&state, &identity, post_id, comment_id).await?;

    state.comments.delete(comment_id).await?;
    tracing::info!(%comment_id, "Comment deleted");

    Ok(redirect(post_url(post_id)))
}
