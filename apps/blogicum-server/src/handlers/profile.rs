//! Profile page and profile editing.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;

use blogicum_core::domain::User;
use blogicum_core::error::RepoError;
use blogicum_core::forms::{FormErrors, ProfileForm};
use blogicum_core::query::{PageRequest, PostFilter, PostOrder};

use super::extract::{FormBody, PageQuery};
use super::response::{profile_url, redirect, render, render_invalid};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const PROFILE_FORM_TEMPLATE: &str = "blog/user.html";
pub(super) const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// GET /profile/{username}/ - the user's posts, newest first.
///
/// The owner also sees drafts and scheduled posts; everyone else gets the
/// publication gate.
pub async fn show(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let profile = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {username} not found")))?;

    let filter = if viewer.user_id() == Some(profile.id) {
        PostFilter::all()
    } else {
        PostFilter::published(Utc::now())
    }
    .by_author(profile.id);

    let page = PageRequest::parse(query.page.as_deref(), state.site.posts_per_page)?;
    let posts = state
        .posts
        .list(&filter, PostOrder::PublishedDesc, page)
        .await?;

    render(
        &state,
        "blog/profile.html",
        json!({ "profile": profile, "page_obj": posts }),
    )
}

/// The requester's own account.
async fn current_user(state: &AppState, identity: &Identity) -> AppResult<User> {
    state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// GET /edit_profile/
pub async fn edit_form(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = current_user(&state, &identity).await?;

    render(
        &state,
        PROFILE_FORM_TEMPLATE,
        json!({ "form": ProfileForm::from_user(&user) }),
    )
}

/// POST /edit_profile/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    body: FormBody<ProfileForm>,
) -> AppResult<HttpResponse> {
    let mut user = current_user(&state, &identity).await?;
    let form = body.into_inner();

    let invalid = |errors: FormErrors| {
        render_invalid(
            &state,
            PROFILE_FORM_TEMPLATE,
            json!({ "form": &form, "errors": errors }),
        )
    };

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return invalid(errors),
    };

    if draft.username != user.username {
        if let Some(other) = state.users.find_by_username(&draft.username).await? {
            if other.id != user.id {
                return invalid(FormErrors::single("username", USERNAME_TAKEN));
            }
        }
    }

    draft.apply_to(&mut user);
    let user = match state.users.save(user).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            return invalid(FormErrors::single("username", USERNAME_TAKEN));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(redirect(profile_url(&user.username)))
}
