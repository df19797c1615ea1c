//! Registration and session endpoints.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpResponse, http::header, web};
use serde_json::json;

use blogicum_core::domain::User;
use blogicum_core::error::RepoError;
use blogicum_core::forms::{FormErrors, REQUIRED, RegistrationForm};
use blogicum_shared::dto::{AuthResponse, LoginRequest};

use super::extract::{FormBody, NextQuery};
use super::profile::USERNAME_TAKEN;
use super::response::{INDEX_URL, redirect, render, render_invalid};
use crate::middleware::error::AppResult;
use crate::state::AppState;

const REGISTRATION_TEMPLATE: &str = "registration/registration_form.html";
const LOGIN_TEMPLATE: &str = "registration/login.html";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// GET /auth/registration/
pub async fn registration_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    render(
        &state,
        REGISTRATION_TEMPLATE,
        json!({ "form": RegistrationForm::default() }),
    )
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    body: FormBody<RegistrationForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let invalid = |errors: FormErrors| {
        render_invalid(
            &state,
            REGISTRATION_TEMPLATE,
            json!({ "form": &form, "errors": errors }),
        )
    };

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return invalid(errors),
    };

    if state.users.find_by_username(&draft.username).await?.is_some() {
        return invalid(FormErrors::single("username", USERNAME_TAKEN));
    }

    let password_hash = state.passwords.hash(&draft.password)?;
    let user = User::new(draft.username, draft.email, password_hash);
    let user = match state.users.save(user).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            return invalid(FormErrors::single("username", USERNAME_TAKEN));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = %user.id, "User registered");

    Ok(redirect(INDEX_URL))
}

/// Only same-site absolute paths are followed after login. Browsers read a
/// leading `/\` like `//`, so both count as another host.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path[1..].starts_with(['/', '\\'])
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => INDEX_URL,
    }
}

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    let form = LoginRequest {
        next: query.into_inner().next,
        ..LoginRequest::default()
    };
    render(&state, LOGIN_TEMPLATE, json!({ "form": form }))
}

/// POST /auth/login/ - sets the session cookie and returns the token.
pub async fn login(
    state: web::Data<AppState>,
    body: FormBody<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let invalid = |errors: FormErrors| {
        render_invalid(
            &state,
            LOGIN_TEMPLATE,
            json!({ "form": &req, "errors": errors }),
        )
    };

    let mut errors = FormErrors::new();
    if req.username.trim().is_empty() {
        errors.add("username", REQUIRED);
    }
    if req.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    if !errors.is_empty() {
        return invalid(errors);
    }

    let Some(user) = state.users.find_by_username(req.username.trim()).await? else {
        tracing::debug!("Login for unknown username");
        return invalid(FormErrors::single("__all__", BAD_CREDENTIALS));
    };
    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Login with wrong password");
        return invalid(FormErrors::single("__all__", BAD_CREDENTIALS));
    }

    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())?;
    let expires_in = state.tokens.expiration_seconds();

    let cookie = Cookie::build(state.site.session_cookie_name.clone(), token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(expires_in))
        .finish();

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, safe_next(req.next.as_deref())))
        .cookie(cookie)
        .json(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expires_in.max(0) as u64,
        }))
}

/// POST /auth/logout/
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    let mut cookie = Cookie::build(state.site.session_cookie_name.clone(), "")
        .path("/")
        .finish();
    cookie.make_removal();

    HttpResponse::Found()
        .insert_header((header::LOCATION, INDEX_URL))
        .cookie(cookie)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/posts/create/")), "/posts/create/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/\\/evil.example")), "/");
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/posts/\n")), "/");
        assert_eq!(safe_next(Some("evil.example")), "/");
        assert_eq!(safe_next(Some("/profile/anna/?page=2")), "/profile/anna/?page=2");
        assert_eq!(safe_next(None), "/");
    }
}
