//! Session identity extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};
use uuid::Uuid;

use blogicum_core::ports::TokenClaims;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// The session token is read from `Authorization: Bearer <token>` or from the
/// session cookie. Without a valid token the request is redirected to the
/// login page with `next` pointing back at it:
/// ```ignore
/// async fn create_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the user has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Fail with Forbidden unless the identity carries the `admin` role.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.has_role("admin") {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, "Admin role required");
            Err(AppError::Forbidden)
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

fn session_token(req: &HttpRequest, state: &AppState) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    bearer.or_else(|| {
        req.cookie(&state.site.session_cookie_name)
            .map(|cookie| cookie.value().to_owned())
    })
}

fn authenticate(req: &HttpRequest) -> Option<Identity> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return None;
    };

    let token = session_token(req, state)?;
    match state.tokens.validate_token(&token) {
        Ok(claims) => Some(Identity::from(claims)),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            None
        }
    }
}

/// Login URL that sends the user back to this request afterwards.
fn login_redirect(req: &HttpRequest) -> AppError {
    let login_url = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.site.login_url.clone())
        .unwrap_or_else(|| "/auth/login/".to_string());

    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();

    AppError::LoginRequired(format!("{login_url}?{query}"))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).ok_or_else(|| login_redirect(req)))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req))))
    }
}
