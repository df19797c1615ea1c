//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod comments;
mod extract;
mod health;
mod posts;
mod profile;
mod response;


use actix_web::{HttpRequest, HttpResponse, web};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    // Blog
    .route("/", web::get().to(posts::index))
    .service(
        web::resource("/posts/create/")
            .route(web::get().to(posts::create_form))
            .route(web::post().to(posts::create)),
    )
    .route("/posts/{post_id}/", web::get().to(posts::detail))
    .service(
        web::resource("/posts/{post_id}/edit/")
            .route(web::get().to(posts::edit_form))
            .route(web::post().to(posts::edit)),
    )
    .service(
        web::resource("/posts/{post_id}/delete/")
            .route(web::get().to(posts::delete_confirm))
            .route(web::post().to(posts::delete)),
    )
    .route("/posts/{post_id}/comment/", web::post().to(comments::add))
    .service(
        web::resource("/posts/{post_id}/edit_comment/{comment_id}/")
            .route(web::get().to(comments::edit_form))
            .route(web::post().to(comments::edit)),
    )
    .service(
        web::resource("/posts/{post_id}/delete_comment/{comment_id}/")
            .route(web::get().to(comments::delete_confirm))
            .route(web::post().to(comments::delete)),
    )
    .route("/category/{category_slug}/", web::get().to(posts::category))
    .route("/profile/{username}/", web::get().to(profile::show))
    .service(
        web::resource("/edit_profile/")
            .route(web::get().to(profile::edit_form))
            .route(web::post().to(profile::edit)),
    )
    // Session
    .service(
        web::scope("/auth")
            .wrap(RateLimitMiddleware)
            .service(
                web::resource("/registration/")
                    .route(web::get().to(auth::registration_form))
                    .route(web::post().to(auth::register)),
            )
            .service(
                web::resource("/login/")
                    .route(web::get().to(auth::login_form))
                    .route(web::post().to(auth::login)),
            )
            .route("/logout/", web::post().to(auth::logout)),
    )
    // Category and location management
    .service(
        web::scope("/admin")
            .service(
                web::resource("/categories/")
                    .route(web::get().to(admin::list_categories))
                    .route(web::post().to(admin::create_category)),
            )
            .route("/categories/{id}/", web::post().to(admin::update_category))
            .route(
                "/categories/{id}/delete/",
                web::post().to(admin::delete_category),
            )
            .service(
                web::resource("/locations/")
                    .route(web::get().to(admin::list_locations))
                    .route(web::post().to(admin::create_location)),
            )
            .route("/locations/{id}/", web::post().to(admin::update_location))
            .route(
                "/locations/{id}/delete/",
                web::post().to(admin::delete_location),
            ),
    )
    .default_service(web::to(not_found));
}

/// Fallback for unknown routes.
async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("No route for {}", req.path())))
}
