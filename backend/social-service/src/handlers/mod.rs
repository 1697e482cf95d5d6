//! HTTP surface. Everything lives under `/api`; all routes except health, signup,
//! login, logout and token refresh require an access-token cookie.
pub mod auth;
pub mod notifications;
pub mod posts;
pub mod users;

use crate::error::AppError;
use crate::state::AppState;
use actix_middleware::JwtAuthMiddleware;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "OK" }))
}

fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "message": text }))
}

/// Mount the API. Malformed ids and bodies are reported in the JSON error envelope.
pub fn register_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let issuer = state.issuer();
    let auth = move || JwtAuthMiddleware::new(issuer.clone());

    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|_, _| AppError::NotFound("Resource not found".into()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            // Post and profile bodies may carry a base64 data URI image
            .limit(state.max_upload_bytes.saturating_mul(2))
            .error_handler(|err, _| AppError::Validation(format!("Invalid request body: {}", err)).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::Validation(format!("Invalid query: {}", err)).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(auth::signup))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/recreate-token", web::post().to(auth::recreate_token))
                    .service(
                        web::resource("/me")
                            .wrap(auth())
                            .route(web::get().to(auth::me)),
                    ),
            )
            .service(
                web::scope("/posts")
                    .wrap(auth())
                    .route("/all", web::get().to(posts::all))
                    .route("/following", web::get().to(posts::following))
                    .route("/likes/{id}", web::get().to(posts::liked_by))
                    .route("/user/{username}", web::get().to(posts::by_username))
                    .route("/create", web::post().to(posts::create))
                    .route("/like/{id}", web::post().to(posts::toggle_like))
                    .route("/reshare/{id}", web::post().to(posts::reshare))
                    .route("/comment/{id}", web::post().to(posts::add_comment))
                    .route("/edit-comment/{id}", web::post().to(posts::edit_comment))
                    .route("/delete-comment/{id}", web::delete().to(posts::delete_comment))
                    .route("/edit/{id}", web::post().to(posts::edit))
                    .route("/delete/{id}", web::delete().to(posts::delete)),
            )
            .service(
                web::scope("/user")
                    .wrap(auth())
                    .route("/profile/{username}", web::get().to(users::profile))
                    .route("/suggested", web::get().to(users::suggested))
                    .route("/search", web::get().to(users::search))
                    .route("/all", web::get().to(users::list_all))
                    .route("/follow/{id}", web::post().to(users::toggle_follow))
                    .route("/update", web::post().to(users::update_profile))
                    .route("/profile-picture", web::put().to(users::update_profile_picture)),
            )
            .service(
                web::scope("/notifications")
                    .wrap(auth())
                    .route("", web::get().to(notifications::list))
                    .route("/unread", web::get().to(notifications::unread_count))
                    .route("/mark-all-read", web::post().to(notifications::mark_all_read))
                    .route("/clear", web::delete().to(notifications::clear_all))
                    .route("/{id}/read", web::patch().to(notifications::mark_read))
                    .route("/{id}", web::delete().to(notifications::delete)),
            ),
    );
}
