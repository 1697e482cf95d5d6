/// Account handlers: profiles, discovery, follow toggle, profile updates
use actix_middleware::UserId;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::models::{Account, ProfileUpdate};
use crate::domain::views::AccountProfile;
use crate::error::{AppError, Result};
use crate::services::ImageSource;
use crate::state::AppState;

/// Multipart field carrying the new avatar
pub const PROFILE_PICTURE_FIELD: &str = "profilePicture";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

fn profiles(accounts: &[Account]) -> Vec<AccountProfile> {
    accounts.iter().map(AccountProfile::from).collect()
}

/// GET /api/user/profile/{username}
pub async fn profile(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let account = state.accounts.profile(&path).await?;
    Ok(HttpResponse::Ok().json(AccountProfile::from(&account)))
}

/// GET /api/user/suggested
pub async fn suggested(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let accounts = state.accounts.suggested(user.0).await?;
    Ok(HttpResponse::Ok().json(profiles(&accounts)))
}

/// GET /api/user/search?query=
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let accounts = state.accounts.search(&query.query).await?;
    Ok(HttpResponse::Ok().json(profiles(&accounts)))
}

/// GET /api/user/all
pub async fn list_all(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let accounts = state.accounts.list_all(user.0).await?;
    Ok(HttpResponse::Ok().json(profiles(&accounts)))
}

/// POST /api/user/follow/{id}
pub async fn toggle_follow(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state
        .relationships
        .toggle_follow(user.0, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "following": outcome.following,
        "message": outcome.message(),
    })))
}

/// POST /api/user/update
pub async fn update_profile(
    state: web::Data<AppState>,
    user: UserId,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    let account = state
        .accounts
        .update_profile(user.0, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(AccountProfile::from(&account)))
}

/// PUT /api/user/profile-picture
///
/// Expects a single image part named `profilePicture`; other parts are skipped.
pub async fn update_profile_picture(
    state: web::Data<AppState>,
    user: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let limit = state.max_upload_bytes;
    let mut image: Option<ImageSource> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;

        if field.name() != Some(PROFILE_PICTURE_FIELD) || image.is_some() {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::Validation(format!("Upload read error: {}", e)))?;
            }
            continue;
        }

        let content_type = match field.content_type() {
            Some(ct) if ct.type_() == mime::IMAGE => ct.essence_str().to_string(),
            _ => return Err(AppError::Validation("Only image files are allowed".into())),
        };
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes =
                chunk.map_err(|e| AppError::Validation(format!("Upload read error: {}", e)))?;
            if data.len() + bytes.len() > limit {
                return Err(AppError::Validation(format!(
                    "File too large, maximum size is {} bytes",
                    limit
                )));
            }
            data.extend_from_slice(&bytes);
        }

        if data.is_empty() {
            return Err(AppError::Validation("No image file provided".into()));
        }
        image = Some(ImageSource::Bytes {
            data,
            content_type,
            filename,
        });
    }

    let image = image.ok_or_else(|| AppError::Validation("No image file provided".into()))?;
    let account = state.accounts.update_profile_picture(user.0, image).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile picture updated successfully",
        "user": AccountProfile::from(&account),
    })))
}
