/// Notification ledger handlers
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::message;
use crate::error::Result;
use crate::state::AppState;

/// GET /api/notifications
///
/// Returns the recipient's notifications and marks them all read.
pub async fn list(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let notifications = state.notifications.list_for_recipient(user.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// GET /api/notifications/unread
pub async fn unread_count(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let count = state.notifications.unread_count(user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

/// POST /api/notifications/mark-all-read
pub async fn mark_all_read(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let updated = state.notifications.mark_all_read(user.0).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "All notifications marked as read",
        "updated": updated,
    })))
}

/// DELETE /api/notifications/clear
pub async fn clear_all(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    state.notifications.clear_all(user.0).await?;
    Ok(message("Notifications deleted successfully"))
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_read(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let notification = state
        .notifications
        .mark_read(path.into_inner(), user.0)
        .await?;
    Ok(HttpResponse::Ok().json(notification))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.notifications.delete(path.into_inner(), user.0).await?;
    Ok(message("Notification deleted successfully"))
}
