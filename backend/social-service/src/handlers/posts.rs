/// Post handlers: feeds, authoring, likes, comments, reshares
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::message;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PostBody {
    pub text: Option<String>,
    pub img: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCommentBody {
    pub text: String,
    pub post_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTarget {
    pub post_id: Uuid,
}

/// GET /api/posts/all
pub async fn all(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.posts.all().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/following
pub async fn following(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let posts = state.posts.following_feed(user.0).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/likes/{id}
pub async fn liked_by(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let posts = state.posts.liked_by(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/user/{username}
pub async fn by_username(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = state.posts.by_username(&path).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/posts/create
pub async fn create(
    state: web::Data<AppState>,
    user: UserId,
    body: web::Json<PostBody>,
) -> Result<HttpResponse> {
    let PostBody { text, img } = body.into_inner();
    let post = state.posts.create(user.0, text, img).await?;
    let view = state.posts.view(post.id).await?;
    Ok(HttpResponse::Created().json(view))
}

/// POST /api/posts/edit/{id}
pub async fn edit(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<PostBody>,
) -> Result<HttpResponse> {
    let PostBody { text, img } = body.into_inner();
    let post = state.posts.edit(user.0, path.into_inner(), text, img).await?;
    let view = state.posts.view(post.id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// DELETE /api/posts/delete/{id}
pub async fn delete(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete(user.0, path.into_inner()).await?;
    Ok(message("Post deleted successfully"))
}

/// POST /api/posts/like/{id}
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state.engagement.toggle_like(user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "liked": outcome.liked,
        "message": outcome.message(),
    })))
}

/// POST /api/posts/reshare/{id}
pub async fn reshare(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state.engagement.reshare(user.0, path.into_inner()).await?;
    let view = state.posts.view(post.id).await?;
    Ok(HttpResponse::Created().json(view))
}

/// POST /api/posts/comment/{id}
pub async fn add_comment(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
) -> Result<HttpResponse> {
    let comment = state
        .engagement
        .add_comment(user.0, path.into_inner(), &body.text)
        .await?;
    let view = state.posts.render_comment(&comment).await?;
    Ok(HttpResponse::Created().json(view))
}

/// POST /api/posts/edit-comment/{comment_id}
pub async fn edit_comment(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<EditCommentBody>,
) -> Result<HttpResponse> {
    let comment = state
        .engagement
        .edit_comment(user.0, body.post_id, path.into_inner(), &body.text)
        .await?;
    let view = state.posts.render_comment(&comment).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// DELETE /api/posts/delete-comment/{comment_id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<CommentTarget>,
) -> Result<HttpResponse> {
    state
        .engagement
        .delete_comment(user.0, body.post_id, path.into_inner())
        .await?;
    Ok(message("Comment deleted successfully"))
}
