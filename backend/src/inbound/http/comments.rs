//! Comment HTTP handlers.
//!
//! ```text
//! POST   /api/v1/posts/{post_id}/comments
//! GET    /api/v1/posts/{post_id}/comments?page=N
//! PUT    /api/v1/comments/{comment_id}[?parentCommentId=...]
//! DELETE /api/v1/comments/{comment_id}[?parentCommentId=...]
//! ```
//!
//! A reply is addressed by its own id plus the id of the top-level comment
//! it lives under.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Comment, CommentBody, CreatedComment, Page};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::posts::PageQuery;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_comment_id, parse_optional_comment_id, parse_post_id,
};

/// Request payload for creating a comment or, with a parent, a reply.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub body: String,
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub body: String,
}

/// Optional parent selector for addressing a reply.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentQuery {
    pub parent_comment_id: Option<String>,
}

pub(crate) const PARENT_COMMENT_ID: FieldName = FieldName::new("parentCommentId");
pub(crate) const COMMENT_ID: FieldName = FieldName::new("commentId");

#[post("/posts/{post_id}/comments")]
pub async fn create_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let post = parse_post_id(&path, FieldName::new("postId"))?;
    let CreateCommentRequest {
        body,
        parent_comment_id,
    } = payload.into_inner();
    let body = CommentBody::new(body)?;
    let parent = parse_optional_comment_id(parent_comment_id.as_deref(), PARENT_COMMENT_ID)?;

    let created: CreatedComment = state
        .interactions
        .create_comment(user.id(), &post, body, parent)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// Oldest-first top-level comments of a post, each with its replies.
#[get("/posts/{post_id}/comments")]
pub async fn list_comments(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Comment>>> {
    let post = parse_post_id(&path, FieldName::new("postId"))?;
    let page = state
        .interactions
        .get_comments(user.id(), &post, query.request())
        .await?;
    Ok(web::Json(page))
}

#[put("/comments/{comment_id}")]
pub async fn update_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ParentQuery>,
    payload: web::Json<UpdateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let id = parse_comment_id(&path, COMMENT_ID)?;
    let parent = parse_optional_comment_id(query.parent_comment_id.as_deref(), PARENT_COMMENT_ID)?;
    let body = CommentBody::new(payload.into_inner().body)?;

    state
        .interactions
        .update_comment(user.id(), &id, parent, body)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete a top-level comment (decrementing the post's count) or one reply.
#[delete("/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ParentQuery>,
) -> ApiResult<HttpResponse> {
    let id = parse_comment_id(&path, COMMENT_ID)?;
    let parent = parse_optional_comment_id(query.parent_comment_id.as_deref(), PARENT_COMMENT_ID)?;

    state
        .interactions
        .delete_comment(user.id(), &id, parent)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "comments_tests.rs"]
mod tests;
