//! Like HTTP handlers.
//!
//! ```text
//! POST   /api/v1/posts/{post_id}/like          toggle
//! PUT    /api/v1/posts/{post_id}/like          like
//! DELETE /api/v1/posts/{post_id}/like          unlike
//! POST   /api/v1/comments/{comment_id}/like[?parentCommentId=...]
//! PUT    /api/v1/comments/{comment_id}/like[?parentCommentId=...]
//! DELETE /api/v1/comments/{comment_id}/like[?parentCommentId=...]
//! ```
//!
//! Every variant answers with the caller's view of the target afterwards:
//! `{ "likeCount": n, "liked": bool }`.

use actix_web::{delete, post, put, web};

use crate::domain::{LikeSnapshot, LikeTarget};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::comments::{COMMENT_ID, PARENT_COMMENT_ID, ParentQuery};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_comment_id, parse_optional_comment_id, parse_post_id,
};

#[derive(Debug, Clone, Copy)]
enum LikeAction {
    Toggle,
    Like,
    Unlike,
}

fn post_target(path: &str) -> ApiResult<LikeTarget> {
    parse_post_id(path, FieldName::new("postId")).map(LikeTarget::Post)
}

fn comment_target(path: &str, query: &ParentQuery) -> ApiResult<LikeTarget> {
    let child = parse_comment_id(path, COMMENT_ID)?;
    let parent = parse_optional_comment_id(query.parent_comment_id.as_deref(), PARENT_COMMENT_ID)?;
    Ok(match parent {
        Some(parent) => LikeTarget::ChildComment { parent, child },
        None => LikeTarget::Comment(child),
    })
}

async fn apply(
    state: &HttpState,
    user: &AuthenticatedUser,
    target: LikeTarget,
    action: LikeAction,
) -> ApiResult<web::Json<LikeSnapshot>> {
    let service = &state.interactions;
    let snapshot = match action {
        LikeAction::Toggle => service.toggle_like(user.id(), &target).await?,
        LikeAction::Like => service.like(user.id(), &target).await?,
        LikeAction::Unlike => service.unlike(user.id(), &target).await?,
    };
    Ok(web::Json(snapshot))
}

/// Flip the caller's like on a post.
#[post("/posts/{post_id}/like")]
pub async fn toggle_post_like(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeSnapshot>> {
    apply(&state, &user, post_target(&path)?, LikeAction::Toggle).await
}

#[put("/posts/{post_id}/like")]
pub async fn like_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeSnapshot>> {
    apply(&state, &user, post_target(&path)?, LikeAction::Like).await
}

#[delete("/posts/{post_id}/like")]
pub async fn unlike_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeSnapshot>> {
    apply(&state, &user, post_target(&path)?, LikeAction::Unlike).await
}

/// Flip the caller's like on a comment or reply.
#[post("/comments/{comment_id}/like")]
pub async fn toggle_comment_like(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ParentQuery>,
) -> ApiResult<web::Json<LikeSnapshot>> {
    let target = comment_target(&path, &query)?;
    apply(&state, &user, target, LikeAction::Toggle).await
}

#[put("/comments/{comment_id}/like")]
pub async fn like_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ParentQuery>,
) -> ApiResult<web::Json<LikeSnapshot>> {
    let target = comment_target(&path, &query)?;
    apply(&state, &user, target, LikeAction::Like).await
}

#[delete("/comments/{comment_id}/like")]
pub async fn unlike_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ParentQuery>,
) -> ApiResult<web::Json<LikeSnapshot>> {
    let target = comment_target(&path, &query)?;
    apply(&state, &user, target, LikeAction::Unlike).await
}

#[cfg(test)]
#[path = "likes_tests.rs"]
mod tests;
