//! Post HTTP handlers.
//!
//! ```text
//! POST   /api/v1/posts
//! GET    /api/v1/posts/{post_id}
//! PUT    /api/v1/posts/{post_id}
//! DELETE /api/v1/posts/{post_id}
//! PUT    /api/v1/posts/{post_id}/visibility
//! GET    /api/v1/users/{user_id}/posts?page=N
//! GET    /api/v1/groups/{group_id}/posts?page=N
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Page, PageRequest, Post, PostContent};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_group_id, parse_optional_group_id, parse_post_id, parse_user_id,
};

/// Request payload for creating a post.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub group_id: Option<String>,
}

/// Request payload replacing a post's title and body.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// Zero-based page selector shared by listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page)
    }
}

const POST_ID: FieldName = FieldName::new("postId");

#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let CreatePostRequest {
        title,
        body,
        group_id,
    } = payload.into_inner();
    let content = PostContent::new(title, body)?;
    let group = parse_optional_group_id(group_id, FieldName::new("groupId"))?;

    let post = state
        .interactions
        .create_post(user.id(), content, group)
        .await?;
    Ok(HttpResponse::Created().json(post))
}

#[get("/posts/{post_id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Post>> {
    let id = parse_post_id(&path, POST_ID)?;
    let post = state.interactions.get_post(user.id(), &id).await?;
    Ok(web::Json(post))
}

/// Replace the title and body of a post owned by the caller.
#[put("/posts/{post_id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdatePostRequest>,
) -> ApiResult<web::Json<Post>> {
    let id = parse_post_id(&path, POST_ID)?;
    let UpdatePostRequest { title, body } = payload.into_inner();
    let content = PostContent::new(title, body)?;

    let post = state
        .interactions
        .update_post(user.id(), &id, content)
        .await?;
    Ok(web::Json(post))
}

#[put("/posts/{post_id}/visibility")]
pub async fn change_visibility(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<VisibilityRequest>,
) -> ApiResult<web::Json<Post>> {
    let id = parse_post_id(&path, POST_ID)?;
    let post = state
        .interactions
        .change_visibility(user.id(), &id, payload.visible)
        .await?;
    Ok(web::Json(post))
}

/// Delete a post and, with it, its comment tree.
#[delete("/posts/{post_id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_post_id(&path, POST_ID)?;
    state.interactions.delete_post(user.id(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Newest-first posts by one author. Hidden posts appear only to the author.
#[get("/users/{user_id}/posts")]
pub async fn list_posts_by_author(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Post>>> {
    let author = parse_user_id(&path, FieldName::new("userId"))?;
    let page = state
        .interactions
        .list_posts_by_author(user.id(), &author, query.request())
        .await?;
    Ok(web::Json(page))
}

#[get("/groups/{group_id}/posts")]
pub async fn list_posts_by_group(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Post>>> {
    let group = parse_group_id(&path, FieldName::new("groupId"))?;
    let page = state
        .interactions
        .list_posts_by_group(user.id(), &group, query.request())
        .await?;
    Ok(web::Json(page))
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
