//! HTTP inbound adapter exposing REST endpoints.
//!
//! All engagement routes live under `/api/v1`; health probes sit at the
//! root. Callers are identified by the gateway-supplied `x-user-id` header.

pub mod auth;
pub mod comments;
pub mod error;
pub mod health;
pub mod likes;
pub mod notifications;
pub mod posts;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::{Scope, web};

/// The versioned API scope with every engagement route registered.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .service(posts::create_post)
        .service(posts::list_posts_by_author)
        .service(posts::list_posts_by_group)
        .service(posts::change_visibility)
        .service(posts::get_post)
        .service(posts::update_post)
        .service(posts::delete_post)
        .service(comments::create_comment)
        .service(comments::list_comments)
        .service(comments::update_comment)
        .service(comments::delete_comment)
        .service(likes::toggle_post_like)
        .service(likes::like_post)
        .service(likes::unlike_post)
        .service(likes::toggle_comment_like)
        .service(likes::like_comment)
        .service(likes::unlike_comment)
        .service(notifications::profile_updated)
}

/// JSON extractor limits with malformed bodies reported as `invalid_request`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(error::json_error_handler)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(error::query_error_handler)
}
