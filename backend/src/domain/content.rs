//! Validated user-authored text for posts and comments.

use serde::{Deserialize, Serialize};

/// Maximum characters in a post title.
pub const POST_TITLE_MAX: usize = 200;
/// Maximum characters in a post body.
pub const POST_BODY_MAX: usize = 10_000;
/// Maximum characters in a comment body.
pub const COMMENT_BODY_MAX: usize = 2_000;

/// Validation failures for authored text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl ContentValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
        }
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ContentValidationError> {
    if value.trim().is_empty() {
        return Err(ContentValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ContentValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Title and body of a post.
///
/// # Examples
/// ```
/// use engagement::domain::PostContent;
///
/// let content = PostContent::new("Hello", "First post").expect("valid content");
/// assert_eq!(content.title(), "Hello");
/// assert!(PostContent::new("  ", "body").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPostContent")]
pub struct PostContent {
    title: String,
    body: String,
}

impl PostContent {
    /// Validate and construct post content.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, ContentValidationError> {
        let title = title.into();
        let body = body.into();
        check_text("title", &title, POST_TITLE_MAX)?;
        check_text("body", &body, POST_BODY_MAX)?;
        Ok(Self { title, body })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Deserialize)]
struct RawPostContent {
    title: String,
    body: String,
}

impl TryFrom<RawPostContent> for PostContent {
    type Error = ContentValidationError;

    fn try_from(raw: RawPostContent) -> Result<Self, Self::Error> {
        Self::new(raw.title, raw.body)
    }
}

/// Body text of a comment or child comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentBody(String);

impl CommentBody {
    /// Validate and construct a comment body.
    pub fn new(body: impl Into<String>) -> Result<Self, ContentValidationError> {
        let body = body.into();
        check_text("body", &body, COMMENT_BODY_MAX)?;
        Ok(Self(body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CommentBody> for String {
    fn from(value: CommentBody) -> Self {
        value.0
    }
}

impl TryFrom<String> for CommentBody {
    type Error = ContentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
