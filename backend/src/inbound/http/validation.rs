//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path and query identifiers arrive as strings; these helpers turn them
//! into domain identifiers and report failures with field context.

use std::str::FromStr;

use serde_json::json;

use crate::domain::{CommentId, Error, GroupId, PostId, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidId,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidId => "invalid_id",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn invalid_value(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

fn parse_uuid_id<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value.parse().map_err(|_| {
        invalid_value(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_post_id(value: &str, field: FieldName) -> Result<PostId, Error> {
    parse_uuid_id(value, field)
}

pub(crate) fn parse_comment_id(value: &str, field: FieldName) -> Result<CommentId, Error> {
    parse_uuid_id(value, field)
}

pub(crate) fn parse_optional_comment_id(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<CommentId>, Error> {
    value.map(|raw| parse_comment_id(raw, field)).transpose()
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|err| {
        invalid_value(field, ErrorCode::InvalidId, err.to_string(), value)
    })
}

pub(crate) fn parse_group_id(value: &str, field: FieldName) -> Result<GroupId, Error> {
    GroupId::new(value).map_err(|err| {
        invalid_value(field, ErrorCode::InvalidId, err.to_string(), value)
    })
}

pub(crate) fn parse_optional_group_id(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<GroupId>, Error> {
    value
        .map(|raw| parse_group_id(&raw, field))
        .transpose()
}
