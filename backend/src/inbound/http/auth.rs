//! Caller identity for HTTP handlers.
//!
//! Authentication happens upstream; the gateway forwards the verified user
//! id in the `x-user-id` header. Handlers take [`AuthenticatedUser`] and
//! never read the header themselves.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::{Error, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf the request runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn id(&self) -> &UserId {
        &self.0
    }

    pub fn into_inner(self) -> UserId {
        self.0
    }
}

fn identify(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| Error::unauthorized("authentication required"))?;
    let raw = raw.to_str().map_err(|_| {
        warn!("non-ASCII user id header rejected");
        Error::unauthorized("authentication required")
    })?;
    UserId::new(raw).map(AuthenticatedUser).map_err(|err| {
        warn!(error = %err, "malformed user id header rejected");
        Error::unauthorized("authentication required")
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    fn header_identifies_the_caller() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "user-42"))
            .to_http_request();
        let user = identify(&req).expect("authenticated");
        assert_eq!(user.id().as_str(), "user-42");
    }

    #[rstest]
    #[case::missing(None)]
    #[case::blank(Some(""))]
    #[case::padded(Some(" user-42 "))]
    fn missing_or_malformed_header_is_unauthorised(#[case] header: Option<&str>) {
        let mut req = TestRequest::default();
        if let Some(value) = header {
            req = req.insert_header((USER_ID_HEADER, value));
        }
        let err = identify(&req.to_http_request()).expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
