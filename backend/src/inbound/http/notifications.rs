//! Notification trigger endpoint.
//!
//! ```text
//! POST /api/v1/notifications/profile-updated
//! ```
//!
//! Called by the profile service after a user edits their profile. The
//! email itself is sent later by the notification worker.

use actix_web::{HttpResponse, post, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Queue the "profile updated" email for the caller.
///
/// Answers `202 Accepted` once the event is handed to the broker, or when
/// the user has no email address on file.
#[post("/notifications/profile-updated")]
pub async fn profile_updated(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    state.notifier.profile_updated(user.id()).await?;
    Ok(HttpResponse::Accepted().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailAddress;
    use crate::domain::ports::QueueName;
    use crate::inbound::http::auth::USER_ID_HEADER;
    use crate::inbound::http::test_utils::TestHarness;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn queues_one_email_for_a_known_address() {
        let harness = TestHarness::new();
        harness.ledger.register_user(
            crate::domain::UserId::new("u1").expect("valid id"),
            Some(EmailAddress::new("u1@example.com").expect("valid email")),
        );
        let app = test::init_service(harness.app()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/notifications/profile-updated")
                .insert_header((USER_ID_HEADER, "u1"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(harness.broker.pending(QueueName::EmailEvents), 1);
    }

    #[actix_web::test]
    async fn users_without_an_address_are_skipped() {
        let harness = TestHarness::new();
        let app = test::init_service(harness.app()).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/notifications/profile-updated")
                .insert_header((USER_ID_HEADER, "ghost"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(harness.broker.pending(QueueName::EmailEvents), 0);
    }
}
