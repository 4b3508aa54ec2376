//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
    #[case(Error::unauthorized("who"), StatusCode::UNAUTHORIZED)]
    #[case(Error::forbidden("no"), StatusCode::FORBIDDEN)]
    #[case(Error::not_found("gone"), StatusCode::NOT_FOUND)]
    #[case(Error::conflict("taken"), StatusCode::CONFLICT)]
    #[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_every_code_to_a_status(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[actix_web::test]
    async fn internal_messages_are_redacted_in_the_body() {
        let response = Error::internal("secret database detail").error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body bytes");
        let value: Value = serde_json::from_slice(&bytes).expect("JSON body");
        assert_eq!(value["message"], "Internal server error");
    }

    #[actix_web::test]
    async fn client_errors_keep_their_message_and_details() {
        let response = Error::conflict("Username already taken.")
            .with_field("username")
            .error_response();

        let bytes = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body bytes");
        let value: Value = serde_json::from_slice(&bytes).expect("JSON body");
        assert_eq!(value["message"], "Username already taken.");
        assert_eq!(value["details"]["field"], "username");
    }

    #[rstest]
    fn trace_id_is_echoed_as_a_header() {
        let response = Error::not_found("gone")
            .with_trace_id("abc-123")
            .error_response();

        let header = response
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace header")
            .to_str()
            .expect("ascii header");
        assert_eq!(header, "abc-123");
    }
}
