//! Domain-level error type shared by every service.
//!
//! Errors are transport agnostic: the HTTP adapter maps them onto status
//! codes and a JSON envelope, while services and repositories only deal in
//! codes, messages, and optional field-tagged details.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::middleware::trace::TraceId;

/// Response header carrying the request-scoped trace identifier.
///
/// Lowercase so it doubles as a static `HeaderName`.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with existing state, e.g. a duplicate username.
    Conflict,
    /// A required backing service is unreachable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Domain error payload.
///
/// Field-tagged validation failures attach their field names under
/// `details`, so clients can render them beside the offending form input.
///
/// # Examples
/// ```
/// use neoreddit::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("no such post");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "Something went wrong")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    /// Trace identifier captured when the error was constructed inside a
    /// traced request scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Error {
    /// Create a new error, capturing the active trace id if one is in scope.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Trace identifier captured at construction, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach structured details to the error.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a single field tag, the shape used by one-field validation
    /// failures.
    #[must_use]
    pub fn with_field(self, field: &str) -> Self {
        self.with_details(json!({ "field": field }))
    }

    /// Override the captured trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

/// A single field-tagged validation message, accumulated during input
/// validation and attached to an [`Error`] under `details.errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    /// Name of the input field the message pertains to.
    pub field: &'static str,
    /// Human-readable message for client-side form display.
    pub message: String,
}

impl FieldViolation {
    /// Tag a message with the field it pertains to.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldViolation {}

/// Fold accumulated field violations into a single `invalid_request` error.
pub fn validation_error(
    message: impl Into<String>,
    violations: Vec<FieldViolation>,
) -> Error {
    Error::invalid_request(message).with_details(json!({ "errors": violations }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_without_empty_optionals() {
        let err = Error::not_found("no such post");
        let value = serde_json::to_value(&err).expect("serialise error");

        assert_eq!(value["code"], "not_found");
        assert_eq!(value["message"], "no such post");
        assert!(value.get("details").is_none());
        assert!(value.get("traceId").is_none());
    }

    #[test]
    fn field_violation_displays_field_and_message() {
        let violation = FieldViolation::new("email", "Invalid email.");
        assert_eq!(violation.to_string(), "email: Invalid email.");
    }

    #[test]
    fn field_violations_land_under_details_errors() {
        let err = validation_error(
            "registration failed",
            vec![
                FieldViolation::new("username", "Username must have at least 3 characters."),
                FieldViolation::new("email", "Invalid email."),
            ],
        );

        let value = serde_json::to_value(&err).expect("serialise error");
        let errors = value["details"]["errors"]
            .as_array()
            .expect("errors array");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["field"], "username");
        assert_eq!(errors[1]["field"], "email");
    }

    #[test]
    fn with_field_tags_a_single_field() {
        let err = Error::conflict("username already taken").with_field("username");
        let details = err.details().expect("details present");
        assert_eq!(details["field"], "username");
    }

    #[test]
    fn trace_id_defaults_to_none_outside_request_scope() {
        let err = Error::internal("boom");
        assert!(err.trace_id().is_none());

        let tagged = err.with_trace_id("abc");
        assert_eq!(tagged.trace_id(), Some("abc"));
    }
}
