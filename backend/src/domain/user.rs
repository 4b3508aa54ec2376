//! User identity and the value types guarding registration input.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::error::FieldViolation;

/// Minimum username length; anything shorter is rejected at registration.
pub const USERNAME_MIN: usize = 3;
/// Minimum password length enforced at registration and password change.
pub const PASSWORD_MIN: usize = 5;

/// Stable user identifier (UUID v4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated username: more than two characters, per the registration rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a username.
    ///
    /// # Errors
    /// Returns a field-tagged violation when the username is too short.
    pub fn new(raw: impl Into<String>) -> Result<Self, FieldViolation> {
        let raw = raw.into();
        if raw.chars().count() < USERNAME_MIN {
            return Err(FieldViolation::new(
                "username",
                format!("Username must have at least {USERNAME_MIN} characters."),
            ));
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = FieldViolation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated email address. The original service only checks for an `@`;
/// anything stricter belongs to the mail collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an email address.
    ///
    /// # Errors
    /// Returns a field-tagged violation when no `@` is present.
    pub fn new(raw: impl Into<String>) -> Result<Self, FieldViolation> {
        let raw = raw.into();
        if !raw.contains('@') {
            return Err(FieldViolation::new("email", "Invalid email."));
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = FieldViolation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Plain-text password accepted at registration or password change.
///
/// Never stored or logged; it only exists long enough to be hashed.
pub struct PlainPassword(String);

impl PlainPassword {
    /// Validate password length.
    ///
    /// # Errors
    /// Returns a violation tagged with the given field name (registration
    /// uses `password`, password change uses `newPassword`).
    pub fn new(raw: impl Into<String>, field: &'static str) -> Result<Self, FieldViolation> {
        let raw = raw.into();
        if raw.chars().count() < PASSWORD_MIN {
            return Err(FieldViolation::new(
                field,
                format!("Password must have at least {PASSWORD_MIN} characters."),
            ));
        }
        Ok(Self(raw))
    }

    /// Borrow the secret for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(<redacted>)")
    }
}

/// Application user as exposed to adapters. The password hash lives only in
/// the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    /// Unique login and display handle.
    #[schema(value_type = String, example = "ada")]
    pub username: Username,
    /// Unique contact address.
    #[schema(value_type = String, example = "ada@example.com")]
    pub email: EmailAddress,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ab")]
    #[case("")]
    #[case("a")]
    fn username_rejects_two_or_fewer_characters(#[case] raw: &str) {
        let err = Username::new(raw).expect_err("too short");
        assert_eq!(err.field, "username");
    }

    #[rstest]
    #[case("ada")]
    #[case("ada lovelace")]
    fn username_accepts_three_or_more_characters(#[case] raw: &str) {
        assert!(Username::new(raw).is_ok());
    }

    #[rstest]
    fn email_requires_an_at_sign() {
        let err = EmailAddress::new("ada.example.com").expect_err("no @");
        assert_eq!(err.field, "email");
        assert!(EmailAddress::new("ada@example.com").is_ok());
    }

    #[rstest]
    #[case("1234")]
    #[case("")]
    fn password_rejects_four_or_fewer_characters(#[case] raw: &str) {
        let err = PlainPassword::new(raw, "password").expect_err("too short");
        assert_eq!(err.field, "password");
    }

    #[rstest]
    fn password_violation_carries_caller_field_name() {
        let err = PlainPassword::new("nope", "newPassword").expect_err("too short");
        assert_eq!(err.field, "newPassword");
        assert!(PlainPassword::new("12345", "newPassword").is_ok());
    }

    #[rstest]
    fn username_validates_through_serde() {
        let err = serde_json::from_value::<Username>(serde_json::json!("ab"))
            .expect_err("too short through serde");
        assert!(err.to_string().contains("Username must have at least"));
        assert!(serde_json::from_value::<Username>(serde_json::json!("ada")).is_ok());
    }

    #[rstest]
    fn email_validates_through_serde() {
        let err = serde_json::from_value::<EmailAddress>(serde_json::json!("ada.example.com"))
            .expect_err("no @ through serde");
        assert!(err.to_string().contains("Invalid email."));
    }

    #[rstest]
    fn plain_password_debug_redacts_secret() {
        let password = PlainPassword::new("hunter2", "password").expect("valid");
        assert_eq!(format!("{password:?}"), "PlainPassword(<redacted>)");
    }
}
