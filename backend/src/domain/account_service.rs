//! Account domain service: registration, login, and password recovery.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::error::{Error, FieldViolation, validation_error};
use crate::domain::ports::{
    MailSender, NewUserRecord, PasswordHasher, ResetTokenStore, UserPersistenceError,
    UserRepository,
};
use crate::domain::user::{EmailAddress, PlainPassword, User, UserId, Username};

/// Reset tokens stay valid for three days, matching the original service.
const RESET_TOKEN_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Raw registration input as received from the transport.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Requested username.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Chosen password, validated then hashed.
    pub password: String,
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateUsername => {
            Error::conflict("Username already taken.").with_field("username")
        }
        UserPersistenceError::DuplicateEmail => {
            Error::conflict("Email already taken.").with_field("email")
        }
    }
}

/// Account operations: register, authenticate, look up the session user,
/// and the forgot/change password pair.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    mail: Arc<dyn MailSender>,
    reset_tokens: Arc<dyn ResetTokenStore>,
}

impl AccountService {
    /// Assemble the service from its driven ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        mail: Arc<dyn MailSender>,
        reset_tokens: Arc<dyn ResetTokenStore>,
    ) -> Self {
        Self {
            users,
            hasher,
            mail,
            reset_tokens,
        }
    }

    /// Register a new account.
    ///
    /// All validation failures are reported together as field-tagged
    /// violations; duplicate username/email surface as conflicts naming
    /// the offending field.
    pub async fn register(&self, registration: Registration) -> Result<User, Error> {
        let mut violations: Vec<FieldViolation> = Vec::new();

        let username = Username::new(registration.username)
            .map_err(|violation| violations.push(violation))
            .ok();
        let email = EmailAddress::new(registration.email)
            .map_err(|violation| violations.push(violation))
            .ok();
        let password = PlainPassword::new(registration.password, "password")
            .map_err(|violation| violations.push(violation))
            .ok();

        let (Some(username), Some(email), Some(password)) = (username, email, password) else {
            return Err(validation_error("registration failed", violations));
        };

        let password_hash = self
            .hasher
            .hash(&password)
            .map_err(|err| Error::internal(err.to_string()))?;

        let user = self
            .users
            .insert(NewUserRecord {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(map_user_error)?;

        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Authenticate a login attempt. Inputs containing `@` are looked up by
    /// email, anything else by username. Unknown account and wrong password
    /// produce the same error, so callers cannot probe for registered names.
    pub async fn authenticate(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<User, Error> {
        let record = if username_or_email.contains('@') {
            self.users.find_record_by_email(username_or_email).await
        } else {
            self.users.find_record_by_username(username_or_email).await
        }
        .map_err(map_user_error)?;

        let Some(record) = record else {
            return Err(Error::unauthorized("invalid credentials"));
        };

        if !self.hasher.verify(&record.password_hash, password) {
            return Err(Error::unauthorized("invalid credentials"));
        }

        Ok(record.user)
    }

    /// Fetch the user behind a session id, if the account still exists.
    pub async fn current_user(&self, id: UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }

    /// Start a password reset. Always succeeds so the endpoint does not
    /// reveal whether an email is registered; when the account exists a
    /// single-use token is issued and handed to the mailer.
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        let record = self
            .users
            .find_record_by_email(email)
            .await
            .map_err(map_user_error)?;

        let Some(record) = record else {
            debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = self
            .reset_tokens
            .issue(record.user.id, RESET_TOKEN_TTL)
            .await
            .map_err(|err| Error::internal(err.to_string()))?;

        self.mail
            .send_password_reset(&record.user.email, &token)
            .await
            .map_err(|err| Error::internal(err.to_string()))?;

        Ok(())
    }

    /// Complete a password reset: consume the token, store the new hash,
    /// and return the user so the caller can establish a session.
    pub async fn change_password(&self, token: &str, new_password: &str) -> Result<User, Error> {
        let password = PlainPassword::new(new_password, "newPassword").map_err(|violation| {
            validation_error("password change failed", vec![violation])
        })?;

        let user_id = self
            .reset_tokens
            .consume(token)
            .await
            .map_err(|err| Error::internal(err.to_string()))?
            .ok_or_else(|| {
                validation_error(
                    "password change failed",
                    vec![FieldViolation::new("token", "Token expired or invalid.")],
                )
            })?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| {
                validation_error(
                    "password change failed",
                    vec![FieldViolation::new("token", "User no longer exists.")],
                )
            })?;

        let password_hash = self
            .hasher
            .hash(&password)
            .map_err(|err| Error::internal(err.to_string()))?;

        self.users
            .update_password_hash(user.id, password_hash)
            .await
            .map_err(map_user_error)?;

        info!(user_id = %user.id, "password changed via reset token");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for registration validation, login lookup, and
    //! the reset-token flow.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::test_support::memory::{
        FakePasswordHasher, InMemoryResetTokenStore, InMemoryUserRepository, RecordingMailSender,
    };
    use rstest::rstest;

    fn service() -> (
        AccountService,
        Arc<InMemoryUserRepository>,
        Arc<RecordingMailSender>,
    ) {
        let users = Arc::new(InMemoryUserRepository::default());
        let mail = Arc::new(RecordingMailSender::default());
        let service = AccountService::new(
            users.clone(),
            Arc::new(FakePasswordHasher),
            mail.clone(),
            Arc::new(InMemoryResetTokenStore::default()),
        );
        (service, users, mail)
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_persists_and_returns_the_user() {
        let (service, users, _) = service();

        let user = service
            .register(registration("ada", "ada@example.com", "hunter2"))
            .await
            .expect("valid registration");

        assert_eq!(user.username.as_ref(), "ada");
        let stored = users
            .record_by_username("ada")
            .expect("stored user present");
        assert_eq!(stored.user.id, user.id);
        assert_ne!(stored.password_hash, "hunter2");
    }

    #[rstest]
    #[case("ab", "ada@example.com", "hunter2", vec!["username"])]
    #[case("ada", "ada.example.com", "hunter2", vec!["email"])]
    #[case("ada", "ada@example.com", "1234", vec!["password"])]
    #[case("ab", "nope", "123", vec!["username", "email", "password"])]
    #[tokio::test]
    async fn register_reports_every_invalid_field(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected_fields: Vec<&str>,
    ) {
        let (service, users, _) = service();

        let err = service
            .register(registration(username, email, password))
            .await
            .expect_err("invalid registration");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details present");
        let fields: Vec<&str> = details["errors"]
            .as_array()
            .expect("errors array")
            .iter()
            .map(|entry| entry["field"].as_str().expect("field name"))
            .collect();
        assert_eq!(fields, expected_fields);
        assert!(users.is_empty());
    }

    #[rstest]
    #[case("ada", "other@example.com", ErrorCode::Conflict, "username")]
    #[case("other", "ada@example.com", ErrorCode::Conflict, "email")]
    #[tokio::test]
    async fn register_rejects_duplicates(
        #[case] username: &str,
        #[case] email: &str,
        #[case] expected_code: ErrorCode,
        #[case] expected_field: &str,
    ) {
        let (service, _, _) = service();
        service
            .register(registration("ada", "ada@example.com", "hunter2"))
            .await
            .expect("first registration");

        let err = service
            .register(registration(username, email, "hunter2"))
            .await
            .expect_err("duplicate registration");

        assert_eq!(err.code(), expected_code);
        let details = err.details().expect("details present");
        assert_eq!(details["field"], expected_field);
    }

    #[rstest]
    #[case("ada")]
    #[case("ada@example.com")]
    #[tokio::test]
    async fn authenticate_accepts_username_or_email(#[case] identifier: &str) {
        let (service, _, _) = service();
        let registered = service
            .register(registration("ada", "ada@example.com", "hunter2"))
            .await
            .expect("registration");

        let user = service
            .authenticate(identifier, "hunter2")
            .await
            .expect("valid credentials");

        assert_eq!(user.id, registered.id);
    }

    #[rstest]
    #[case("ada", "wrong-password")]
    #[case("nobody", "hunter2")]
    #[case("nobody@example.com", "hunter2")]
    #[tokio::test]
    async fn authenticate_rejects_bad_credentials_uniformly(
        #[case] identifier: &str,
        #[case] password: &str,
    ) {
        let (service, _, _) = service();
        service
            .register(registration("ada", "ada@example.com", "hunter2"))
            .await
            .expect("registration");

        let err = service
            .authenticate(identifier, password)
            .await
            .expect_err("bad credentials");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "invalid credentials");
    }

    #[tokio::test]
    async fn forgot_password_is_silent_for_unknown_emails() {
        let (service, _, mail) = service();

        service
            .forgot_password("nobody@example.com")
            .await
            .expect("always succeeds");

        assert!(mail.sent().is_empty());
    }

    #[tokio::test]
    async fn password_reset_round_trip_changes_the_credential() {
        let (service, _, mail) = service();
        let user = service
            .register(registration("ada", "ada@example.com", "hunter2"))
            .await
            .expect("registration");

        service
            .forgot_password("ada@example.com")
            .await
            .expect("reset issued");
        let (recipient, token) = mail.sent().pop().expect("reset mail sent");
        assert_eq!(recipient, "ada@example.com");

        let changed = service
            .change_password(&token, "new-password")
            .await
            .expect("token valid");
        assert_eq!(changed.id, user.id);

        service
            .authenticate("ada", "new-password")
            .await
            .expect("new password works");
        let err = service
            .authenticate("ada", "hunter2")
            .await
            .expect_err("old password revoked");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn reset_tokens_are_single_use() {
        let (service, _, mail) = service();
        service
            .register(registration("ada", "ada@example.com", "hunter2"))
            .await
            .expect("registration");
        service
            .forgot_password("ada@example.com")
            .await
            .expect("reset issued");
        let (_, token) = mail.sent().pop().expect("reset mail sent");

        service
            .change_password(&token, "new-password")
            .await
            .expect("first use succeeds");
        let err = service
            .change_password(&token, "another-password")
            .await
            .expect_err("second use fails");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details present");
        assert_eq!(details["errors"][0]["field"], "token");
    }

    #[tokio::test]
    async fn change_password_validates_the_new_password_first() {
        let (service, _, _) = service();

        let err = service
            .change_password("whatever", "1234")
            .await
            .expect_err("too short");

        let details = err.details().expect("details present");
        assert_eq!(details["errors"][0]["field"], "newPassword");
    }
}
