//! Account API handlers.
//!
//! ```text
//! POST /api/v1/register {"username":"ada","email":"ada@example.com","password":"hunter2"}
//! POST /api/v1/login {"usernameOrEmail":"ada","password":"hunter2"}
//! POST /api/v1/logout
//! GET  /api/v1/me
//! POST /api/v1/forgot-password {"email":"ada@example.com"}
//! POST /api/v1/change-password {"token":"...","newPassword":"hunter3"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Registration, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration request body for `POST /api/v1/register`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Requested username, more than two characters.
    pub username: String,
    /// Contact email containing an `@`.
    pub email: String,
    /// Chosen password, more than four characters.
    pub password: String,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username, or email when the value contains an `@`.
    pub username_or_email: String,
    /// Account password.
    pub password: String,
}

/// Request body for `POST /api/v1/forgot-password`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    /// Address to send the reset token to, when registered.
    pub email: String,
}

/// Request body for `POST /api/v1/change-password`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Single-use token from the reset email.
    pub token: String,
    /// Replacement password, more than four characters.
    pub new_password: String,
}

/// Register a new account and log it in.
///
/// Validation failures list every offending field under `details.errors`;
/// duplicate username or email responds with `409 Conflict`.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and logged in", body = User),
        (status = 400, description = "Invalid registration input", body = Error),
        (status = 409, description = "Username or email already taken", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let user = state
        .accounts
        .register(Registration {
            username,
            email,
            password,
        })
        .await?;
    session.persist_user(user.id)?;
    Ok(HttpResponse::Created().json(user))
}

/// Authenticate and establish a session.
///
/// The identifier is treated as an email when it contains an `@`, otherwise
/// as a username. Unknown accounts and wrong passwords answer identically.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let LoginRequest {
        username_or_email,
        password,
    } = payload.into_inner();
    let user = state
        .accounts
        .authenticate(&username_or_email, &password)
        .await?;
    session.persist_user(user.id)?;
    Ok(web::Json(user))
}

/// Destroy the session. Responds `true` when a user was logged in.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 200, description = "Session destroyed", body = bool),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<web::Json<bool>> {
    let had_user = session.clear()?;
    Ok(web::Json(had_user))
}

/// Fetch the logged-in user, or `null` without a session.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user, null when anonymous", body = Option<User>),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "me",
    security([])
)]
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Option<User>>> {
    let Some(user_id) = session.user_id()? else {
        return Ok(web::Json(None));
    };
    let user = state.accounts.current_user(user_id).await?;
    Ok(web::Json(user))
}

/// Start a password reset.
///
/// Always responds `true` so the endpoint cannot be used to probe which
/// emails are registered.
#[utoipa::path(
    post,
    path = "/api/v1/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset initiated when the email is registered", body = bool),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "forgotPassword",
    security([])
)]
#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<web::Json<bool>> {
    state.accounts.forgot_password(&payload.email).await?;
    Ok(web::Json(true))
}

/// Complete a password reset with a token and log the user in.
#[utoipa::path(
    post,
    path = "/api/v1/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed and user logged in", body = User),
        (status = 400, description = "Invalid token or password", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "changePassword",
    security([])
)]
#[post("/change-password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<web::Json<User>> {
    let ChangePasswordRequest {
        token,
        new_password,
    } = payload.into_inner();
    let user = state.accounts.change_password(&token, &new_password).await?;
    session.persist_user(user.id)?;
    Ok(web::Json(user))
}
