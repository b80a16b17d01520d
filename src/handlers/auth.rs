use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::user::{self, UserRole};
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::handlers::users::UserResponse;
use crate::otp::{self, VerifyOutcome};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>, code: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error, code)))
}

fn unauthorized(error: impl Into<String>, code: &str) -> ApiError {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(error, code)))
}

fn internal(error: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(error, "INTERNAL_ERROR")),
    )
}

/// Request body for registering a new account
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (must be unique)
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    /// Email address (must be unique)
    #[validate(email)]
    pub email: String,
    /// Password (stored as a bcrypt hash)
    #[validate(length(min = 8))]
    pub password: String,
}

/// Request body for the password step of login
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Request body for the OTP step of login
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    /// Six decimal digits
    #[validate(length(equal = 6))]
    pub code: String,
}

/// Request body for re-sending an OTP
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
}

/// Response after the password step: a code is on its way
#[derive(Debug, Serialize, ToSchema)]
pub struct OtpIssuedResponse {
    pub email: String,
    /// Minutes until the code expires
    pub expires_in_minutes: i64,
}

/// Response after successful OTP verification
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthTokenResponse {
    /// Bearer token for the Authorization header
    pub token: String,
    pub user: UserResponse,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or email/username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    debug!("Registering account for username: {}", request.username);
    request
        .validate()
        .map_err(|e| bad_request(e.to_string(), "VALIDATION_ERROR"))?;

    let password_hash = hash_password(&request.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal("Failed to process password")
    })?;

    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        email: Set(request.email.to_lowercase()),
        password_hash: Set(password_hash),
        role: Set(UserRole::User),
        ..Default::default()
    };

    match new_user.insert(&state.db).await {
        Ok(user_model) => {
            info!(
                "Account created with ID: {}, username: {}",
                user_model.id, user_model.username
            );
            let response = ApiResponse {
                data: UserResponse::from(user_model),
                message: "Account created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create account '{}': {}", request.username, db_error);
            let is_unique_violation = matches!(
                &db_error,
                DbErr::Exec(exec_err) if {
                    let msg = exec_err.to_string().to_lowercase();
                    msg.contains("unique") || msg.contains("constraint")
                }
            );
            if is_unique_violation {
                Err(bad_request(
                    "Username or email already in use",
                    "ACCOUNT_ALREADY_EXISTS",
                ))
            } else {
                Err(internal("Failed to create account"))
            }
        }
    }
}

/// Password step of login; issues a one-time passcode on success
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "OTP issued and sent", body = ApiResponse<OtpIssuedResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<OtpIssuedResponse>>, ApiError> {
    request
        .validate()
        .map_err(|e| bad_request(e.to_string(), "VALIDATION_ERROR"))?;
    let email = request.email.to_lowercase();

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up user '{}': {}", email, e);
            internal("Failed to look up account")
        })?;

    // Same answer for unknown email and wrong password.
    let Some(user_model) = user_model else {
        warn!("Login attempt for unknown email");
        return Err(unauthorized("Invalid email or password", "INVALID_CREDENTIALS"));
    };
    if !verify_password(&request.password, &user_model.password_hash) {
        warn!("Failed password attempt for user ID: {}", user_model.id);
        return Err(unauthorized("Invalid email or password", "INVALID_CREDENTIALS"));
    }

    issue_and_send(&state, &email).await
}

/// Re-send a one-time passcode
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-otp",
    tag = "auth",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "OTP issued and sent", body = ApiResponse<OtpIssuedResponse>),
        (status = 404, description = "No account for this email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(request): Json<ResendOtpRequest>,
) -> Result<Json<ApiResponse<OtpIssuedResponse>>, ApiError> {
    request
        .validate()
        .map_err(|e| bad_request(e.to_string(), "VALIDATION_ERROR"))?;
    let email = request.email.to_lowercase();

    let exists = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up user '{}': {}", email, e);
            internal("Failed to look up account")
        })?
        .is_some();
    if !exists {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No account for this email", "ACCOUNT_NOT_FOUND")),
        ));
    }

    issue_and_send(&state, &email).await
}

async fn issue_and_send(
    state: &AppState,
    email: &str,
) -> Result<Json<ApiResponse<OtpIssuedResponse>>, ApiError> {
    let issued = otp::issue_code(&state.db, email, state.otp_ttl_minutes)
        .await
        .map_err(|e| {
            error!("Failed to issue one-time passcode: {}", e);
            internal("Failed to issue one-time passcode")
        })?;

    state.mailer.send_code(email, &issued.code).await.map_err(|e| {
        error!("Failed to deliver one-time passcode: {}", e);
        internal("Failed to deliver one-time passcode")
    })?;

    info!("One-time passcode issued for login");
    Ok(Json(ApiResponse {
        data: OtpIssuedResponse {
            email: email.to_string(),
            expires_in_minutes: state.otp_ttl_minutes,
        },
        message: "One-time passcode sent".to_string(),
        success: true,
    }))
}

/// OTP step of login; trades a valid code for a JWT
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-otp",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Login complete", body = ApiResponse<AuthTokenResponse>),
        (status = 401, description = "Missing, wrong, expired or locked code", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<AuthTokenResponse>>, ApiError> {
    request
        .validate()
        .map_err(|e| bad_request(e.to_string(), "VALIDATION_ERROR"))?;
    let email = request.email.to_lowercase();

    let outcome = otp::verify_code(&state.db, &email, &request.code)
        .await
        .map_err(|e| {
            error!("Failed to verify one-time passcode: {}", e);
            internal("Failed to verify one-time passcode")
        })?;

    match outcome {
        VerifyOutcome::Verified => {}
        VerifyOutcome::NoCode => {
            return Err(unauthorized("No pending code for this email", "OTP_NOT_FOUND"));
        }
        VerifyOutcome::Expired => {
            return Err(unauthorized("Code expired, request a new one", "OTP_EXPIRED"));
        }
        VerifyOutcome::WrongCode { attempts_left } => {
            return Err(unauthorized(
                format!("Wrong code, {} attempts left", attempts_left),
                "OTP_INVALID",
            ));
        }
        VerifyOutcome::TooManyAttempts => {
            return Err(unauthorized(
                "Too many failed attempts, request a new code",
                "OTP_LOCKED",
            ));
        }
    }

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up user '{}': {}", email, e);
            internal("Failed to look up account")
        })?
        .ok_or_else(|| unauthorized("No account for this email", "ACCOUNT_NOT_FOUND"))?;

    let token = issue_token(&user_model, &state.jwt_secret).map_err(|e| {
        error!("Failed to sign token: {}", e);
        internal("Failed to sign token")
    })?;

    info!("Login completed for user ID: {}", user_model.id);
    Ok(Json(ApiResponse {
        data: AuthTokenResponse {
            token,
            user: UserResponse::from(user_model),
        },
        message: "Login successful".to_string(),
        success: true,
    }))
}
