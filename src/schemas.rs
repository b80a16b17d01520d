use std::fmt;
use std::sync::Arc;

use common::Warning;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::otp::OtpMailer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// HMAC secret for signing and verifying JWTs
    pub jwt_secret: String,
    /// Lifetime of a one-time passcode
    pub otp_ttl_minutes: i64,
    /// Delivery channel for one-time passcodes
    pub mailer: Arc<dyn OtpMailer>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The JWT secret never goes to logs.
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("jwt_secret", &"<redacted>")
            .field("otp_ttl_minutes", &self.otp_ttl_minutes)
            .finish()
    }
}

/// API response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Paginated list response wrapper
#[derive(Serialize, ToSchema)]
pub struct ListResponse<T> {
    /// Page of items
    pub data: Vec<T>,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
    /// Current page (1-based)
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// Total matching items
    pub total: u64,
    /// Total pages
    pub pages: u64,
}

/// Budget warnings response
#[derive(Serialize, ToSchema)]
pub struct WarningsResponse {
    /// Warnings, category budgets first
    pub data: Vec<Warning>,
    /// Number of warnings
    pub count: usize,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::verify_otp,
        crate::handlers::auth::resend_otp,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::budgets::create_budget,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::update_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::budgets::recalculate_budget,
        crate::handlers::budgets::get_budget_warnings,
        crate::handlers::budgets::monthly::get_monthly_budget,
        crate::handlers::budgets::monthly::upsert_monthly_budget,
        crate::handlers::budgets::monthly::delete_monthly_budget,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::goals::create_goal,
        crate::handlers::goals::get_goals,
        crate::handlers::goals::get_goal,
        crate::handlers::goals::update_goal,
        crate::handlers::goals::delete_goal,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            WarningsResponse,
            Warning,
            common::MonthYear,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::VerifyOtpRequest,
            crate::handlers::auth::ResendOtpRequest,
            crate::handlers::auth::OtpIssuedResponse,
            crate::handlers::auth::AuthTokenResponse,
            crate::handlers::users::UpdateUserRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::UpdateTransactionRequest,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::transactions::CreatedTransaction,
            crate::handlers::budgets::CreateBudgetRequest,
            crate::handlers::budgets::UpdateBudgetRequest,
            crate::handlers::budgets::BudgetResponse,
            crate::handlers::budgets::monthly::UpsertMonthlyBudgetRequest,
            crate::handlers::budgets::monthly::MonthlyBudgetResponse,
            crate::handlers::budgets::monthly::MonthlyBudgetStatus,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::goals::CreateGoalRequest,
            crate::handlers::goals::UpdateGoalRequest,
            crate::handlers::goals::GoalResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and OTP verification"),
        (name = "users", description = "User administration endpoints"),
        (name = "transactions", description = "Transaction ledger endpoints"),
        (name = "budgets", description = "Category and monthly budget endpoints"),
        (name = "categories", description = "Category management endpoints"),
        (name = "goals", description = "Savings goal endpoints"),
    ),
    info(
        title = "Budget Buddy API",
        description = "Personal finance tracker - transactions, budgets, savings goals and budget warnings",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
