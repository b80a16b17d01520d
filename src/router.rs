use crate::handlers::{
    auth::{login, register, resend_otp, verify_otp},
    budgets::{
        create_budget, delete_budget, get_budget_warnings, get_budgets,
        monthly::{delete_monthly_budget, get_monthly_budget, upsert_monthly_budget},
        recalculate_budget, update_budget,
    },
    categories::{create_category, delete_category, get_categories, get_category, update_category},
    goals::{create_goal, delete_goal, get_goal, get_goals, update_goal},
    health::health_check,
    transactions::{
        create_transaction, delete_transaction, get_transaction, get_transactions,
        update_transaction,
    },
    users::{delete_user, get_user, get_users, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes (public)
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/verify-otp", post(verify_otp))
        .route("/api/v1/auth/resend-otp", post(resend_otp))
        // User admin routes
        .route("/api/v1/auth/users", get(get_users))
        .route("/api/v1/auth/users/:user_id", get(get_user))
        .route("/api/v1/auth/users/:user_id", put(update_user))
        .route("/api/v1/auth/users/:user_id", delete(delete_user))
        // Transaction CRUD routes
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions", get(get_transactions))
        .route("/api/v1/transactions/:transaction_id", get(get_transaction))
        .route("/api/v1/transactions/:transaction_id", put(update_transaction))
        .route("/api/v1/transactions/:transaction_id", delete(delete_transaction))
        // Category budget routes
        .route("/api/v1/budgets", post(create_budget))
        .route("/api/v1/budgets", get(get_budgets))
        .route("/api/v1/budgets/warnings", get(get_budget_warnings))
        .route("/api/v1/budgets/:budget_id", put(update_budget))
        .route("/api/v1/budgets/:budget_id", delete(delete_budget))
        .route("/api/v1/budgets/:budget_id/recalculate", post(recalculate_budget))
        // Monthly budget routes
        .route("/api/v1/budgets/monthly", post(upsert_monthly_budget))
        .route("/api/v1/budgets/monthly/:month_year", get(get_monthly_budget))
        .route("/api/v1/budgets/monthly/:month_year", delete(delete_monthly_budget))
        // Category CRUD routes
        .route("/api/v1/categories", post(create_category))
        .route("/api/v1/categories", get(get_categories))
        .route("/api/v1/categories/:category_id", get(get_category))
        .route("/api/v1/categories/:category_id", put(update_category))
        .route("/api/v1/categories/:category_id", delete(delete_category))
        // Goal CRUD routes
        .route("/api/v1/goals", post(create_goal))
        .route("/api/v1/goals", get(get_goals))
        .route("/api/v1/goals/:goal_id", get(get_goal))
        .route("/api/v1/goals/:goal_id", put(update_goal))
        .route("/api/v1/goals/:goal_id", delete(delete_goal))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
