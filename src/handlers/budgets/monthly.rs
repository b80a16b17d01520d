use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use common::MonthYear;
use model::entities::monthly_budget;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use super::reconcile_status;
use crate::auth::AuthUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating or replacing the month's budget
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpsertMonthlyBudgetRequest {
    /// Budget month (YYYY-MM)
    pub month_year: MonthYear,
    /// Positive spending limit for the whole month
    pub monthly_limit: Decimal,
    /// Target another user's budget (elevated roles only)
    pub user_id: Option<i32>,
}

/// Monthly budget response model
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyBudgetResponse {
    pub id: i32,
    pub user_id: i32,
    /// Budget month (YYYY-MM)
    pub month_year: String,
    pub monthly_limit: Decimal,
    /// Spend derived from the ledger at the last reconciliation
    pub current_spent: Decimal,
}

impl From<monthly_budget::Model> for MonthlyBudgetResponse {
    fn from(model: monthly_budget::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            month_year: model.month_year,
            monthly_limit: model.monthly_limit,
            current_spent: model.current_spent,
        }
    }
}

/// The state of one month: its budget, if any, and what the ledger says
/// was spent either way
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyBudgetStatus {
    /// Null when no budget exists for the month
    pub budget: Option<MonthlyBudgetResponse>,
    /// The month asked about (YYYY-MM)
    pub month_year: String,
    /// Total expenses of the month, freshly computed
    pub current_spent: Decimal,
}

/// Query parameters for monthly budget endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct MonthlyQuery {
    /// Another user's budget (elevated roles only)
    pub user_id: Option<i32>,
}

fn parse_month(raw: &str) -> Result<MonthYear, StatusCode> {
    raw.parse().map_err(|_| {
        warn!("Rejected malformed month identifier: {}", raw);
        StatusCode::BAD_REQUEST
    })
}

async fn find_for_month(
    state: &AppState,
    owner: i32,
    month: MonthYear,
) -> Result<Option<monthly_budget::Model>, StatusCode> {
    monthly_budget::Entity::find()
        .filter(monthly_budget::Column::UserId.eq(owner))
        .filter(monthly_budget::Column::MonthYear.eq(month.to_string()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up monthly budget: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Get the month's budget with a freshly reconciled spend
#[utoipa::path(
    get,
    path = "/api/v1/budgets/monthly/{month_year}",
    tag = "budgets",
    params(
        ("month_year" = String, Path, description = "Month in YYYY-MM format"),
    ),
    responses(
        (status = 200, description = "Month status; budget is null when none exists", body = ApiResponse<MonthlyBudgetStatus>),
        (status = 400, description = "Malformed month", body = ErrorResponse),
        (status = 403, description = "Cross-user read without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_monthly_budget(
    auth: AuthUser,
    Path(month_year): Path<String>,
    Query(query): Query<MonthlyQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MonthlyBudgetStatus>>, StatusCode> {
    let month = parse_month(&month_year)?;
    let owner = auth.effective_user_id(query.user_id)?;

    let status = match find_for_month(&state, owner, month).await? {
        Some(model) => {
            let reconciled = compute::reconcile_monthly_budget(&state.db, model)
                .await
                .map_err(|e| {
                    error!("Failed to reconcile monthly budget: {}", e);
                    reconcile_status(&e)
                })?;
            MonthlyBudgetStatus {
                current_spent: reconciled.budget.current_spent,
                month_year: month.to_string(),
                budget: Some(MonthlyBudgetResponse::from(reconciled.budget)),
            }
        }
        None => {
            // No budget for this month; still report what was spent.
            let (from, to) = month.date_range();
            let spent = compute::ledger::sum_expenses(&state.db, owner, from, to)
                .await
                .map_err(|e| {
                    error!("Failed to sum expenses for month {}: {}", month, e);
                    StatusCode::INTERNAL_SERVER_ERROR
                })?;
            MonthlyBudgetStatus {
                budget: None,
                month_year: month.to_string(),
                current_spent: spent,
            }
        }
    };

    debug!("Monthly budget status for {}: spend {}", month, status.current_spent);
    Ok(Json(ApiResponse {
        data: status,
        message: "Monthly budget retrieved successfully".to_string(),
        success: true,
    }))
}

/// Create or replace the budget for a month
#[utoipa::path(
    post,
    path = "/api/v1/budgets/monthly",
    tag = "budgets",
    request_body = UpsertMonthlyBudgetRequest,
    responses(
        (status = 200, description = "Existing monthly budget replaced", body = ApiResponse<MonthlyBudgetResponse>),
        (status = 201, description = "Monthly budget created", body = ApiResponse<MonthlyBudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cross-user write without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn upsert_monthly_budget(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<UpsertMonthlyBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MonthlyBudgetResponse>>), StatusCode> {
    if request.monthly_limit <= Decimal::ZERO {
        return Err(StatusCode::BAD_REQUEST);
    }
    let owner = auth.effective_user_id(request.user_id)?;

    // One budget per (user, month): replace the limit when one exists.
    let (model, created) = match find_for_month(&state, owner, request.month_year).await? {
        Some(existing) => {
            let mut active: monthly_budget::ActiveModel = existing.into();
            active.monthly_limit = Set(request.monthly_limit);
            let updated = active.update(&state.db).await.map_err(|e| {
                error!("Failed to update monthly budget: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            (updated, false)
        }
        None => {
            let inserted = monthly_budget::ActiveModel {
                user_id: Set(owner),
                month_year: Set(request.month_year.to_string()),
                monthly_limit: Set(request.monthly_limit),
                current_spent: Set(Decimal::ZERO),
                ..Default::default()
            }
            .insert(&state.db)
            .await
            .map_err(|e| {
                error!("Failed to create monthly budget: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            (inserted, true)
        }
    };

    let reconciled = compute::reconcile_monthly_budget(&state.db, model)
        .await
        .map_err(|e| {
            error!("Failed to reconcile monthly budget: {}", e);
            reconcile_status(&e)
        })?;

    info!(
        "Monthly budget {} for {}",
        if created { "created" } else { "replaced" },
        request.month_year
    );
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(ApiResponse {
            data: MonthlyBudgetResponse::from(reconciled.budget),
            message: "Monthly budget saved successfully".to_string(),
            success: true,
        }),
    ))
}

/// Delete the budget for a month
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/monthly/{month_year}",
    tag = "budgets",
    params(
        ("month_year" = String, Path, description = "Month in YYYY-MM format"),
    ),
    responses(
        (status = 200, description = "Monthly budget deleted", body = ApiResponse<String>),
        (status = 400, description = "Malformed month", body = ErrorResponse),
        (status = 403, description = "Cross-user write without elevation", body = ErrorResponse),
        (status = 404, description = "No budget for this month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn delete_monthly_budget(
    auth: AuthUser,
    Path(month_year): Path<String>,
    Query(query): Query<MonthlyQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    let month = parse_month(&month_year)?;
    let owner = auth.effective_user_id(query.user_id)?;

    let Some(existing) = find_for_month(&state, owner, month).await? else {
        warn!("No monthly budget for {} to delete", month);
        return Err(StatusCode::NOT_FOUND);
    };

    monthly_budget::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to delete monthly budget: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("Monthly budget for {} deleted successfully", month);
    Ok(Json(ApiResponse {
        data: format!("Monthly budget for {} deleted", month),
        message: "Monthly budget deleted successfully".to_string(),
        success: true,
    }))
}
