use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use common::MonthYear;
use compute::{ReconcileError, WarningScope};
use model::entities::category_budget;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListResponse, WarningsResponse};

pub mod monthly;

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

pub(crate) fn reconcile_status(error: &ReconcileError) -> StatusCode {
    match error {
        ReconcileError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,
        ReconcileError::BudgetNotFound { .. } => StatusCode::NOT_FOUND,
        ReconcileError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Request body for creating a category budget
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateBudgetRequest {
    pub category: String,
    /// Budget month (YYYY-MM)
    pub month_year: MonthYear,
    /// Positive spending limit for the month
    pub monthly_limit: Decimal,
    /// Create on behalf of another user (elevated roles only)
    pub user_id: Option<i32>,
}

/// Request body for updating a category budget
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBudgetRequest {
    pub category: Option<String>,
    pub month_year: Option<MonthYear>,
    pub monthly_limit: Option<Decimal>,
}

/// Category budget response model
#[derive(Debug, Serialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i32,
    pub user_id: i32,
    pub category: String,
    /// Budget month (YYYY-MM)
    pub month_year: String,
    pub monthly_limit: Decimal,
    /// Spend derived from the ledger at the last reconciliation
    pub current_spent: Decimal,
}

impl From<category_budget::Model> for BudgetResponse {
    fn from(model: category_budget::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category: model.category,
            month_year: model.month_year,
            monthly_limit: model.monthly_limit,
            current_spent: model.current_spent,
        }
    }
}

/// Query parameters for listing category budgets
#[derive(Debug, Deserialize, ToSchema)]
pub struct BudgetListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by month (YYYY-MM)
    pub month_year: Option<MonthYear>,
    /// Filter by category (case-insensitive exact match)
    pub category: Option<String>,
    /// Substring match against category and month
    pub search: Option<String>,
    /// Sort field: month_year, category or monthly_limit (default month_year)
    pub sort_by: Option<String>,
    /// Sort order: asc or desc (default desc)
    pub order: Option<String>,
    /// Another user's budgets (elevated roles only)
    pub user_id: Option<i32>,
}

/// Query parameters for the warnings endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct WarningsQuery {
    /// Narrow to one user (elevated roles only; elevated callers get
    /// every user's warnings when omitted)
    pub user_id: Option<i32>,
}

async fn find_owned(
    state: &AppState,
    auth: &AuthUser,
    budget_id: i32,
) -> Result<category_budget::Model, StatusCode> {
    let found = category_budget::Entity::find_by_id(budget_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up budget {}: {}", budget_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let Some(model) = found else {
        warn!("Budget with ID {} not found", budget_id);
        return Err(StatusCode::NOT_FOUND);
    };
    if model.user_id != auth.id && !auth.role.is_elevated() {
        warn!(caller = auth.id, owner = model.user_id, "Rejected cross-user budget access");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(model)
}

/// Create a category budget
#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    tag = "budgets",
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created with reconciled spend", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cross-user write without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn create_budget(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), StatusCode> {
    if request.monthly_limit <= Decimal::ZERO || request.category.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let owner = auth.effective_user_id(request.user_id)?;
    debug!("Creating category budget for user ID: {}", owner);

    let new_budget = category_budget::ActiveModel {
        user_id: Set(owner),
        category: Set(request.category.trim().to_string()),
        month_year: Set(request.month_year.to_string()),
        monthly_limit: Set(request.monthly_limit),
        current_spent: Set(Decimal::ZERO),
        ..Default::default()
    };

    let model = new_budget.insert(&state.db).await.map_err(|e| {
        error!("Failed to create budget: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // The budget may cover a month that already has expenses; reconcile
    // immediately so the response carries the real spend.
    let reconciled = compute::reconcile_category_budget(&state.db, model)
        .await
        .map_err(|e| {
            error!("Failed to reconcile new budget: {}", e);
            reconcile_status(&e)
        })?;

    info!("Budget created with ID: {}", reconciled.budget.id);
    let response = ApiResponse {
        data: BudgetResponse::from(reconciled.budget),
        message: "Budget created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List category budgets
#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    tag = "budgets",
    responses(
        (status = 200, description = "Budgets retrieved", body = ListResponse<BudgetResponse>),
        (status = 403, description = "Cross-user read without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_budgets(
    auth: AuthUser,
    Query(query): Query<BudgetListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<BudgetResponse>>, StatusCode> {
    let owner = auth.effective_user_id(query.user_id)?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let mut select =
        category_budget::Entity::find().filter(category_budget::Column::UserId.eq(owner));
    if let Some(month) = query.month_year {
        select = select.filter(category_budget::Column::MonthYear.eq(month.to_string()));
    }
    if let Some(category) = &query.category {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(category_budget::Column::Category)))
                .eq(category.to_lowercase()),
        );
    }
    if let Some(search) = &query.search {
        select = select.filter(
            Condition::any()
                .add(category_budget::Column::Category.contains(search))
                .add(category_budget::Column::MonthYear.contains(search)),
        );
    }

    let order = match query.order.as_deref() {
        Some("asc") => Order::Asc,
        _ => Order::Desc,
    };
    select = match query.sort_by.as_deref() {
        Some("category") => select.order_by(category_budget::Column::Category, order),
        Some("monthly_limit") => select.order_by(category_budget::Column::MonthlyLimit, order),
        _ => select
            .order_by(category_budget::Column::MonthYear, order)
            .order_by_asc(category_budget::Column::Category),
    };

    let paginator = select.paginate(&state.db, limit);
    let counts = paginator.num_items_and_pages().await.map_err(|e| {
        error!("Failed to count budgets: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let rows = paginator.fetch_page(page - 1).await.map_err(|e| {
        error!("Failed to fetch budget page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(BudgetResponse::from).collect(),
        message: "Budgets retrieved successfully".to_string(),
        success: true,
        page,
        limit,
        total: counts.number_of_items,
        pages: counts.number_of_pages,
    }))
}

/// Update a category budget
#[utoipa::path(
    put,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated with reconciled spend", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not your budget", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn update_budget(
    auth: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<Json<ApiResponse<BudgetResponse>>, StatusCode> {
    if matches!(request.monthly_limit, Some(limit) if limit <= Decimal::ZERO) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let existing = find_owned(&state, &auth, budget_id).await?;
    let mut active: category_budget::ActiveModel = existing.into();
    if let Some(category) = request.category {
        if category.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        active.category = Set(category.trim().to_string());
    }
    if let Some(month) = request.month_year {
        active.month_year = Set(month.to_string());
    }
    if let Some(limit) = request.monthly_limit {
        active.monthly_limit = Set(limit);
    }

    let updated = active.update(&state.db).await.map_err(|e| {
        error!("Failed to update budget {}: {}", budget_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Category or month changes move the budget to a different slice of
    // the ledger; recompute the spend against the new scope.
    let reconciled = compute::reconcile_category_budget(&state.db, updated)
        .await
        .map_err(|e| {
            error!("Failed to reconcile updated budget: {}", e);
            reconcile_status(&e)
        })?;

    info!("Budget with ID {} updated successfully", budget_id);
    Ok(Json(ApiResponse {
        data: BudgetResponse::from(reconciled.budget),
        message: "Budget updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a category budget
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget deleted", body = ApiResponse<String>),
        (status = 403, description = "Not your budget", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn delete_budget(
    auth: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    find_owned(&state, &auth, budget_id).await?;

    category_budget::Entity::delete_by_id(budget_id)
        .exec(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to delete budget {}: {}", budget_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("Budget with ID {} deleted successfully", budget_id);
    Ok(Json(ApiResponse {
        data: format!("Budget {} deleted", budget_id),
        message: "Budget deleted successfully".to_string(),
        success: true,
    }))
}

/// Recompute one budget's spend from the ledger
#[utoipa::path(
    post,
    path = "/api/v1/budgets/{budget_id}/recalculate",
    tag = "budgets",
    params(
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget reconciled", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Budget has an invalid period", body = ErrorResponse),
        (status = 403, description = "Not your budget", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn recalculate_budget(
    auth: AuthUser,
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BudgetResponse>>, StatusCode> {
    let existing = find_owned(&state, &auth, budget_id).await?;

    let reconciled = compute::reconcile_category_budget(&state.db, existing)
        .await
        .map_err(|e| {
            error!("Failed to reconcile budget {}: {}", budget_id, e);
            reconcile_status(&e)
        })?;

    info!(
        "Budget with ID {} reconciled, spend: {}",
        budget_id, reconciled.budget.current_spent
    );
    Ok(Json(ApiResponse {
        data: BudgetResponse::from(reconciled.budget),
        message: "Budget recalculated successfully".to_string(),
        success: true,
    }))
}

/// List budget warnings for exceeded budgets
#[utoipa::path(
    get,
    path = "/api/v1/budgets/warnings",
    tag = "budgets",
    responses(
        (status = 200, description = "Warnings retrieved, category budgets first", body = WarningsResponse),
        (status = 403, description = "Cross-user read without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_budget_warnings(
    auth: AuthUser,
    Query(query): Query<WarningsQuery>,
    State(state): State<AppState>,
) -> Result<Json<WarningsResponse>, StatusCode> {
    let scope = match query.user_id {
        Some(user_id) => WarningScope::User(auth.effective_user_id(Some(user_id))?),
        None if auth.role.is_elevated() => WarningScope::All,
        None => WarningScope::User(auth.id),
    };

    let warnings = compute::list_warnings(&state.db, scope).await.map_err(|e| {
        error!("Failed to aggregate budget warnings: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    debug!("Aggregated {} budget warnings", warnings.len());
    Ok(Json(WarningsResponse {
        count: warnings.len(),
        data: warnings,
        success: true,
    }))
}
