use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::goal::{self, GoalPriority};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListResponse};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Request body for creating a savings goal
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateGoalRequest {
    pub name: String,
    /// Positive amount to save up
    pub target_amount: Decimal,
    /// Already saved (defaults to zero)
    pub current_amount: Option<Decimal>,
    pub target_date: NaiveDate,
    #[schema(value_type = String, example = "medium")]
    pub priority: GoalPriority,
    pub description: Option<String>,
    /// Create on behalf of another user (elevated roles only)
    pub user_id: Option<i32>,
}

/// Request body for updating a savings goal
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
    pub target_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "high")]
    pub priority: Option<GoalPriority>,
    /// Omit to keep the current description, send `null` to clear it
    #[serde(default, deserialize_with = "crate::handlers::nullable_update")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Savings goal response model
#[derive(Debug, Serialize, ToSchema)]
pub struct GoalResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: NaiveDate,
    #[schema(value_type = String, example = "medium")]
    pub priority: GoalPriority,
    pub description: Option<String>,
}

impl From<goal::Model> for GoalResponse {
    fn from(model: goal::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            target_amount: model.target_amount,
            current_amount: model.current_amount,
            target_date: model.target_date,
            priority: model.priority,
            description: model.description,
        }
    }
}

/// Query parameters for listing goals
#[derive(Debug, Deserialize, ToSchema)]
pub struct GoalListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by priority
    #[schema(value_type = Option<String>, example = "high")]
    pub priority: Option<GoalPriority>,
    /// Another user's goals (elevated roles only)
    pub user_id: Option<i32>,
}

async fn find_owned(
    state: &AppState,
    auth: &AuthUser,
    goal_id: i32,
) -> Result<goal::Model, StatusCode> {
    let found = goal::Entity::find_by_id(goal_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up goal {}: {}", goal_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let Some(model) = found else {
        warn!("Goal with ID {} not found", goal_id);
        return Err(StatusCode::NOT_FOUND);
    };
    if model.user_id != auth.id && !auth.role.is_elevated() {
        warn!(caller = auth.id, owner = model.user_id, "Rejected cross-user goal access");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(model)
}

/// Create a savings goal
#[utoipa::path(
    post,
    path = "/api/v1/goals",
    tag = "goals",
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created", body = ApiResponse<GoalResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cross-user write without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn create_goal(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GoalResponse>>), StatusCode> {
    if request.target_amount <= Decimal::ZERO || request.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if matches!(request.current_amount, Some(amount) if amount < Decimal::ZERO) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let owner = auth.effective_user_id(request.user_id)?;

    let new_goal = goal::ActiveModel {
        user_id: Set(owner),
        name: Set(request.name.trim().to_string()),
        target_amount: Set(request.target_amount),
        current_amount: Set(request.current_amount.unwrap_or(Decimal::ZERO)),
        target_date: Set(request.target_date),
        priority: Set(request.priority),
        description: Set(request.description),
        ..Default::default()
    };

    match new_goal.insert(&state.db).await {
        Ok(model) => {
            info!("Goal created with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: GoalResponse::from(model),
                    message: "Goal created successfully".to_string(),
                    success: true,
                }),
            ))
        }
        Err(db_error) => {
            error!("Failed to create goal: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// List savings goals
#[utoipa::path(
    get,
    path = "/api/v1/goals",
    tag = "goals",
    responses(
        (status = 200, description = "Goals retrieved", body = ListResponse<GoalResponse>),
        (status = 403, description = "Cross-user read without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_goals(
    auth: AuthUser,
    Query(query): Query<GoalListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<GoalResponse>>, StatusCode> {
    let owner = auth.effective_user_id(query.user_id)?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let mut select = goal::Entity::find().filter(goal::Column::UserId.eq(owner));
    if let Some(priority) = query.priority {
        select = select.filter(goal::Column::Priority.eq(priority));
    }
    select = select.order_by_asc(goal::Column::TargetDate);

    let paginator = select.paginate(&state.db, limit);
    let counts = paginator.num_items_and_pages().await.map_err(|e| {
        error!("Failed to count goals: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let rows = paginator.fetch_page(page - 1).await.map_err(|e| {
        error!("Failed to fetch goal page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(GoalResponse::from).collect(),
        message: "Goals retrieved successfully".to_string(),
        success: true,
        page,
        limit,
        total: counts.number_of_items,
        pages: counts.number_of_pages,
    }))
}

/// Get a specific goal by ID
#[utoipa::path(
    get,
    path = "/api/v1/goals/{goal_id}",
    tag = "goals",
    params(
        ("goal_id" = i32, Path, description = "Goal ID"),
    ),
    responses(
        (status = 200, description = "Goal retrieved", body = ApiResponse<GoalResponse>),
        (status = 403, description = "Not your goal", body = ErrorResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_goal(
    auth: AuthUser,
    Path(goal_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GoalResponse>>, StatusCode> {
    let model = find_owned(&state, &auth, goal_id).await?;
    Ok(Json(ApiResponse {
        data: GoalResponse::from(model),
        message: "Goal retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a savings goal
#[utoipa::path(
    put,
    path = "/api/v1/goals/{goal_id}",
    tag = "goals",
    params(
        ("goal_id" = i32, Path, description = "Goal ID"),
    ),
    request_body = UpdateGoalRequest,
    responses(
        (status = 200, description = "Goal updated", body = ApiResponse<GoalResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not your goal", body = ErrorResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn update_goal(
    auth: AuthUser,
    Path(goal_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateGoalRequest>,
) -> Result<Json<ApiResponse<GoalResponse>>, StatusCode> {
    if matches!(request.target_amount, Some(amount) if amount <= Decimal::ZERO) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if matches!(request.current_amount, Some(amount) if amount < Decimal::ZERO) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let existing = find_owned(&state, &auth, goal_id).await?;
    let mut active: goal::ActiveModel = existing.into();
    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(target_amount) = request.target_amount {
        active.target_amount = Set(target_amount);
    }
    if let Some(current_amount) = request.current_amount {
        active.current_amount = Set(current_amount);
    }
    if let Some(target_date) = request.target_date {
        active.target_date = Set(target_date);
    }
    if let Some(priority) = request.priority {
        active.priority = Set(priority);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Goal with ID {} updated successfully", goal_id);
            Ok(Json(ApiResponse {
                data: GoalResponse::from(updated),
                message: "Goal updated successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to update goal {}: {}", goal_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a savings goal
#[utoipa::path(
    delete,
    path = "/api/v1/goals/{goal_id}",
    tag = "goals",
    params(
        ("goal_id" = i32, Path, description = "Goal ID"),
    ),
    responses(
        (status = 200, description = "Goal deleted", body = ApiResponse<String>),
        (status = 403, description = "Not your goal", body = ErrorResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn delete_goal(
    auth: AuthUser,
    Path(goal_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    find_owned(&state, &auth, goal_id).await?;

    match goal::Entity::delete_by_id(goal_id).exec(&state.db).await {
        Ok(_) => {
            info!("Goal with ID {} deleted successfully", goal_id);
            Ok(Json(ApiResponse {
                data: format!("Goal {} deleted", goal_id),
                message: "Goal deleted successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to delete goal {}: {}", goal_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
