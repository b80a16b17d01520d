use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use model::entities::category;
use model::entities::transaction::TransactionKind;
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

/// Request body for creating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[schema(value_type = String, example = "expense")]
    pub kind: TransactionKind,
    pub description: Option<String>,
    /// Create on behalf of another user (elevated roles only)
    pub user_id: Option<i32>,
}

/// Request body for updating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>, example = "expense")]
    pub kind: Option<TransactionKind>,
    /// Omit to keep the current description, send `null` to clear it
    #[serde(default, deserialize_with = "crate::handlers::nullable_update")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Category response model
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    #[schema(value_type = String, example = "expense")]
    pub kind: TransactionKind,
    pub description: Option<String>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: model.kind,
            description: model.description,
        }
    }
}

/// Query parameters for listing categories
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by kind
    #[schema(value_type = Option<String>, example = "expense")]
    pub kind: Option<TransactionKind>,
    /// Substring match against the name
    pub search: Option<String>,
    /// Another user's categories (elevated roles only)
    pub user_id: Option<i32>,
}

async fn find_owned(
    state: &AppState,
    auth: &AuthUser,
    category_id: i32,
) -> Result<category::Model, StatusCode> {
    let found = category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up category {}: {}", category_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let Some(model) = found else {
        warn!("Category with ID {} not found", category_id);
        return Err(StatusCode::NOT_FOUND);
    };
    if model.user_id != auth.id && !auth.role.is_elevated() {
        warn!(caller = auth.id, owner = model.user_id, "Rejected cross-user category access");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(model)
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cross-user write without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), StatusCode> {
    if request.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let owner = auth.effective_user_id(request.user_id)?;

    let new_category = category::ActiveModel {
        user_id: Set(owner),
        name: Set(request.name.trim().to_string()),
        kind: Set(request.kind),
        description: Set(request.description),
        ..Default::default()
    };

    match new_category.insert(&state.db).await {
        Ok(model) => {
            info!("Category created with ID: {}", model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: CategoryResponse::from(model),
                    message: "Category created successfully".to_string(),
                    success: true,
                }),
            ))
        }
        Err(db_error) => {
            error!("Failed to create category: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Categories retrieved", body = ListResponse<CategoryResponse>),
        (status = 403, description = "Cross-user read without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_categories(
    auth: AuthUser,
    Query(query): Query<CategoryListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<CategoryResponse>>, StatusCode> {
    let owner = auth.effective_user_id(query.user_id)?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let mut select = category::Entity::find().filter(category::Column::UserId.eq(owner));
    if let Some(kind) = query.kind {
        select = select.filter(category::Column::Kind.eq(kind));
    }
    if let Some(search) = &query.search {
        select = select.filter(category::Column::Name.contains(search));
    }
    select = select.order_by_asc(category::Column::Name);

    let paginator = select.paginate(&state.db, limit);
    let counts = paginator.num_items_and_pages().await.map_err(|e| {
        error!("Failed to count categories: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let rows = paginator.fetch_page(page - 1).await.map_err(|e| {
        error!("Failed to fetch category page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(CategoryResponse::from).collect(),
        message: "Categories retrieved successfully".to_string(),
        success: true,
        page,
        limit,
        total: counts.number_of_items,
        pages: counts.number_of_pages,
    }))
}

/// Get a specific category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category retrieved", body = ApiResponse<CategoryResponse>),
        (status = 403, description = "Not your category", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_category(
    auth: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CategoryResponse>>, StatusCode> {
    let model = find_owned(&state, &auth, category_id).await?;
    Ok(Json(ApiResponse {
        data: CategoryResponse::from(model),
        message: "Category retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not your category", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn update_category(
    auth: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, StatusCode> {
    let existing = find_owned(&state, &auth, category_id).await?;

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(kind) = request.kind {
        active.kind = Set(kind);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }

    match active.update(&state.db).await {
        Ok(updated) => {
            info!("Category with ID {} updated successfully", category_id);
            Ok(Json(ApiResponse {
                data: CategoryResponse::from(updated),
                message: "Category updated successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to update category {}: {}", category_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<String>),
        (status = 403, description = "Not your category", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn delete_category(
    auth: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    find_owned(&state, &auth, category_id).await?;

    match category::Entity::delete_by_id(category_id).exec(&state.db).await {
        Ok(_) => {
            info!("Category with ID {} deleted successfully", category_id);
            Ok(Json(ApiResponse {
                data: format!("Category {} deleted", category_id),
                message: "Category deleted successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to delete category {}: {}", category_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
