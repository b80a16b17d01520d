use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::Warning;
use model::entities::transaction::{self, TransactionKind};
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
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ListResponse};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Request body for recording a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Positive amount; direction comes from `kind`
    pub amount: Decimal,
    #[schema(value_type = String, example = "expense")]
    pub kind: TransactionKind,
    pub category: String,
    /// Calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    pub payment_method: String,
    pub description: Option<String>,
    /// Record on behalf of another user (elevated roles only)
    pub user_id: Option<i32>,
}

/// Request body for updating a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateTransactionRequest {
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "expense")]
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    /// Omit to keep the current description, send `null` to clear it
    #[serde(default, deserialize_with = "crate::handlers::nullable_update")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Transaction response model
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub user_id: i32,
    pub amount: Decimal,
    #[schema(value_type = String, example = "expense")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub payment_method: String,
    pub description: Option<String>,
}

impl From<transaction::Model> for TransactionResponse {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            kind: model.kind,
            category: model.category,
            date: model.date,
            payment_method: model.payment_method,
            description: model.description,
        }
    }
}

/// A freshly recorded transaction plus the budget warning it tripped, if any
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedTransaction {
    pub transaction: TransactionResponse,
    /// Present when the write pushed a matching budget over its limit;
    /// the category budget's warning wins over the monthly one
    pub budget_warning: Option<Warning>,
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransactionListQuery {
    /// Page number (1-based)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    /// Sort field: date, amount or category (default date)
    pub sort_by: Option<String>,
    /// Sort order: asc or desc (default desc)
    pub order: Option<String>,
    /// Substring match against description and category
    pub search: Option<String>,
    /// Filter by kind
    #[schema(value_type = Option<String>, example = "expense")]
    pub kind: Option<TransactionKind>,
    /// Filter by category (case-insensitive exact match)
    pub category: Option<String>,
    /// Earliest date (inclusive)
    pub start_date: Option<NaiveDate>,
    /// Latest date (inclusive)
    pub end_date: Option<NaiveDate>,
    /// Another user's ledger (elevated roles only)
    pub user_id: Option<i32>,
}

fn page_params(query: &TransactionListQuery) -> (u64, u64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

async fn find_owned(
    state: &AppState,
    auth: &AuthUser,
    transaction_id: i32,
) -> Result<transaction::Model, StatusCode> {
    let found = transaction::Entity::find_by_id(transaction_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up transaction {}: {}", transaction_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let Some(model) = found else {
        warn!("Transaction with ID {} not found", transaction_id);
        return Err(StatusCode::NOT_FOUND);
    };
    if model.user_id != auth.id && !auth.role.is_elevated() {
        warn!(
            caller = auth.id,
            owner = model.user_id,
            "Rejected cross-user transaction access"
        );
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(model)
}

/// Record a new transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = ApiResponse<CreatedTransaction>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cross-user write without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn create_transaction(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedTransaction>>), StatusCode> {
    if request.amount <= Decimal::ZERO {
        return Err(StatusCode::BAD_REQUEST);
    }
    if request.category.trim().is_empty() || request.payment_method.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let owner = auth.effective_user_id(request.user_id)?;
    debug!("Recording transaction for user ID: {}", owner);

    let new_transaction = transaction::ActiveModel {
        user_id: Set(owner),
        amount: Set(request.amount),
        kind: Set(request.kind),
        category: Set(request.category.trim().to_string()),
        date: Set(request.date),
        payment_method: Set(request.payment_method.trim().to_string()),
        description: Set(request.description),
        ..Default::default()
    };

    let model = new_transaction.insert(&state.db).await.map_err(|e| {
        error!("Failed to record transaction: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let budget_warning = compute::after_create(&state.db, &model).await.map_err(|e| {
        error!("Failed to refresh budgets after transaction create: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!(
        "Transaction recorded with ID: {}, warning: {}",
        model.id,
        budget_warning.is_some()
    );
    let response = ApiResponse {
        data: CreatedTransaction {
            transaction: TransactionResponse::from(model),
            budget_warning,
        },
        message: "Transaction recorded successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List transactions with pagination, filtering and sorting
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    responses(
        (status = 200, description = "Transactions retrieved", body = ListResponse<TransactionResponse>),
        (status = 403, description = "Cross-user read without elevation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_transactions(
    auth: AuthUser,
    Query(query): Query<TransactionListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<TransactionResponse>>, StatusCode> {
    let owner = auth.effective_user_id(query.user_id)?;
    let (page, limit) = page_params(&query);

    let mut select = transaction::Entity::find().filter(transaction::Column::UserId.eq(owner));
    if let Some(kind) = query.kind {
        select = select.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(category) = &query.category {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(transaction::Column::Category)))
                .eq(category.to_lowercase()),
        );
    }
    if let Some(search) = &query.search {
        select = select.filter(
            Condition::any()
                .add(transaction::Column::Description.contains(search))
                .add(transaction::Column::Category.contains(search)),
        );
    }
    if let Some(start) = query.start_date {
        select = select.filter(transaction::Column::Date.gte(start));
    }
    if let Some(end) = query.end_date {
        select = select.filter(transaction::Column::Date.lte(end));
    }

    let order = match query.order.as_deref() {
        Some("asc") => Order::Asc,
        _ => Order::Desc,
    };
    select = match query.sort_by.as_deref() {
        Some("amount") => select.order_by(transaction::Column::Amount, order),
        Some("category") => select.order_by(transaction::Column::Category, order),
        _ => select.order_by(transaction::Column::Date, order),
    };

    let paginator = select.paginate(&state.db, limit);
    let counts = paginator.num_items_and_pages().await.map_err(|e| {
        error!("Failed to count transactions: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let rows = paginator.fetch_page(page - 1).await.map_err(|e| {
        error!("Failed to fetch transaction page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    debug!(
        "Retrieved {} of {} transactions for user ID: {}",
        rows.len(),
        counts.number_of_items,
        owner
    );
    Ok(Json(ListResponse {
        data: rows.into_iter().map(TransactionResponse::from).collect(),
        message: "Transactions retrieved successfully".to_string(),
        success: true,
        page,
        limit,
        total: counts.number_of_items,
        pages: counts.number_of_pages,
    }))
}

/// Get a specific transaction by ID
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction retrieved", body = ApiResponse<TransactionResponse>),
        (status = 403, description = "Not your transaction", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn get_transaction(
    auth: AuthUser,
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TransactionResponse>>, StatusCode> {
    let model = find_owned(&state, &auth, transaction_id).await?;
    Ok(Json(ApiResponse {
        data: TransactionResponse::from(model),
        message: "Transaction retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a transaction
#[utoipa::path(
    put,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated", body = ApiResponse<CreatedTransaction>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not your transaction", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn update_transaction(
    auth: AuthUser,
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<ApiResponse<CreatedTransaction>>, StatusCode> {
    if matches!(request.amount, Some(amount) if amount <= Decimal::ZERO) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let old = find_owned(&state, &auth, transaction_id).await?;

    let mut active: transaction::ActiveModel = old.clone().into();
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(kind) = request.kind {
        active.kind = Set(kind);
    }
    if let Some(category) = request.category {
        if category.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        active.category = Set(category.trim().to_string());
    }
    if let Some(date) = request.date {
        active.date = Set(date);
    }
    if let Some(payment_method) = request.payment_method {
        active.payment_method = Set(payment_method.trim().to_string());
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }

    let new = active.update(&state.db).await.map_err(|e| {
        error!("Failed to update transaction {}: {}", transaction_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Both the old and new scopes get fresh spend figures, so moving a
    // transaction between categories or months never leaves a stale cache.
    let budget_warning = compute::after_update(&state.db, &old, &new).await.map_err(|e| {
        error!("Failed to refresh budgets after transaction update: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Transaction with ID {} updated successfully", transaction_id);
    Ok(Json(ApiResponse {
        data: CreatedTransaction {
            transaction: TransactionResponse::from(new),
            budget_warning,
        },
        message: "Transaction updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a transaction
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction deleted", body = ApiResponse<String>),
        (status = 403, description = "Not your transaction", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn delete_transaction(
    auth: AuthUser,
    Path(transaction_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    let model = find_owned(&state, &auth, transaction_id).await?;

    transaction::Entity::delete_by_id(transaction_id)
        .exec(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to delete transaction {}: {}", transaction_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    compute::after_delete(&state.db, &model).await.map_err(|e| {
        error!("Failed to refresh budgets after transaction delete: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Transaction with ID {} deleted successfully", transaction_id);
    Ok(Json(ApiResponse {
        data: format!("Transaction {} deleted", transaction_id),
        message: "Transaction deleted successfully".to_string(),
        success: true,
    }))
}
