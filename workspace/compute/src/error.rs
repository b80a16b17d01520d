use thiserror::Error;

/// Error types for budget reconciliation
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The budget's stored `month_year` could not be parsed
    #[error("Invalid budget period: {0}")]
    InvalidPeriod(String),

    /// A budget looked up by id does not exist
    #[error("Budget {id} not found")]
    BudgetNotFound { id: i32 },

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Type alias for Result with ReconcileError
pub type Result<T> = std::result::Result<T, ReconcileError>;
