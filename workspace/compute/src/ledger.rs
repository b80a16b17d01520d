//! Ledger queries backing the reconciliation engine.
//!
//! Spending is always derived by re-reading the transaction table; the
//! cached `current_spent` columns are never consulted here.

use chrono::NaiveDate;
use model::entities::transaction::{self, TransactionKind};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, instrument};

use crate::error::Result;

/// Sum the expense amounts one user booked under a category within a date
/// window (inclusive on both ends).
///
/// The category match is case-insensitive but exact: "Food" and "food"
/// are the same category, "food delivery" is not.
#[instrument(skip(db))]
pub async fn sum_category_expenses(
    db: &DatabaseConnection,
    user_id: i32,
    category: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Decimal> {
    let rows = transaction::Entity::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::Date.between(from, to))
        .filter(
            Expr::expr(Func::lower(Expr::col(transaction::Column::Category)))
                .eq(category.to_lowercase()),
        )
        .all(db)
        .await?;

    let total: Decimal = rows.iter().map(|t| t.amount).sum();
    debug!(
        matched = rows.len(),
        %total,
        "Summed category expenses"
    );
    Ok(total)
}

/// Sum all expense amounts one user booked within a date window,
/// regardless of category.
#[instrument(skip(db))]
pub async fn sum_expenses(
    db: &DatabaseConnection,
    user_id: i32,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Decimal> {
    let rows = transaction::Entity::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::Date.between(from, to))
        .all(db)
        .await?;

    let total: Decimal = rows.iter().map(|t| t.amount).sum();
    debug!(
        matched = rows.len(),
        %total,
        "Summed monthly expenses"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{expense, income, setup_db, user};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_sum_is_exact_over_decimal_amounts() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;

        expense(&db, owner.id, "0.10", "food", day(2024, 3, 1)).await;
        expense(&db, owner.id, "0.20", "food", day(2024, 3, 2)).await;
        expense(&db, owner.id, "0.30", "food", day(2024, 3, 3)).await;

        let total =
            sum_category_expenses(&db, owner.id, "food", day(2024, 3, 1), day(2024, 3, 31))
                .await
                .unwrap();
        assert_eq!(total, "0.60".parse().unwrap());
    }

    #[tokio::test]
    async fn test_category_match_is_case_insensitive_and_exact() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;

        expense(&db, owner.id, "10", "Food", day(2024, 3, 5)).await;
        expense(&db, owner.id, "20", "FOOD", day(2024, 3, 6)).await;
        expense(&db, owner.id, "40", "food delivery", day(2024, 3, 7)).await;

        let total =
            sum_category_expenses(&db, owner.id, "food", day(2024, 3, 1), day(2024, 3, 31))
                .await
                .unwrap();
        assert_eq!(total, "30".parse().unwrap());
    }

    #[tokio::test]
    async fn test_income_and_other_users_are_excluded() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        let other = user(&db, "bob").await;

        expense(&db, owner.id, "50", "food", day(2024, 3, 5)).await;
        income(&db, owner.id, "500", "food", day(2024, 3, 6)).await;
        expense(&db, other.id, "70", "food", day(2024, 3, 7)).await;

        let total =
            sum_category_expenses(&db, owner.id, "food", day(2024, 3, 1), day(2024, 3, 31))
                .await
                .unwrap();
        assert_eq!(total, "50".parse().unwrap());
    }

    #[tokio::test]
    async fn test_window_bounds_are_inclusive() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;

        expense(&db, owner.id, "1", "food", day(2024, 2, 29)).await;
        expense(&db, owner.id, "2", "food", day(2024, 3, 1)).await;
        expense(&db, owner.id, "4", "food", day(2024, 3, 31)).await;
        expense(&db, owner.id, "8", "food", day(2024, 4, 1)).await;

        let total =
            sum_category_expenses(&db, owner.id, "food", day(2024, 3, 1), day(2024, 3, 31))
                .await
                .unwrap();
        assert_eq!(total, "6".parse().unwrap());
    }

    #[tokio::test]
    async fn test_sum_expenses_ignores_category() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;

        expense(&db, owner.id, "10", "food", day(2024, 3, 5)).await;
        expense(&db, owner.id, "25", "transport", day(2024, 3, 6)).await;
        income(&db, owner.id, "100", "salary", day(2024, 3, 7)).await;

        let total = sum_expenses(&db, owner.id, day(2024, 3, 1), day(2024, 3, 31))
            .await
            .unwrap();
        assert_eq!(total, "35".parse().unwrap());
    }
}
