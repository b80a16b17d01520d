//! Ledger-write hooks.
//!
//! Every transaction create, update, or delete that touches expense rows
//! must leave the matching budgets' `current_spent` caches fresh. The
//! handlers call into here after the ledger write lands.

use common::{MonthYear, Warning};
use model::entities::transaction::{self, TransactionKind};
use model::entities::{category_budget, monthly_budget};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::reconcile::{reconcile_category_budget, reconcile_monthly_budget};

/// The (owner, category, month) triple a ledger write lands in. Budgets
/// are matched against this, category case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteScope {
    pub user_id: i32,
    pub category: String,
    pub month: MonthYear,
}

impl WriteScope {
    pub fn of(tx: &transaction::Model) -> Self {
        Self {
            user_id: tx.user_id,
            category: tx.category.clone(),
            month: MonthYear::from_date(tx.date),
        }
    }

    fn matches(&self, other: &Self) -> bool {
        self.user_id == other.user_id
            && self.month == other.month
            && self.category.eq_ignore_ascii_case(&other.category)
    }
}

/// Reconcile the budgets a scope touches.
///
/// Returns at most one warning: the category budget's if one matches and
/// is exceeded, otherwise the monthly budget's. When neither budget
/// exists this is a no-op, not an error; users without budgets record
/// transactions freely.
#[instrument(skip(db))]
pub async fn refresh_scope(db: &DatabaseConnection, scope: &WriteScope) -> Result<Option<Warning>> {
    let month_key = scope.month.to_string();

    let category_budget = category_budget::Entity::find()
        .filter(category_budget::Column::UserId.eq(scope.user_id))
        .filter(category_budget::Column::MonthYear.eq(month_key.as_str()))
        .filter(
            Expr::expr(Func::lower(Expr::col(category_budget::Column::Category)))
                .eq(scope.category.to_lowercase()),
        )
        .one(db)
        .await?;
    let category_warning = match category_budget {
        Some(budget) => reconcile_category_budget(db, budget).await?.warning(),
        None => None,
    };

    let monthly_budget = monthly_budget::Entity::find()
        .filter(monthly_budget::Column::UserId.eq(scope.user_id))
        .filter(monthly_budget::Column::MonthYear.eq(month_key.as_str()))
        .one(db)
        .await?;
    let monthly_warning = match monthly_budget {
        Some(budget) => reconcile_monthly_budget(db, budget).await?.warning(),
        None => None,
    };

    debug!(
        category_exceeded = category_warning.is_some(),
        monthly_exceeded = monthly_warning.is_some(),
        "Refreshed budgets for ledger write"
    );
    Ok(category_warning.or(monthly_warning))
}

/// Hook for a freshly created transaction. Income rows never move a
/// budget, so they skip reconciliation entirely.
#[instrument(skip(db, tx), fields(tx_id = tx.id, user_id = tx.user_id))]
pub async fn after_create(
    db: &DatabaseConnection,
    tx: &transaction::Model,
) -> Result<Option<Warning>> {
    if tx.kind != TransactionKind::Expense {
        return Ok(None);
    }
    refresh_scope(db, &WriteScope::of(tx)).await
}

/// Hook for an updated transaction.
///
/// When the edit moved the row between scopes (category or month
/// changed), the budgets it used to count against are refreshed too so
/// they do not keep the stale spend.
#[instrument(skip(db, old, new), fields(tx_id = new.id, user_id = new.user_id))]
pub async fn after_update(
    db: &DatabaseConnection,
    old: &transaction::Model,
    new: &transaction::Model,
) -> Result<Option<Warning>> {
    let old_scope = WriteScope::of(old);
    let new_scope = WriteScope::of(new);

    if old.kind == TransactionKind::Expense && !old_scope.matches(&new_scope) {
        refresh_scope(db, &old_scope).await?;
    }
    if new.kind == TransactionKind::Expense || old.kind == TransactionKind::Expense {
        return refresh_scope(db, &new_scope).await;
    }
    Ok(None)
}

/// Hook for a deleted transaction. Runs after the row is gone.
#[instrument(skip(db, tx), fields(tx_id = tx.id, user_id = tx.user_id))]
pub async fn after_delete(db: &DatabaseConnection, tx: &transaction::Model) -> Result<()> {
    if tx.kind != TransactionKind::Expense {
        return Ok(());
    }
    refresh_scope(db, &WriteScope::of(tx)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{category_budget, expense, income, monthly_budget, setup_db, user};
    use chrono::NaiveDate;
    use model::entities::prelude::CategoryBudget;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, ModelTrait, Set};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_create_refreshes_matching_budgets() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        let cat = category_budget(&db, owner.id, "food", "2024-03", "100").await;
        let monthly = monthly_budget(&db, owner.id, "2024-03", "500").await;

        let tx = expense(&db, owner.id, "60", "Food", day(2024, 3, 10)).await;
        let warning = after_create(&db, &tx).await.unwrap();
        assert!(warning.is_none());

        let cat = CategoryBudget::find_by_id(cat.id).one(&db).await.unwrap().unwrap();
        assert_eq!(cat.current_spent, dec("60"));
        let monthly = model::entities::prelude::MonthlyBudget::find_by_id(monthly.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(monthly.current_spent, dec("60"));
    }

    #[tokio::test]
    async fn test_create_warning_prefers_category_budget() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        category_budget(&db, owner.id, "food", "2024-03", "50").await;
        monthly_budget(&db, owner.id, "2024-03", "40").await;

        let tx = expense(&db, owner.id, "60", "food", day(2024, 3, 10)).await;
        let warning = after_create(&db, &tx).await.unwrap().unwrap();
        assert!(matches!(warning, Warning::Category { exceeded_by, .. } if exceeded_by == dec("10")));
    }

    #[tokio::test]
    async fn test_create_warning_falls_back_to_monthly_budget() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        monthly_budget(&db, owner.id, "2024-03", "40").await;

        let tx = expense(&db, owner.id, "60", "food", day(2024, 3, 10)).await;
        let warning = after_create(&db, &tx).await.unwrap().unwrap();
        assert!(matches!(warning, Warning::Monthly { exceeded_by, .. } if exceeded_by == dec("20")));
    }

    #[tokio::test]
    async fn test_no_matching_budget_is_a_silent_noop() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        // Budget for a different month and category.
        category_budget(&db, owner.id, "travel", "2024-01", "10").await;

        let tx = expense(&db, owner.id, "60", "food", day(2024, 3, 10)).await;
        let warning = after_create(&db, &tx).await.unwrap();
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn test_income_does_not_touch_budgets() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        let budget = category_budget(&db, owner.id, "salary", "2024-03", "10").await;

        let tx = income(&db, owner.id, "5000", "salary", day(2024, 3, 10)).await;
        let warning = after_create(&db, &tx).await.unwrap();
        assert!(warning.is_none());

        let stored = CategoryBudget::find_by_id(budget.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.current_spent, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_recategorized_update_refreshes_old_scope_too() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        let food = category_budget(&db, owner.id, "food", "2024-03", "100").await;
        let travel = category_budget(&db, owner.id, "travel", "2024-03", "100").await;

        let tx = expense(&db, owner.id, "60", "food", day(2024, 3, 10)).await;
        after_create(&db, &tx).await.unwrap();

        // Move the expense from food to travel.
        let old = tx.clone();
        let mut active: transaction::ActiveModel = tx.into();
        active.category = Set("travel".to_string());
        let new = active.update(&db).await.unwrap();
        after_update(&db, &old, &new).await.unwrap();

        let food = CategoryBudget::find_by_id(food.id).one(&db).await.unwrap().unwrap();
        let travel = CategoryBudget::find_by_id(travel.id).one(&db).await.unwrap().unwrap();
        assert_eq!(food.current_spent, Decimal::ZERO);
        assert_eq!(travel.current_spent, dec("60"));
    }

    #[tokio::test]
    async fn test_moved_month_refreshes_both_months() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        let march = monthly_budget(&db, owner.id, "2024-03", "100").await;
        let april = monthly_budget(&db, owner.id, "2024-04", "100").await;

        let tx = expense(&db, owner.id, "60", "food", day(2024, 3, 10)).await;
        after_create(&db, &tx).await.unwrap();

        let old = tx.clone();
        let mut active: transaction::ActiveModel = tx.into();
        active.date = Set(day(2024, 4, 2));
        let new = active.update(&db).await.unwrap();
        after_update(&db, &old, &new).await.unwrap();

        let march = model::entities::prelude::MonthlyBudget::find_by_id(march.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let april = model::entities::prelude::MonthlyBudget::find_by_id(april.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(march.current_spent, Decimal::ZERO);
        assert_eq!(april.current_spent, dec("60"));
    }

    #[tokio::test]
    async fn test_delete_refreshes_budget() {
        let db = setup_db().await;
        let owner = user(&db, "alice").await;
        let budget = category_budget(&db, owner.id, "food", "2024-03", "100").await;

        expense(&db, owner.id, "80", "food", day(2024, 3, 5)).await;
        let doomed = expense(&db, owner.id, "50", "food", day(2024, 3, 10)).await;
        after_create(&db, &doomed).await.unwrap();

        let snapshot = doomed.clone();
        doomed.delete(&db).await.unwrap();
        after_delete(&db, &snapshot).await.unwrap();

        let stored = CategoryBudget::find_by_id(budget.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.current_spent, dec("80"));
    }
}
