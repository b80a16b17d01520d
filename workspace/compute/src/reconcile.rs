//! The reconciliation engine.
//!
//! A budget's `current_spent` is a cache of what the ledger says. Every
//! reconciliation recomputes that value from the transaction table for
//! the budget's month, persists it, and reports whether the budget is
//! exceeded. Re-running with an unchanged ledger writes the same value.

use common::{MonthYear, Warning};
use model::entities::{category_budget, monthly_budget};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{debug, instrument};

use crate::error::{ReconcileError, Result};
use crate::ledger;

/// A budget together with the outcome of its latest reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub budget: T,
    pub month: MonthYear,
    /// `current_spent > monthly_limit`, strictly. Spending exactly the
    /// limit does not exceed it.
    pub exceeded: bool,
    /// Zero when not exceeded.
    pub exceeded_by: Decimal,
    /// `round(spent / limit * 100)`, half away from zero.
    pub percentage: i64,
}

fn percentage_of(spent: Decimal, limit: Decimal) -> i64 {
    if limit.is_zero() {
        return 0;
    }
    (spent / limit * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

fn parse_month(month_year: &str) -> Result<MonthYear> {
    month_year
        .parse()
        .map_err(|e: common::ParseMonthYearError| ReconcileError::InvalidPeriod(e.to_string()))
}

/// Reconcile one category budget against the ledger.
///
/// Recomputes the spend for the budget's (user, category, month),
/// persists it as `current_spent`, and returns the refreshed budget.
#[instrument(skip(db, budget), fields(budget_id = budget.id, user_id = budget.user_id))]
pub async fn reconcile_category_budget(
    db: &DatabaseConnection,
    budget: category_budget::Model,
) -> Result<Reconciled<category_budget::Model>> {
    let month = parse_month(&budget.month_year)?;
    let (from, to) = month.date_range();
    let spent =
        ledger::sum_category_expenses(db, budget.user_id, &budget.category, from, to).await?;

    let limit = budget.monthly_limit;
    let mut active: category_budget::ActiveModel = budget.into();
    active.current_spent = Set(spent);
    let budget = active.update(db).await?;

    let exceeded = spent > limit;
    debug!(%spent, %limit, exceeded, "Reconciled category budget");
    Ok(Reconciled {
        month,
        exceeded,
        exceeded_by: if exceeded { spent - limit } else { Decimal::ZERO },
        percentage: percentage_of(spent, limit),
        budget,
    })
}

/// Reconcile one monthly budget against the ledger.
///
/// Same contract as [`reconcile_category_budget`], but the spend covers
/// every expense of the month regardless of category.
#[instrument(skip(db, budget), fields(budget_id = budget.id, user_id = budget.user_id))]
pub async fn reconcile_monthly_budget(
    db: &DatabaseConnection,
    budget: monthly_budget::Model,
) -> Result<Reconciled<monthly_budget::Model>> {
    let month = parse_month(&budget.month_year)?;
    let (from, to) = month.date_range();
    let spent = ledger::sum_expenses(db, budget.user_id, from, to).await?;

    let limit = budget.monthly_limit;
    let mut active: monthly_budget::ActiveModel = budget.into();
    active.current_spent = Set(spent);
    let budget = active.update(db).await?;

    let exceeded = spent > limit;
    debug!(%spent, %limit, exceeded, "Reconciled monthly budget");
    Ok(Reconciled {
        month,
        exceeded,
        exceeded_by: if exceeded { spent - limit } else { Decimal::ZERO },
        percentage: percentage_of(spent, limit),
        budget,
    })
}

/// Fetch a category budget by id and reconcile it.
#[instrument(skip(db))]
pub async fn reconcile_category_budget_by_id(
    db: &DatabaseConnection,
    budget_id: i32,
) -> Result<Reconciled<category_budget::Model>> {
    let budget = category_budget::Entity::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(ReconcileError::BudgetNotFound { id: budget_id })?;
    reconcile_category_budget(db, budget).await
}

impl Reconciled<category_budget::Model> {
    /// The warning this reconciliation produces, if the budget is exceeded.
    pub fn warning(&self) -> Option<Warning> {
        self.exceeded.then(|| Warning::Category {
            budget_id: self.budget.id,
            category: self.budget.category.clone(),
            monthly_limit: self.budget.monthly_limit,
            current_spent: self.budget.current_spent,
            exceeded_by: self.exceeded_by,
            percentage: self.percentage,
            month_year: self.month,
        })
    }
}

impl Reconciled<monthly_budget::Model> {
    /// The warning this reconciliation produces, if the budget is exceeded.
    pub fn warning(&self) -> Option<Warning> {
        self.exceeded.then(|| Warning::Monthly {
            monthly_limit: self.budget.monthly_limit,
            current_spent: self.budget.current_spent,
            exceeded_by: self.exceeded_by,
            percentage: self.percentage,
            month_year: self.month,
        })
    }
}
