//! The warning aggregator.
//!
//! Walks every budget in scope, reconciles each against the ledger, and
//! collects a warning per exceeded budget. Category budgets of any month
//! are checked; monthly budgets only for the current calendar month.

use common::{MonthYear, Warning};
use model::entities::{category_budget, monthly_budget};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Select};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::reconcile::{reconcile_category_budget, reconcile_monthly_budget};

/// Which users' budgets the aggregator walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningScope {
    /// Budgets owned by one user.
    User(i32),
    /// Every budget in the store. Reserved for elevated callers.
    All,
}

impl WarningScope {
    fn apply<E: EntityTrait>(
        &self,
        query: Select<E>,
        user_col: impl ColumnTrait,
    ) -> Select<E> {
        match self {
            Self::User(id) => query.filter(user_col.eq(*id)),
            Self::All => query,
        }
    }
}

/// Reconcile every budget in scope and report the exceeded ones.
///
/// Category warnings come first, in store iteration order, then monthly
/// warnings for the current month. A reconciliation failure on one
/// budget is logged and skipped so one bad row cannot hide the rest;
/// every budget that does reconcile gets its `current_spent` persisted
/// as a side effect.
#[instrument(skip(db))]
pub async fn list_warnings(db: &DatabaseConnection, scope: WarningScope) -> Result<Vec<Warning>> {
    let mut warnings = Vec::new();

    let category_budgets = scope
        .apply(category_budget::Entity::find(), category_budget::Column::UserId)
        .all(db)
        .await?;
    for budget in category_budgets {
        let budget_id = budget.id;
        match reconcile_category_budget(db, budget).await {
            Ok(outcome) => warnings.extend(outcome.warning()),
            Err(error) => {
                warn!(budget_id, %error, "Skipping category budget that failed to reconcile");
            }
        }
    }

    let current = MonthYear::current().to_string();
    let monthly_budgets = scope
        .apply(monthly_budget::Entity::find(), monthly_budget::Column::UserId)
        .filter(monthly_budget::Column::MonthYear.eq(current))
        .all(db)
        .await?;
    for budget in monthly_budgets {
        let budget_id = budget.id;
        match reconcile_monthly_budget(db, budget).await {
            Ok(outcome) => warnings.extend(outcome.warning()),
            Err(error) => {
                warn!(budget_id, %error, "Skipping monthly budget that failed to reconcile");
            }
        }
    }

    debug!(count = warnings.len(), "Aggregated budget warnings");
    Ok(warnings)
}
