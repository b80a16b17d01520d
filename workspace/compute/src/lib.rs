pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod trigger;
pub mod warnings;

pub use error::{ReconcileError, Result};
pub use reconcile::{
    Reconciled, reconcile_category_budget, reconcile_category_budget_by_id,
    reconcile_monthly_budget,
};
pub use trigger::{WriteScope, after_create, after_delete, after_update, refresh_scope};
pub use warnings::{WarningScope, list_warnings};
