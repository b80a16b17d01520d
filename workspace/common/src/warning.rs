use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::MonthYear;

/// A budget-exceeded warning.
///
/// Warnings are a transient projection produced fresh on every query from
/// reconciled budget state; they are never persisted. The serialized form
/// is tagged with `"type": "category"` or `"type": "monthly"` to match
/// the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Warning {
    /// A per-category budget was exceeded.
    Category {
        budget_id: i32,
        category: String,
        monthly_limit: Decimal,
        current_spent: Decimal,
        exceeded_by: Decimal,
        percentage: i64,
        month_year: MonthYear,
    },
    /// The whole-month spending budget was exceeded.
    Monthly {
        monthly_limit: Decimal,
        current_spent: Decimal,
        exceeded_by: Decimal,
        percentage: i64,
        month_year: MonthYear,
    },
}

impl Warning {
    pub fn month_year(&self) -> MonthYear {
        match self {
            Warning::Category { month_year, .. } | Warning::Monthly { month_year, .. } => {
                *month_year
            }
        }
    }

    pub fn exceeded_by(&self) -> Decimal {
        match self {
            Warning::Category { exceeded_by, .. } | Warning::Monthly { exceeded_by, .. } => {
                *exceeded_by
            }
        }
    }
}
