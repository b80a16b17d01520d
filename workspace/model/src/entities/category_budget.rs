use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::user;

/// A spending limit for one category in one month.
///
/// `current_spent` is a derived cache, not an authoritative figure: the
/// reconciliation engine is the only writer and always recomputes it
/// from the transaction ledger. The application intends one budget per
/// (user, category, month) but the schema does not enforce it; the
/// engine therefore treats each row independently.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "category_budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    /// Matched case-insensitively against transaction categories.
    pub category: String,
    /// Canonical "YYYY-MM".
    pub month_year: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub monthly_limit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub current_spent: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
