use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::user;

/// A spending limit for one user's whole month, across all categories.
/// Unique per (user_id, month_year), enforced by the schema.
/// `current_spent` is derived, same as on [`super::category_budget`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monthly_budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
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
