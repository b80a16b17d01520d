use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role attached to a user account. Regular users are hard-scoped to
/// their own rows; managers and admins may query across owners.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Elevated roles may pass explicit `user_id` filters and see rows
    /// belonging to other owners.
    pub fn is_elevated(&self) -> bool {
        matches!(self, UserRole::Manager | UserRole::Admin)
    }
}

/// Represents a user of the system.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt digest; never serialized in responses.
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
    #[sea_orm(has_many = "super::category::Entity")]
    Category,
    #[sea_orm(has_many = "super::category_budget::Entity")]
    CategoryBudget,
    #[sea_orm(has_many = "super::monthly_budget::Entity")]
    MonthlyBudget,
    #[sea_orm(has_many = "super::goal::Entity")]
    Goal,
}

impl ActiveModelBehavior for ActiveModel {}
