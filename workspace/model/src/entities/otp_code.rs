use sea_orm::entity::prelude::*;

/// A short-lived one-time passcode issued at login.
///
/// At most one live code exists per email: issuing a new code deletes
/// any previous rows for the address. A code dies on successful
/// verification, on expiry, or after five failed attempts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub email: String,
    /// Six decimal digits.
    pub code: String,
    pub expires_at: DateTimeUtc,
    pub attempts: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
