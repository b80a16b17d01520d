use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod budgets;
pub mod categories;
pub mod goals;
pub mod health;
pub mod transactions;
pub mod users;

/// Deserializer for update-body fields where an absent key means "leave
/// unchanged" and an explicit `null` means "clear the value". Pair with
/// `#[serde(default)]`: absent stays `None`, present becomes `Some(_)`.
pub(crate) fn nullable_update<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
