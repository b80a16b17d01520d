//! Transport-layer types shared between the compute crate and the HTTP
//! backend. The budget engine produces these shapes and the handlers
//! serialize them unchanged, so they live in one place.

mod month;
mod warning;

pub use month::{MonthYear, ParseMonthYearError};
pub use warning::Warning;
