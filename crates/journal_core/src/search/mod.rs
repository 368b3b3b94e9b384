//! Text folding for entry search.
//!
//! # Responsibility
//! - Turn display strings and user filter text into one comparable form.
//! - Keep matching rules in one place for the SQL filter and its callers.

pub mod fold;
