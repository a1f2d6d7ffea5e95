//! Identifier sanitizer and statement builder.
//!
//! Identifiers and value literals are different types with different
//! escaping rules. `Statement` only accepts `&'static str` fragments
//! alongside them, so text that did not come from the source code can
//! only reach SQL through one of the two escaping paths.

pub mod ident;
pub mod literal;
pub mod statement;

pub use ident::{quote_identifier, Ident};
pub use literal::Literal;
pub use statement::Statement;
