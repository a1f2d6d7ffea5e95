//! Statement builder.

use std::fmt;

use cbi_core::Table;

use super::{Ident, Literal};

/// SQL text assembled from static fragments, identifiers and literals.
///
/// Fragments are appended verbatim, so callers own the whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    sql: String,
}

impl Statement {
    pub fn new(fragment: &'static str) -> Self {
        Self {
            sql: fragment.to_string(),
        }
    }

    /// Append a fixed SQL fragment.
    pub fn kw(mut self, fragment: &'static str) -> Self {
        self.sql.push_str(fragment);
        self
    }

    pub fn ident(mut self, ident: &Ident) -> Self {
        self.sql.push_str(ident.quoted());
        self
    }

    /// Append the quoted name of a registered table.
    pub fn table(mut self, table: Table) -> Self {
        self.sql.push_str(Ident::from(table).quoted());
        self
    }

    pub fn literal(mut self, literal: &Literal) -> Self {
        self.sql.push_str(&literal.render());
        self
    }

    /// Append `(a, b), (c, d), ...` for the rows of a `VALUES` clause.
    pub fn values<I, R>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Literal]>,
    {
        for (i, row) in rows.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.sql.push('(');
            for (j, literal) in row.as_ref().iter().enumerate() {
                if j > 0 {
                    self.sql.push_str(", ");
                }
                self.sql.push_str(&literal.render());
            }
            self.sql.push(')');
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.sql
    }
}
