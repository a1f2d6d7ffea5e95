//! Quoted SQL identifiers.

use std::fmt;

use cbi_core::Table;

/// Quote a table or column name for SQLite.
///
/// Wraps the name in double quotes and doubles any embedded double quote.
/// NUL characters are dropped.
pub fn quote_identifier(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for ch in raw.chars() {
        match ch {
            '"' => quoted.push_str("\"\""),
            '\0' => {}
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// An identifier that has already been quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    raw: String,
    quoted: String,
}

impl Ident {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let quoted = quote_identifier(&raw);
        Self { raw, quoted }
    }

    /// The scratch table used to rematerialize `table` in sorted order.
    pub fn sorted_scratch(table: Table) -> Self {
        Self::new(table.sorted_scratch_name())
    }

    /// The unquoted name.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The quoted form, ready to splice into SQL.
    pub fn quoted(&self) -> &str {
        &self.quoted
    }
}

impl From<Table> for Ident {
    fn from(table: Table) -> Self {
        Self::new(table.as_str())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_identifier("plain"), "\"plain\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[test]
    fn table_idents_use_registry_names() {
        let ident = Ident::from(Table::CovidCategories);
        assert_eq!(ident.raw(), "covid_rep_cats");
        assert_eq!(ident.quoted(), "\"covid_rep_cats\"");
        assert_eq!(
            Ident::sorted_scratch(Table::AirportTrips).raw(),
            "req_2_airport_trips_sorted"
        );
    }
}
