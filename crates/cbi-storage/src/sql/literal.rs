//! SQL value literals.

use std::fmt;

/// A value rendered inline into SQL text.
///
/// Only needed where parameters cannot be bound, such as the rows of a
/// `VALUES` list built at run time. Everything else binds parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Literal {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Render as SQLite source text.
    ///
    /// Text is single-quoted with embedded quotes doubled and NUL characters
    /// dropped. Non-finite reals have no literal form and render as NULL.
    pub fn render(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Real(v) if v.is_finite() => format!("{v:?}"),
            Self::Real(_) => "NULL".to_string(),
            Self::Text(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('\'');
                for ch in s.chars() {
                    match ch {
                        '\'' => out.push_str("''"),
                        '\0' => {}
                        _ => out.push(ch),
                    }
                }
                out.push('\'');
                out
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_kind() {
        assert_eq!(Literal::Null.render(), "NULL");
        assert_eq!(Literal::Integer(-7).render(), "-7");
        assert_eq!(Literal::Real(50.0).render(), "50.0");
        assert_eq!(Literal::Real(f64::NAN).render(), "NULL");
        assert_eq!(Literal::text("O'Hare").render(), "'O''Hare'");
        assert_eq!(Literal::from(None::<i64>).render(), "NULL");
    }
}
