//! Bound parameter values for warehouse inserts

use duckdb::types::{ToSql, ToSqlOutput, Value};
use std::fmt;

/// A single typed value bound into an insert statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Text rendering used for key comparisons, matching DuckDB's
    /// `CAST(col AS VARCHAR)` for the key column types in use. `Null` has no
    /// key.
    pub fn as_key(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(b) => Some(b.to_string()),
            SqlValue::Int(i) => Some(i.to_string()),
            SqlValue::Float(f) => Some(f.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(b) => Value::Boolean(*b),
            SqlValue::Int(i) => Value::BigInt(*i),
            SqlValue::Float(f) => Value::Double(*f),
            SqlValue::Text(s) => Value::Text(s.clone()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(SqlValue::Int(3).as_key().as_deref(), Some("3"));
        assert_eq!(SqlValue::from("STU000001").as_key().as_deref(), Some("STU000001"));
        assert_eq!(SqlValue::Null.as_key(), None);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(SqlValue::from(None::<f64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(2.5)), SqlValue::Float(2.5));
    }
}
