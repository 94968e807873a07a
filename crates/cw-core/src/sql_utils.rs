//! SQL identifier and literal quoting
//!
//! Table and column names in the warehouse are generated from the declarative
//! schema, but source table names come from configuration, so every name that
//! reaches SQL goes through these helpers.

/// Quote a SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use cw_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("dim_student"), r#""dim_student""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially qualified name (e.g. `academics.students`).
///
/// # Examples
/// ```
/// use cw_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("academics.students"), r#""academics"."students""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("fact_grade"), r#""fact_grade""#);
    }

    #[test]
    fn test_quote_qualified_single_part() {
        assert_eq!(quote_qualified("students"), r#""students""#);
    }

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }
}
