// SPDX-License-Identifier: Apache-2.0

//! SQL dialects
//!
//! Quoting, literal formatting and placeholder rules for each supported
//! relational backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::value::Value;

/// SQL dialect for the supported relational stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn from_driver_id(driver_id: &str) -> Option<Self> {
        match driver_id.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "sqlite" | "sqlite3" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    /// Quote a single identifier according to the dialect
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
            Dialect::MySql => {
                format!("`{}`", name.replace('`', "``"))
            }
        }
    }

    /// Quote a possibly dotted identifier (`table.column`), leaving a
    /// trailing `*` bare.
    pub fn quote_qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.quote_ident(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Format a string as a SQL string literal
    pub fn quote_literal(&self, s: &str) -> String {
        match self {
            Dialect::Postgres => {
                let needs_e_prefix = s.chars().any(|c| matches!(c, '\\' | '\n' | '\r' | '\t'));
                if !needs_e_prefix {
                    return format!("'{}'", s.replace('\'', "''"));
                }

                let mut escaped = String::with_capacity(s.len() + 2);
                for ch in s.chars() {
                    match ch {
                        '\\' => escaped.push_str("\\\\"),
                        '\'' => escaped.push_str("''"),
                        '\n' => escaped.push_str("\\n"),
                        '\r' => escaped.push_str("\\r"),
                        '\t' => escaped.push_str("\\t"),
                        _ => escaped.push(ch),
                    }
                }
                format!("E'{}'", escaped)
            }
            Dialect::MySql => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('\'', "''")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t")
                    .replace('\0', "\\0");
                format!("'{}'", escaped)
            }
            Dialect::Sqlite => format!("'{}'", s.replace('\'', "''")),
        }
    }

    /// Format a value as an inline SQL literal
    pub fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match self {
                Dialect::Postgres => if *b { "TRUE" } else { "FALSE" }.to_string(),
                Dialect::MySql | Dialect::Sqlite => if *b { "1" } else { "0" }.to_string(),
            },
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.is_finite() {
                    format!("{}", f)
                } else {
                    "NULL".to_string()
                }
            }
            Value::Text(s) => self.quote_literal(s),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                match self {
                    Dialect::Postgres => format!("'\\x{}'", hex),
                    Dialect::MySql | Dialect::Sqlite => format!("X'{}'", hex),
                }
            }
            Value::Json(j) => self.quote_literal(&j.to_string()),
        }
    }

    /// Positional placeholder for the `index`-th (1-based) bound parameter
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// `LIMIT` value meaning "no limit", for dialects that cannot express an
    /// `OFFSET` on its own.
    pub(crate) fn unbounded_limit(&self) -> Option<&'static str> {
        match self {
            Dialect::Postgres => None,
            Dialect::MySql => Some("18446744073709551615"),
            Dialect::Sqlite => Some("-1"),
        }
    }

    /// Opening and closing text around one branch of a compound select.
    ///
    /// SQLite rejects parenthesized compound members, so branches are
    /// turned into derived tables there instead.
    pub(crate) fn branch_delimiters(&self) -> (&'static str, &'static str) {
        match self {
            Dialect::Postgres | Dialect::MySql => ("(", ")"),
            Dialect::Sqlite => ("SELECT * FROM (", ")"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_driver_id(s).ok_or_else(|| QueryError::UnknownDialect {
            name: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_postgres() {
        let dialect = Dialect::Postgres;
        assert_eq!(dialect.quote_ident("users"), "\"users\"");
        assert_eq!(dialect.quote_ident("user\"name"), "\"user\"\"name\"");
    }

    #[test]
    fn test_quote_ident_mysql() {
        let dialect = Dialect::MySql;
        assert_eq!(dialect.quote_ident("users"), "`users`");
        assert_eq!(dialect.quote_ident("user`name"), "`user``name`");
    }

    #[test]
    fn test_quote_qualified_keeps_star() {
        assert_eq!(Dialect::Sqlite.quote_qualified("posts.*"), "\"posts\".*");
        assert_eq!(Dialect::MySql.quote_qualified("posts.id"), "`posts`.`id`");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(Dialect::Postgres.quote_literal("it's"), "'it''s'");
        assert_eq!(Dialect::Postgres.quote_literal("a\\b"), "E'a\\\\b'");
        assert_eq!(Dialect::MySql.quote_literal("a\\'b"), "'a\\\\''b'");
        assert_eq!(Dialect::Sqlite.quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(Dialect::Postgres.format_value(&Value::Bool(true)), "TRUE");
        assert_eq!(Dialect::Sqlite.format_value(&Value::Bool(true)), "1");
        assert_eq!(Dialect::MySql.format_value(&Value::Bytes(vec![1, 255])), "X'01ff'");
        assert_eq!(Dialect::Postgres.format_value(&Value::Float(f64::NAN)), "NULL");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::MySql.placeholder(3), "?");
    }

    #[test]
    fn test_parse_dialect() {
        assert_eq!("pgsql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("MariaDB".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
