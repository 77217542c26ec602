// SPDX-License-Identifier: Apache-2.0

//! Per-driver rendering rules for feed SQL.
//!
//! PostgreSQL types a bare string literal as `unknown`, which cannot be
//! resolved across `UNION` branches, so the tag needs an explicit cast. Other
//! drivers take the literal as is.
//!
//! Keys of some store types are read back as text. PostgreSQL will not
//! compare those columns with a text parameter, so rehydration casts each
//! placeholder back to the key's store type.

use qore_query::Expr;

/// How a driver wants the tag literal rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLiteralRule {
    pub driver_id: &'static str,
    /// Type to `CAST` the literal to, if any
    pub cast_to: Option<&'static str>,
}

pub const TAG_LITERAL_RULES: &[TagLiteralRule] = &[
    TagLiteralRule {
        driver_id: "postgres",
        cast_to: Some("text"),
    },
    TagLiteralRule {
        driver_id: "mysql",
        cast_to: None,
    },
    TagLiteralRule {
        driver_id: "sqlite",
        cast_to: None,
    },
];

pub fn rule_for(driver_id: &str) -> Option<&'static TagLiteralRule> {
    TAG_LITERAL_RULES
        .iter()
        .find(|rule| rule.driver_id.eq_ignore_ascii_case(driver_id))
}

/// The tag as a select expression. Unknown drivers get the plain literal.
pub fn tag_literal(driver_id: &str, tag: &str) -> Expr {
    match rule_for(driver_id).and_then(|rule| rule.cast_to) {
        Some(sql_type) => Expr::text(tag).cast(sql_type),
        None => Expr::text(tag),
    }
}

/// Key column types a driver needs placeholder casts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCastRule {
    pub driver_id: &'static str,
    /// Store type names as reported in column metadata
    pub types: &'static [&'static str],
}

pub const KEY_CAST_RULES: &[KeyCastRule] = &[KeyCastRule {
    driver_id: "postgres",
    types: &[
        "UUID",
        "NUMERIC",
        "DATE",
        "TIME",
        "TIMESTAMP",
        "TIMESTAMPTZ",
    ],
}];

/// Type to cast rehydration placeholders to for a key column of
/// `store_type`, or `None` when the bound value compares as is.
pub fn key_cast(driver_id: &str, store_type: &str) -> Option<String> {
    KEY_CAST_RULES
        .iter()
        .find(|rule| rule.driver_id.eq_ignore_ascii_case(driver_id))
        .and_then(|rule| {
            rule.types
                .iter()
                .find(|t| t.eq_ignore_ascii_case(store_type))
        })
        .map(|t| t.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qore_query::{Dialect, Model};

    fn render(driver_id: &str, dialect: Dialect) -> String {
        Model::new("posts")
            .query()
            .select([tag_literal(driver_id, "post").alias("tag_name")])
            .to_sql(dialect)
    }

    #[test]
    fn postgres_casts_the_tag_to_text() {
        let sql = render("postgres", Dialect::Postgres);
        assert!(sql.contains("CAST('post' AS text)"), "{sql}");
    }

    #[test]
    fn other_drivers_use_the_bare_literal() {
        assert!(!render("mysql", Dialect::MySql).contains("CAST"));
        assert!(!render("sqlite", Dialect::Sqlite).contains("CAST"));
        assert!(!render("clickhouse", Dialect::Sqlite).contains("CAST"));
    }

    #[test]
    fn postgres_casts_text_read_keys_back_to_their_type() {
        assert_eq!(key_cast("postgres", "UUID").as_deref(), Some("uuid"));
        assert_eq!(key_cast("postgres", "NUMERIC").as_deref(), Some("numeric"));
        assert_eq!(key_cast("postgres", "INT8"), None);
        assert_eq!(key_cast("postgres", "TEXT"), None);
        assert_eq!(key_cast("mysql", "UUID"), None);
        assert_eq!(key_cast("sqlite", "NUMERIC"), None);
    }
}
