// SPDX-License-Identifier: Apache-2.0

//! Projection expressions.

use crate::render::SqlWriter;
use crate::value::Value;

/// A computed column expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference, optionally qualified (`table.column`, `table.*`)
    Column(String),
    /// Value rendered inline as a literal, never bound
    Literal(Value),
    /// `CAST(expr AS sql_type)`
    Cast { expr: Box<Expr>, sql_type: String },
    /// Trusted SQL fragment emitted verbatim (aggregates and the like)
    Raw(String),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expr::Literal(Value::Text(value.into()))
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    pub fn cast(self, sql_type: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            sql_type: sql_type.into(),
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> SelectItem {
        SelectItem {
            expr: self,
            alias: Some(alias.into()),
        }
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) {
        match self {
            Expr::Column(name) => w.push_ident(name),
            Expr::Literal(value) => {
                let literal = w.dialect().format_value(value);
                w.push(&literal);
            }
            Expr::Cast { expr, sql_type } => {
                w.push("CAST(");
                expr.write_to(w);
                w.push(" AS ");
                w.push(sql_type);
                w.push(")");
            }
            Expr::Raw(sql) => w.push(sql),
        }
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub(crate) fn write_to(&self, w: &mut SqlWriter) {
        self.expr.write_to(w);
        if let Some(alias) = &self.alias {
            w.push(" AS ");
            let quoted = w.dialect().quote_ident(alias);
            w.push(&quoted);
        }
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem { expr, alias: None }
    }
}

pub(crate) fn write_select_list(items: &[SelectItem], w: &mut SqlWriter) {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            w.push(", ");
        }
        item.write_to(w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn render(item: &SelectItem, dialect: Dialect) -> String {
        let mut w = SqlWriter::new(dialect);
        item.write_to(&mut w);
        w.finish().sql
    }

    #[test]
    fn renders_cast_literal_with_alias() {
        let item = Expr::text("post").cast("text").alias("tag_name");
        assert_eq!(
            render(&item, Dialect::Postgres),
            "CAST('post' AS text) AS \"tag_name\""
        );
    }

    #[test]
    fn literals_are_inlined_not_bound() {
        let mut w = SqlWriter::new(Dialect::MySql);
        SelectItem::from(Expr::text("o'neil")).write_to(&mut w);
        let compiled = w.finish();
        assert_eq!(compiled.sql, "'o''neil'");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn qualified_columns_are_quoted_per_segment() {
        let item = Expr::column("events.created_at").alias("sort");
        assert_eq!(render(&item, Dialect::MySql), "`events`.`created_at` AS `sort`");
    }
}
