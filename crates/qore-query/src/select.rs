// SPDX-License-Identifier: Apache-2.0

//! Single-model `SELECT` builder.

use serde::{Deserialize, Serialize};

use crate::bindings::{BindingKind, Bindings};
use crate::dialect::Dialect;
use crate::expr::{write_select_list, SelectItem};
use crate::model::Model;
use crate::order::{OrderBy, SortDirection};
use crate::render::{CompiledSql, SqlWriter};
use crate::value::Value;

/// Comparison operator for `WHERE` clauses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl Operator {
    fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
        }
    }
}

/// A `WHERE` condition. Conditions on one query are joined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        operator: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        /// Store type each placeholder is cast to, e.g. `uuid`.
        cast: Option<String>,
    },
    Null {
        column: String,
        negated: bool,
    },
}

impl Predicate {
    fn write_to(&self, w: &mut SqlWriter) {
        match self {
            Predicate::Compare {
                column,
                operator,
                value,
            } => {
                w.push_ident(column);
                w.push(" ");
                w.push(operator.as_sql());
                w.push(" ");
                w.push_param(value.clone());
            }
            Predicate::In {
                column,
                values,
                cast,
            } => {
                // An empty set can never match.
                if values.is_empty() {
                    w.push("0 = 1");
                    return;
                }
                w.push_ident(column);
                w.push(" IN (");
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        w.push(", ");
                    }
                    match cast {
                        Some(sql_type) => {
                            w.push("CAST(");
                            w.push_param(value.clone());
                            w.push(" AS ");
                            w.push(sql_type);
                            w.push(")");
                        }
                        None => w.push_param(value.clone()),
                    }
                }
                w.push(")");
            }
            Predicate::Null { column, negated } => {
                w.push_ident(column);
                w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
        }
    }

    fn values(&self) -> Vec<Value> {
        match self {
            Predicate::Compare { value, .. } => vec![value.clone()],
            Predicate::In { values, .. } => values.clone(),
            Predicate::Null { .. } => Vec::new(),
        }
    }
}

/// Query handle scoped to one model.
///
/// Builder methods consume and return the query, so a handle that must stay
/// untouched is simply cloned first.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    model: Model,
    columns: Vec<SelectItem>,
    wheres: Vec<Predicate>,
    orders: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            columns: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn columns(&self) -> &[SelectItem] {
        &self.columns
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.wheres
    }

    /// Replaces the whole projection.
    pub fn select<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        self.columns = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_select(mut self, item: impl Into<SelectItem>) -> Self {
        self.columns.push(item.into());
        self
    }

    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    pub fn where_op(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.wheres.push(Predicate::Compare {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn where_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.wheres.push(Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            cast: None,
        });
        self
    }

    /// `WHERE column IN (CAST(? AS sql_type), ...)`, for keys whose store type
    /// has no direct parameter encoding.
    ///
    /// `sql_type` is written into the statement as is and must be a plain
    /// type name.
    pub fn where_in_as<I, V>(mut self, column: impl Into<String>, values: I, sql_type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.wheres.push(Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            cast: Some(sql_type.into()),
        });
        self
    }

    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Predicate::Null {
            column: column.into(),
            negated: false,
        });
        self
    }

    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.wheres.push(Predicate::Null {
            column: column.into(),
            negated: true,
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.orders.push(OrderBy::new(column, direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// True when the query carries its own ordering or row window.
    pub fn has_window(&self) -> bool {
        !self.orders.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        for predicate in &self.wheres {
            bindings.extend(BindingKind::Where, predicate.values());
        }
        bindings
    }

    pub fn compile(&self, dialect: Dialect) -> CompiledSql {
        let mut w = SqlWriter::new(dialect);
        self.write_to(&mut w);
        w.finish()
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.compile(dialect).sql
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) {
        w.push("SELECT ");
        if self.columns.is_empty() {
            w.push_ident(&format!("{}.*", self.model.table()));
        } else {
            write_select_list(&self.columns, w);
        }

        w.push(" FROM ");
        w.push_ident(&self.model.from_name());

        for (idx, predicate) in self.wheres.iter().enumerate() {
            w.push(if idx == 0 { " WHERE " } else { " AND " });
            predicate.write_to(w);
        }

        w.push_window(&self.orders, self.limit, self.offset);
    }
}

impl From<Model> for SelectQuery {
    fn from(model: Model) -> Self {
        SelectQuery::new(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn posts() -> Model {
        Model::new("posts")
    }

    #[test]
    fn default_projection_selects_table_star() {
        let sql = posts().query().to_sql(Dialect::Sqlite);
        assert_eq!(sql, "SELECT \"posts\".* FROM \"posts\"");
    }

    #[test]
    fn where_clauses_bind_parameters_in_order() {
        let compiled = posts()
            .query()
            .where_eq("published", true)
            .where_in("posts.id", [1, 2, 3])
            .compile(Dialect::Postgres);

        assert_eq!(
            compiled.sql,
            "SELECT \"posts\".* FROM \"posts\" WHERE \"published\" = $1 AND \"posts\".\"id\" IN ($2, $3, $4)"
        );
        assert_eq!(
            compiled.params,
            vec![Value::Bool(true), Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn empty_in_set_never_matches() {
        let compiled = posts()
            .query()
            .where_in("id", Vec::<i64>::new())
            .compile(Dialect::MySql);
        assert!(compiled.sql.ends_with("WHERE 0 = 1"));
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn typed_in_set_casts_each_placeholder() {
        let compiled = Model::new("docs")
            .query()
            .where_in_as(
                "docs.id",
                [
                    "0b7e6f52-3a1c-4f0e-9d2b-6c1f8a4e5d01",
                    "5f3c2a10-8e4b-4d6a-b1c9-2e7d0f9a3b42",
                ],
                "uuid",
            )
            .compile(Dialect::Postgres);

        assert_eq!(
            compiled.sql,
            "SELECT \"docs\".* FROM \"docs\" WHERE \"docs\".\"id\" IN (CAST($1 AS uuid), CAST($2 AS uuid))"
        );
        assert_eq!(compiled.params.len(), 2);
    }

    #[test]
    fn select_replaces_projection_without_touching_clone() {
        let original = posts().query().where_not_null("published_at");
        let projected = original
            .clone()
            .select([Expr::column("posts.id").alias("id")]);

        assert!(original.columns().is_empty());
        assert_eq!(projected.columns().len(), 1);
        assert_eq!(projected.predicates(), original.predicates());
    }

    #[test]
    fn schema_qualified_from_and_window() {
        let sql = Model::new("events")
            .with_schema("audit")
            .query()
            .order_by("created_at", SortDirection::Desc)
            .limit(10)
            .offset(20)
            .to_sql(Dialect::Postgres);
        assert_eq!(
            sql,
            "SELECT \"events\".* FROM \"audit\".\"events\" ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn bindings_report_where_group() {
        let bindings = posts()
            .query()
            .where_op("views", Operator::Gte, 10)
            .where_null("deleted_at")
            .bindings();
        assert_eq!(bindings.get(BindingKind::Where), &[Value::Int(10)]);
        assert!(bindings.get(BindingKind::Union).is_empty());
    }
}
