// SPDX-License-Identifier: Apache-2.0

//! Incremental SQL text writer that numbers placeholders as it goes.

use serde::Serialize;

use crate::dialect::Dialect;
use crate::order::OrderBy;
use crate::value::Value;

/// Rendered statement and its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledSql {
    pub sql: String,
    pub params: Vec<Value>,
}

pub(crate) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub(crate) fn push_ident(&mut self, name: &str) {
        let quoted = self.dialect.quote_qualified(name);
        self.sql.push_str(&quoted);
    }

    pub(crate) fn push_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Appends `ORDER BY` / `LIMIT` / `OFFSET` clauses.
    ///
    /// Window values are capped at `i64::MAX`, the largest count every
    /// supported store accepts.
    pub(crate) fn push_window(&mut self, orders: &[OrderBy], limit: Option<u64>, offset: Option<u64>) {
        if !orders.is_empty() {
            self.push(" ORDER BY ");
            for (idx, order) in orders.iter().enumerate() {
                if idx > 0 {
                    self.push(", ");
                }
                self.push_ident(&order.column);
                self.push(" ");
                self.push(order.direction.as_sql());
            }
        }

        match (limit, offset) {
            (Some(limit), _) => self.push(&format!(" LIMIT {}", clamp_window(limit))),
            (None, Some(_)) => {
                if let Some(unbounded) = self.dialect.unbounded_limit() {
                    self.push(&format!(" LIMIT {}", unbounded));
                }
            }
            (None, None) => {}
        }

        if let Some(offset) = offset {
            self.push(&format!(" OFFSET {}", clamp_window(offset)));
        }
    }

    pub(crate) fn finish(self) -> CompiledSql {
        CompiledSql {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn clamp_window(value: u64) -> u64 {
    value.min(i64::MAX as u64)
}
