// SPDX-License-Identifier: Apache-2.0

//! Compound (`UNION` / `UNION ALL`) queries and derived-table wrappers.

use std::fmt;

use crate::bindings::{BindingKind, Bindings};
use crate::dialect::Dialect;
use crate::expr::{write_select_list, SelectItem};
use crate::order::{OrderBy, SortDirection};
use crate::render::{CompiledSql, SqlWriter};
use crate::select::SelectQuery;

/// Set operator joining two compound branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// Duplicate-removing union
    Union,
    /// Duplicate-preserving union
    UnionAll,
}

impl SetOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::UnionAll => "UNION ALL",
        }
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A head query followed by any number of unioned branches, with an
/// ordering and row window applying to the combined result.
///
/// The window is always rendered as a suffix, so the text of a query
/// without a window is a prefix of the same query with one.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionQuery {
    head: SelectQuery,
    branches: Vec<(SetOperator, SelectQuery)>,
    orders: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl UnionQuery {
    pub fn new(head: SelectQuery) -> Self {
        Self {
            head,
            branches: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn union(self, query: SelectQuery) -> Self {
        self.combine(SetOperator::Union, query)
    }

    pub fn union_all(self, query: SelectQuery) -> Self {
        self.combine(SetOperator::UnionAll, query)
    }

    pub fn combine(mut self, operator: SetOperator, query: SelectQuery) -> Self {
        self.branches.push((operator, query));
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

    /// Number of member selects, head included.
    pub fn branch_count(&self) -> usize {
        1 + self.branches.len()
    }

    pub fn head(&self) -> &SelectQuery {
        &self.head
    }

    pub fn branches(&self) -> impl Iterator<Item = (SetOperator, &SelectQuery)> {
        self.branches.iter().map(|(op, query)| (*op, query))
    }

    /// Head bindings land in the `where` group, branch bindings in the
    /// `union` group.
    pub fn bindings(&self) -> Bindings {
        let mut bindings = self.head.bindings();
        for (_, branch) in &self.branches {
            bindings.extend(BindingKind::Union, branch.bindings().flatten());
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
        if self.branches.is_empty() && !self.head.has_window() {
            self.head.write_to(w);
        } else {
            write_branch(&self.head, w);
            for (operator, branch) in &self.branches {
                w.push(" ");
                w.push(operator.as_sql());
                w.push(" ");
                write_branch(branch, w);
            }
        }

        w.push_window(&self.orders, self.limit, self.offset);
    }
}

impl From<SelectQuery> for UnionQuery {
    fn from(query: SelectQuery) -> Self {
        UnionQuery::new(query)
    }
}

fn write_branch(query: &SelectQuery, w: &mut SqlWriter) {
    let (open, close) = w.dialect().branch_delimiters();
    w.push(open);
    query.write_to(w);
    w.push(close);
}

/// `SELECT <items> FROM (<inner>) AS <alias>`, used for aggregates over a
/// compound query.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuery {
    inner: UnionQuery,
    alias: String,
    columns: Vec<SelectItem>,
    bindings: Bindings,
}

impl DerivedQuery {
    /// Wraps `inner`, forwarding its bindings group by group.
    pub fn new(inner: UnionQuery, alias: impl Into<String>) -> Self {
        let mut bindings = Bindings::new();
        for (kind, values) in inner.bindings().iter() {
            bindings.set(kind, values.to_vec());
        }

        Self {
            inner,
            alias: alias.into(),
            columns: Vec::new(),
            bindings,
        }
    }

    pub fn select<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        self.columns = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn compile(&self, dialect: Dialect) -> CompiledSql {
        let mut w = SqlWriter::new(dialect);
        w.push("SELECT ");
        if self.columns.is_empty() {
            w.push("*");
        } else {
            write_select_list(&self.columns, &mut w);
        }
        w.push(" FROM (");
        self.inner.write_to(&mut w);
        w.push(") AS ");
        let alias = dialect.quote_ident(&self.alias);
        w.push(&alias);
        w.finish()
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.compile(dialect).sql
    }
}
