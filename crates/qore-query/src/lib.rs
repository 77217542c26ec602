// SPDX-License-Identifier: Apache-2.0

//! qore-query
//!
//! A small multi-dialect SQL builder. It renders model-scoped `SELECT`s,
//! compound `UNION` queries and derived-table aggregates for PostgreSQL,
//! MySQL and SQLite, keeping track of bound parameters along the way.

pub mod bindings;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod model;
pub mod order;
pub mod render;
pub mod select;
pub mod union;
pub mod value;

pub use bindings::{BindingKind, Bindings};
pub use dialect::Dialect;
pub use error::QueryError;
pub use expr::{Expr, SelectItem};
pub use model::Model;
pub use order::{OrderBy, SortDirection};
pub use render::CompiledSql;
pub use select::{Operator, Predicate, SelectQuery};
pub use union::{DerivedQuery, SetOperator, UnionQuery};
pub use value::Value;
