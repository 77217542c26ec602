// SPDX-License-Identifier: Apache-2.0

//! Projection compiler.
//!
//! Rewrites every registered source into the same three-column shape
//! `(id, <tag column>, <sort column>)` and chains the results into a single
//! `UNION` / `UNION ALL` query.

use qore_query::{Expr, SelectQuery, SetOperator, UnionQuery};
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};

use super::dialect::tag_literal;
use super::registry::FeedRegistry;
use super::settings::FeedSettings;
use super::types::FeedSource;

/// The thin projection of one source. The source's own query is cloned, so
/// its filters survive and the registered handle is left untouched.
pub fn project_source(source: &FeedSource, settings: &FeedSettings, driver_id: &str) -> SelectQuery {
    let sort_field = source
        .order_column
        .as_deref()
        .unwrap_or(&settings.sort_field);
    let sort_expr = source.model().qualify(sort_field);

    source.query.clone().select([
        Expr::column(source.qualified_key()).alias("id"),
        tag_literal(driver_id, &source.tag).alias(settings.tag_column.as_str()),
        Expr::column(sort_expr).alias(settings.sort_column.as_str()),
    ])
}

/// Builds the feed's union query, head first in registration order.
pub fn compile(
    registry: &FeedRegistry,
    settings: &FeedSettings,
    driver_id: &str,
) -> EngineResult<UnionQuery> {
    let operator = if settings.remove_duplicates {
        SetOperator::Union
    } else {
        SetOperator::UnionAll
    };

    let mut sources = registry.iter();
    let head = sources.next().ok_or(EngineError::EmptyFeed)?;

    let mut union = UnionQuery::new(project_source(head, settings, driver_id));
    for source in sources {
        union = union.combine(operator, project_source(source, settings, driver_id));
    }

    debug!(
        sources = registry.len(),
        operator = operator.as_sql(),
        "compiled feed union"
    );
    Ok(union)
}
