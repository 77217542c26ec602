// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::select::SelectQuery;

/// Default primary key column name for a model.
pub const DEFAULT_KEY_NAME: &str = "id";

/// Describes one record type: the table it lives in and its key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    table: String,
    schema: Option<String>,
    key_name: String,
}

impl Model {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            key_name: DEFAULT_KEY_NAME.to_string(),
        }
    }

    pub fn with_key(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Name used in a `FROM` clause (`schema.table` when a schema is set).
    pub fn from_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.table),
            None => self.table.clone(),
        }
    }

    /// Qualifies `column` with this model's table unless it is already
    /// qualified.
    pub fn qualify(&self, column: &str) -> String {
        if column.contains('.') {
            column.to_string()
        } else {
            format!("{}.{}", self.table, column)
        }
    }

    /// A fresh, unfiltered query over this model.
    pub fn query(&self) -> SelectQuery {
        SelectQuery::new(self.clone())
    }
}
