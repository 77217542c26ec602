// SPDX-License-Identifier: Apache-2.0

//! Feed settings: synthetic column names and default ordering.

use qore_query::SortDirection;
use serde::{Deserialize, Serialize};

use crate::engine::error::{EngineError, EngineResult};

pub const DEFAULT_TAG_COLUMN: &str = "tag_name";
pub const DEFAULT_SORT_COLUMN: &str = "order_by_column_name";
pub const DEFAULT_SORT_FIELD: &str = "id";

const ENV_TAG_COLUMN: &str = "QOREFEED_TAG_COLUMN";
const ENV_SORT_COLUMN: &str = "QOREFEED_SORT_COLUMN";
const ENV_SORT_FIELD: &str = "QOREFEED_SORT_FIELD";
const ENV_SORT_DIRECTION: &str = "QOREFEED_SORT_DIRECTION";
const ENV_REMOVE_DUPLICATES: &str = "QOREFEED_REMOVE_DUPLICATES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Column carrying each row's source tag
    pub tag_column: String,
    /// Alias of the synthetic sort column
    pub sort_column: String,
    /// Column each source is sorted by unless it names its own
    pub sort_field: String,
    pub sort_direction: SortDirection,
    /// `UNION` instead of `UNION ALL`
    pub remove_duplicates: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            tag_column: DEFAULT_TAG_COLUMN.to_string(),
            sort_column: DEFAULT_SORT_COLUMN.to_string(),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_direction: SortDirection::Desc,
            remove_duplicates: false,
        }
    }
}

impl FeedSettings {
    /// Defaults overlaid with any `QOREFEED_*` environment variables.
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = get(ENV_TAG_COLUMN) {
            settings.tag_column = value;
        }
        if let Some(value) = get(ENV_SORT_COLUMN) {
            settings.sort_column = value;
        }
        if let Some(value) = get(ENV_SORT_FIELD) {
            settings.sort_field = value;
        }
        if let Some(value) = get(ENV_SORT_DIRECTION) {
            settings.sort_direction = value.parse()?;
        }
        if let Some(value) = get(ENV_REMOVE_DUPLICATES) {
            settings.remove_duplicates = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(EngineError::validation(format!(
                        "{} must be a boolean, got '{}'",
                        ENV_REMOVE_DUPLICATES, value
                    )))
                }
            };
        }

        Ok(settings)
    }
}
