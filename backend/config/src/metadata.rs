//! Filter metadata lookups.
//!
//! The pipeline never downloads filter metadata itself. A caller that has it
//! (bundled JSON, a cached download) implements [`FilterMetadataSource`] and
//! passes it to [`crate::import::import_with_metadata`] so that IDs the
//! product does not ship are rejected.

use crate::schema::{filters, root, Config};
use crate::validation::{ConfigValidationError, ValidationErrorKind};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;

/// Filter IDs at or above this value belong to user-added custom filters and
/// are never listed in the shipped metadata.
pub const CUSTOM_FILTERS_START_ID: u32 = 1000;

pub fn is_custom_filter_id(id: u32) -> bool {
    id >= CUSTOM_FILTERS_START_ID
}

/// Knows which filter and group IDs exist.
pub trait FilterMetadataSource: Send + Sync {
    fn is_known_filter(&self, id: u32) -> bool;
    fn is_known_group(&self, id: u32) -> bool;
}

/// Metadata held in memory, e.g. loaded from a bundled `filters.json`.
///
/// Deserializes from `{"filters": [..], "groups": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StaticFilterMetadata {
    filters: BTreeSet<u32>,
    groups: BTreeSet<u32>,
}

impl StaticFilterMetadata {
    pub fn new(
        filters: impl IntoIterator<Item = u32>,
        groups: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            filters: filters.into_iter().collect(),
            groups: groups.into_iter().collect(),
        }
    }
}

impl FilterMetadataSource for StaticFilterMetadata {
    fn is_known_filter(&self, id: u32) -> bool {
        self.filters.contains(&id)
    }

    fn is_known_group(&self, id: u32) -> bool {
        self.groups.contains(&id)
    }
}

/// Every enabled filter or group ID that `source` does not know about.
/// Custom filter IDs are skipped.
pub fn unknown_ids(
    config: &Config,
    source: &dyn FilterMetadataSource,
) -> Vec<ConfigValidationError> {
    let filter_path = format!("{}.{}", root::FILTERS, filters::ENABLED_FILTERS.key);
    let group_path = format!("{}.{}", root::FILTERS, filters::ENABLED_GROUPS.key);

    let unknown_filters = config
        .filters
        .enabled_filters
        .iter()
        .filter(|id| !is_custom_filter_id(**id) && !source.is_known_filter(**id))
        .map(|id| unknown(&filter_path, "filter", *id));
    let unknown_groups = config
        .filters
        .enabled_groups
        .iter()
        .filter(|id| !source.is_known_group(**id))
        .map(|id| unknown(&group_path, "group", *id));

    unknown_filters.chain(unknown_groups).collect()
}

fn unknown(path: &str, what: &str, id: u32) -> ConfigValidationError {
    ConfigValidationError {
        path: path.to_string(),
        kind: ValidationErrorKind::ConstraintViolation {
            constraint: format!("unknown {what} id {id}"),
        },
        actual: Some(json!(id)),
    }
}
