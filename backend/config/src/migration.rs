//! Protocol version migration engine.
//!
//! Migrations form a linear chain: each step lifts a document from one
//! version to the next. A document is migrated by running every step from
//! its declared version up to [`ProtocolVersion::CURRENT`]. Steps are pure
//! reshapes of raw JSON; validation happens afterwards.

use crate::schema::{filters, root, ProtocolVersion};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("settings document is not a JSON object")]
    NotAnObject,
}

/// One step of the chain.
struct Migration {
    from: ProtocolVersion,
    to: ProtocolVersion,
    step: fn(Map<String, Value>) -> Map<String, Value>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    from: ProtocolVersion::V1_0,
    to: ProtocolVersion::V2_0,
    step: migrate_v1_to_v2,
}];

/// Bring `doc` from protocol version `from` up to the current version.
///
/// Returns the document unchanged when `from` is already current.
pub fn migrate(doc: Value, from: ProtocolVersion) -> Result<Value, MigrationError> {
    let Value::Object(mut map) = doc else {
        return Err(MigrationError::NotAnObject);
    };

    let mut current = from;
    for migration in MIGRATIONS.iter().filter(|m| m.from >= from) {
        debug_assert_eq!(migration.from, current);
        map = (migration.step)(map);
        map.insert(
            root::PROTOCOL_VERSION.to_string(),
            Value::String(migration.to.as_str().to_string()),
        );
        info!(from = %migration.from, to = %migration.to, "Migrated settings document");
        current = migration.to;
    }

    Ok(Value::Object(map))
}

/// 1.0 → 2.0: `filters.whitelist` is renamed to `filters.allowlist`.
///
/// The section's contents are carried over untouched. Documents without a
/// `whitelist` are left for validation to reject.
fn migrate_v1_to_v2(mut doc: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(section)) = doc.get_mut(root::FILTERS) {
        if let Some(list) = section.remove(filters::WHITELIST) {
            section.insert(filters::ALLOWLIST.to_string(), list);
        }
    }
    doc
}
