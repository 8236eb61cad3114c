//! `blockwarden-config`: import/export pipeline for Blockwarden user settings.
//!
//! Provides:
//! - Field preprocessing (loosely typed strings to booleans and numbers)
//! - Versioned settings schema and typed `Config`
//! - Structural validation with dotted-path errors
//! - Protocol version migration chain
//! - Built-in defaults
//! - Import and export of settings documents
//! - JSON read/write with atomic backup rotation
//! - Filter metadata lookups

pub mod defaults;
pub mod export;
pub mod import;
pub mod io;
pub mod metadata;
pub mod migration;
pub mod preprocess;
pub mod schema;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export most-used types at crate root.
pub use defaults::{default_config, DEFAULT_CONFIG};
pub use export::{export, export_string};
pub use import::{
    detect_version, import, import_str, import_with_metadata, import_with_report, ImportError,
    Imported,
};
pub use io::{apply_merge_patch, load_settings, settings_dir, settings_file_path, write_settings};
pub use metadata::{FilterMetadataSource, StaticFilterMetadata, CUSTOM_FILTERS_START_ID};
pub use migration::{migrate, MigrationError};
pub use schema::{Config, FiltersUpdatePeriod, ProtocolVersion};
pub use validation::{
    validate, ConfigValidationError, ValidationErrorKind, ValidationReport, ValidationWarning,
};
