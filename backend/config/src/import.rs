//! Import entry points.
//!
//! An import reads the document's protocol version, validates the document
//! against that version's schema, and only then migrates it forward and
//! re-validates it against the current schema. User mistakes are therefore
//! reported in the paths of the document the user actually wrote. A failure
//! after migration means a migration step is wrong, and is reported as such.

use crate::metadata::{self, FilterMetadataSource};
use crate::migration::{migrate, MigrationError};
use crate::schema::{root, Config, ProtocolVersion};
use crate::validation::{
    validate, ConfigValidationError, ValidationErrorKind, ValidationWarning, ROOT_PATH,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings failed validation with {} error(s)", .0.len())]
    Invalid(Vec<ConfigValidationError>),

    #[error("unsupported protocol version \"{found}\" (supported: {supported})")]
    UnsupportedProtocolVersion { found: String, supported: String },

    #[error(
        "settings migrated from protocol {from} failed validation with {} error(s)",
        .errors.len()
    )]
    MigrationInvariantViolation {
        from: ProtocolVersion,
        errors: Vec<ConfigValidationError>,
    },

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl ImportError {
    /// The failure as a flat list of field errors.
    pub fn errors(&self) -> Vec<ConfigValidationError> {
        match self {
            ImportError::Invalid(errors) => errors.clone(),
            ImportError::MigrationInvariantViolation { errors, .. } => errors.clone(),
            ImportError::Parse(err) => vec![ConfigValidationError {
                path: ROOT_PATH.to_string(),
                kind: ValidationErrorKind::ConstraintViolation { constraint: err.to_string() },
                actual: None,
            }],
            ImportError::UnsupportedProtocolVersion { found, supported } => {
                vec![ConfigValidationError {
                    path: root::PROTOCOL_VERSION.to_string(),
                    kind: ValidationErrorKind::ConstraintViolation {
                        constraint: format!("must be one of {supported}"),
                    },
                    actual: Some(Value::String(found.clone())),
                }]
            }
            ImportError::Migration(err) => vec![ConfigValidationError {
                path: ROOT_PATH.to_string(),
                kind: ValidationErrorKind::ConstraintViolation { constraint: err.to_string() },
                actual: None,
            }],
        }
    }
}

/// A successful import together with its non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    pub config: Config,
    pub warnings: Vec<ValidationWarning>,
    /// Set when the document was written by an older protocol version.
    pub migrated_from: Option<ProtocolVersion>,
}

/// Read and check the `protocol-version` tag of `raw`.
pub fn detect_version(raw: &Value) -> Result<ProtocolVersion, ImportError> {
    let Value::Object(map) = raw else {
        return Err(single(
            ROOT_PATH,
            ValidationErrorKind::TypeMismatch { expected: "object" },
            Some(raw.clone()),
        ));
    };
    match map.get(root::PROTOCOL_VERSION) {
        None => Err(single(
            root::PROTOCOL_VERSION,
            ValidationErrorKind::MissingRequiredField,
            None,
        )),
        Some(Value::String(tag)) => tag.parse::<ProtocolVersion>().map_err(|_| {
            ImportError::UnsupportedProtocolVersion {
                found: tag.clone(),
                supported: ProtocolVersion::supported(),
            }
        }),
        Some(other) => Err(single(
            root::PROTOCOL_VERSION,
            ValidationErrorKind::TypeMismatch { expected: "string" },
            Some(other.clone()),
        )),
    }
}

fn single(path: &str, kind: ValidationErrorKind, actual: Option<Value>) -> ImportError {
    ImportError::Invalid(vec![ConfigValidationError { path: path.to_string(), kind, actual }])
}

/// Import an untrusted settings document.
pub fn import(raw: &Value) -> Result<Config, ImportError> {
    import_with_report(raw).map(|imported| imported.config)
}

/// Import JSON text.
pub fn import_str(text: &str) -> Result<Imported, ImportError> {
    let raw: Value = serde_json::from_str(text)?;
    import_with_report(&raw)
}

/// Like [`import`], also returning warnings and the migration source.
pub fn import_with_report(raw: &Value) -> Result<Imported, ImportError> {
    import_via(raw, migrate)
}

/// Migration strategy used by an import: lifts a raw document from the
/// given version to the current one.
pub(crate) type MigrateFn = fn(Value, ProtocolVersion) -> Result<Value, MigrationError>;

pub(crate) fn import_via(raw: &Value, migrate: MigrateFn) -> Result<Imported, ImportError> {
    let version = detect_version(raw)?;
    let (config, report) =
        validate(raw, version).map_err(|report| ImportError::Invalid(report.errors))?;

    if version == ProtocolVersion::CURRENT {
        debug!(warnings = report.warnings.len(), "Imported settings");
        return Ok(Imported { config, warnings: report.warnings, migrated_from: None });
    }

    let config = migrate_and_revalidate(raw, version, migrate)?;
    info!(from = %version, to = %ProtocolVersion::CURRENT, "Imported settings from older protocol");

    Ok(Imported { config, warnings: report.warnings, migrated_from: Some(version) })
}

/// Migrate a document already valid for `from` and check it against the
/// current schema. Failure here is a defect in a migration step.
pub(crate) fn migrate_and_revalidate(
    raw: &Value,
    from: ProtocolVersion,
    migrate: MigrateFn,
) -> Result<Config, ImportError> {
    let migrated = migrate(raw.clone(), from)?;
    let (config, _) = validate(&migrated, ProtocolVersion::CURRENT).map_err(|report| {
        ImportError::MigrationInvariantViolation { from, errors: report.errors }
    })?;
    Ok(config)
}

/// Import and additionally reject filter or group IDs that `source` does not know.
pub fn import_with_metadata(
    raw: &Value,
    source: &dyn FilterMetadataSource,
) -> Result<Imported, ImportError> {
    let imported = import_with_report(raw)?;
    let unknown = metadata::unknown_ids(&imported.config, source);
    if unknown.is_empty() {
        Ok(imported)
    } else {
        Err(ImportError::Invalid(unknown))
    }
}
