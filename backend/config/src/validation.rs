//! Structural validation of raw settings documents.
//!
//! Fields are read in the order the schema declares them, never in the
//! order the input happens to list them, so the error list for a given
//! document is always the same. Every field goes through its registered
//! coercion chain before the type check. All failures are collected; a
//! typed [`Config`] is only returned when there are none.

use crate::preprocess::{self, RawField};
use crate::schema::{
    allowlist, custom_filter, extension, filters, general, root, stealth, user_filter,
    AllowlistConfig, AppearanceTheme, Config, CustomFilterConfig, ExtensionSpecificSettings,
    FieldDef, FiltersConfig, FiltersUpdatePeriod, GeneralSettings, ProtocolVersion,
    StealthConfig, UserFilterConfig, COOKIE_LIFETIME_SENTINEL,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// Path reported for problems with the document as a whole.
pub const ROOT_PATH: &str = "$";

const MAX_ACTUAL_CHARS: usize = 64;

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// The value, after coercion, is not of the declared type or enumeration.
    #[error("expected {expected}")]
    TypeMismatch { expected: &'static str },
    /// The type is right but a semantic rule fails.
    #[error("{constraint}")]
    ConstraintViolation { constraint: String },
    #[error("required field is missing")]
    MissingRequiredField,
}

/// A rejected field, addressed by its dotted path in the input document
/// (e.g. `filters.custom-filters[0].customUrl`).
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{path}: {kind}{}", describe_actual(.actual))]
pub struct ConfigValidationError {
    pub path: String,
    pub kind: ValidationErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

/// A non-fatal finding, such as an unknown key that was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{path}: {message}")]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

/// Everything found while validating one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn describe_actual(actual: &Option<Value>) -> String {
    let Some(value) = actual else {
        return String::new();
    };
    let text = value.to_string();
    if text.chars().count() > MAX_ACTUAL_CHARS {
        let head: String = text.chars().take(MAX_ACTUAL_CHARS).collect();
        format!(" (got {head}...)")
    } else {
        format!(" (got {text})")
    }
}

/// Validate `raw` against the schema of protocol `version`.
///
/// On success returns the typed config plus a report holding any warnings.
/// On failure the report's `errors` list is non-empty.
pub fn validate(
    raw: &Value,
    version: ProtocolVersion,
) -> Result<(Config, ValidationReport), ValidationReport> {
    let mut validator = Validator::default();
    let config = validator.document(raw, version);
    let report = validator.report;
    match config {
        Some(config) if report.is_valid() => Ok((config, report)),
        _ => Err(report),
    }
}

/// Integer view of a JSON number. Floats are accepted only when integral.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// One JSON object being read, with the keys consumed so far.
struct Obj<'a> {
    map: &'a Map<String, Value>,
    path: String,
    seen: Vec<&'static str>,
}

impl<'a> Obj<'a> {
    fn new(map: &'a Map<String, Value>, path: String) -> Self {
        Self { map, path, seen: Vec::new() }
    }

    fn path_of(&self, key: &str) -> String {
        join(&self.path, key)
    }

    fn take(&mut self, key: &'static str) -> Option<&'a Value> {
        self.seen.push(key);
        self.map.get(key)
    }
}

#[derive(Default)]
struct Validator {
    report: ValidationReport,
}

impl Validator {
    // -- reporting ----------------------------------------------------------

    fn fail(&mut self, path: String, kind: ValidationErrorKind, actual: Option<Value>) {
        self.report.errors.push(ConfigValidationError { path, kind, actual });
    }

    fn mismatch(&mut self, path: String, expected: &'static str, actual: Value) {
        self.fail(path, ValidationErrorKind::TypeMismatch { expected }, Some(actual));
    }

    fn missing(&mut self, path: String) {
        self.fail(path, ValidationErrorKind::MissingRequiredField, None);
    }

    fn constraint(&mut self, path: String, constraint: impl Into<String>, actual: Value) {
        self.fail(
            path,
            ValidationErrorKind::ConstraintViolation { constraint: constraint.into() },
            Some(actual),
        );
    }

    /// Warn about every key of `obj` that no field definition asked for.
    fn close(&mut self, obj: Obj<'_>) {
        for key in obj.map.keys() {
            if !obj.seen.iter().any(|&seen| seen == key.as_str()) {
                let path = obj.path_of(key);
                warn!(path = %path, "Ignoring unknown settings field");
                self.report.warnings.push(ValidationWarning {
                    path,
                    message: "unknown field ignored".to_string(),
                });
            }
        }
    }

    // -- field readers ------------------------------------------------------

    /// Check an already coerced field against its expected type.
    fn convert<T: Clone>(
        &mut self,
        path: String,
        field: RawField,
        default: Option<&T>,
        expected: &'static str,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        match field {
            RawField::Missing => match default {
                Some(value) => Some(value.clone()),
                None => {
                    self.missing(path);
                    None
                }
            },
            RawField::Present(value) => match convert(&value) {
                Some(converted) => Some(converted),
                None => {
                    self.mismatch(path, expected, value);
                    None
                }
            },
            RawField::NotANumber(text) => {
                self.mismatch(path, expected, Value::String(text));
                None
            }
        }
    }

    fn scalar<T: Clone>(
        &mut self,
        obj: &mut Obj<'_>,
        def: &FieldDef<T>,
        expected: &'static str,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        let path = obj.path_of(def.key);
        let field = preprocess::apply(def.preprocess, RawField::from_value(obj.take(def.key)));
        self.convert(path, field, def.default.as_ref(), expected, convert)
    }

    fn boolean(&mut self, obj: &mut Obj<'_>, def: &FieldDef<bool>) -> bool {
        self.scalar(obj, def, "boolean", Value::as_bool).unwrap_or_default()
    }

    fn string(&mut self, obj: &mut Obj<'_>, def: &FieldDef<String>) -> String {
        self.scalar(obj, def, "string", |v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    fn optional_string(
        &mut self,
        obj: &mut Obj<'_>,
        def: &FieldDef<Option<String>>,
    ) -> Option<String> {
        self.scalar(obj, def, "string", |v| v.as_str().map(|s| Some(s.to_string())))
            .flatten()
    }

    fn cookie_lifetime(&mut self, obj: &mut Obj<'_>, def: &FieldDef<i64>) -> i64 {
        let path = obj.path_of(def.key);
        match self.scalar(obj, def, "integer", as_integer) {
            Some(minutes) if minutes >= COOKIE_LIFETIME_SENTINEL => minutes,
            Some(minutes) => {
                self.constraint(
                    path,
                    "must be -1 or a non-negative number of minutes",
                    json!(minutes),
                );
                0
            }
            None => 0,
        }
    }

    fn object<'a>(&mut self, parent: &mut Obj<'a>, key: &'static str) -> Option<Obj<'a>> {
        let path = parent.path_of(key);
        match parent.take(key) {
            None => {
                self.missing(path);
                None
            }
            Some(Value::Object(map)) => Some(Obj::new(map, path)),
            Some(other) => {
                self.mismatch(path, "object", other.clone());
                None
            }
        }
    }

    /// Array fields are always required.
    fn array<'a>(&mut self, obj: &mut Obj<'a>, key: &'static str) -> Option<(String, &'a [Value])> {
        let path = obj.path_of(key);
        match obj.take(key) {
            None => {
                self.missing(path);
                None
            }
            Some(Value::Array(items)) => Some((path, items.as_slice())),
            Some(other) => {
                self.mismatch(path, "array", other.clone());
                None
            }
        }
    }

    fn string_list(&mut self, obj: &mut Obj<'_>, def: &FieldDef<Vec<String>>) -> Vec<String> {
        let Some((path, items)) = self.array(obj, def.key) else {
            return Vec::new();
        };
        let mut values = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let field = preprocess::apply(def.preprocess, RawField::Present(item.clone()));
            let converted = self.convert(format!("{path}[{i}]"), field, None, "string", |v| {
                v.as_str().map(str::to_string)
            });
            values.extend(converted);
        }
        values
    }

    /// A list of filter or group IDs: non-negative integers, no duplicates.
    fn id_set(&mut self, obj: &mut Obj<'_>, def: &FieldDef<BTreeSet<u32>>) -> BTreeSet<u32> {
        let mut ids = BTreeSet::new();
        let Some((path, items)) = self.array(obj, def.key) else {
            return ids;
        };
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            let field = preprocess::apply(def.preprocess, RawField::Present(item.clone()));
            let Some(id) =
                self.convert(item_path.clone(), field, None, "integer", as_integer)
            else {
                continue;
            };
            let Ok(id) = u32::try_from(id) else {
                self.constraint(item_path, "must be a non-negative 32-bit id", json!(id));
                continue;
            };
            if !ids.insert(id) {
                self.constraint(item_path, format!("duplicate id {id}"), json!(id));
            }
        }
        ids
    }

    // -- sections -----------------------------------------------------------

    fn document(&mut self, raw: &Value, version: ProtocolVersion) -> Option<Config> {
        let Value::Object(map) = raw else {
            self.mismatch(ROOT_PATH.to_string(), "object", raw.clone());
            return None;
        };
        let mut doc = Obj::new(map, String::new());

        self.protocol_version(&mut doc, version);
        let general_settings = self
            .object(&mut doc, root::GENERAL_SETTINGS)
            .map(|obj| self.general_settings(obj));
        let extension_specific_settings = self
            .object(&mut doc, root::EXTENSION_SPECIFIC_SETTINGS)
            .map(|obj| self.extension_specific_settings(obj));
        let filters = self
            .object(&mut doc, root::FILTERS)
            .and_then(|obj| self.filters(obj, version));
        let stealth = self.object(&mut doc, root::STEALTH).map(|obj| self.stealth(obj));
        self.close(doc);

        Some(Config {
            general_settings: general_settings?,
            extension_specific_settings: extension_specific_settings?,
            filters: filters?,
            stealth: stealth?,
        })
    }

    fn protocol_version(&mut self, doc: &mut Obj<'_>, version: ProtocolVersion) {
        let path = doc.path_of(root::PROTOCOL_VERSION);
        match doc.take(root::PROTOCOL_VERSION) {
            None => self.missing(path),
            Some(Value::String(tag)) if tag == version.as_str() => {}
            Some(Value::String(tag)) => self.constraint(
                path,
                format!("expected protocol version {version}"),
                Value::String(tag.clone()),
            ),
            Some(other) => self.mismatch(path, "string", other.clone()),
        }
    }

    fn general_settings(&mut self, mut obj: Obj<'_>) -> GeneralSettings {
        let settings = GeneralSettings {
            allow_acceptable_ads: self.boolean(&mut obj, &general::ALLOW_ACCEPTABLE_ADS),
            show_blocked_ads_count: self.boolean(&mut obj, &general::SHOW_BLOCKED_ADS_COUNT),
            autodetect_filters: self.boolean(&mut obj, &general::AUTODETECT_FILTERS),
            safebrowsing_enabled: self.boolean(&mut obj, &general::SAFEBROWSING_ENABLED),
            filters_update_period: self
                .scalar(
                    &mut obj,
                    &general::FILTERS_UPDATE_PERIOD,
                    FiltersUpdatePeriod::EXPECTED,
                    |v| as_integer(v).and_then(FiltersUpdatePeriod::from_millis),
                )
                .unwrap_or_default(),
            appearance_theme: self
                .scalar(&mut obj, &general::APPEARANCE_THEME, AppearanceTheme::EXPECTED, |v| {
                    v.as_str().and_then(AppearanceTheme::parse)
                })
                .unwrap_or_default(),
        };
        self.close(obj);
        settings
    }

    fn extension_specific_settings(&mut self, mut obj: Obj<'_>) -> ExtensionSpecificSettings {
        let settings = ExtensionSpecificSettings {
            use_optimized_filters: self.boolean(&mut obj, &extension::USE_OPTIMIZED_FILTERS),
            collect_hits_count: self.boolean(&mut obj, &extension::COLLECT_HITS_COUNT),
            show_context_menu: self.boolean(&mut obj, &extension::SHOW_CONTEXT_MENU),
            show_info_about_adguard: self.boolean(&mut obj, &extension::SHOW_INFO_ABOUT_ADGUARD),
            show_app_updated_info: self.boolean(&mut obj, &extension::SHOW_APP_UPDATED_INFO),
            hide_rate_adguard: self.boolean(&mut obj, &extension::HIDE_RATE_ADGUARD),
            user_rules_editor_wrap: self.boolean(&mut obj, &extension::USER_RULES_EDITOR_WRAP),
        };
        self.close(obj);
        settings
    }

    fn filters(&mut self, mut obj: Obj<'_>, version: ProtocolVersion) -> Option<FiltersConfig> {
        let enabled_filters = self.id_set(&mut obj, &filters::ENABLED_FILTERS);
        let enabled_groups = self.id_set(&mut obj, &filters::ENABLED_GROUPS);
        let custom_filters = self.custom_filters(&mut obj);
        let user_filter = self
            .object(&mut obj, filters::USER_FILTER)
            .map(|o| self.user_filter(o));
        let allowlist = self
            .object(&mut obj, version.allowlist_key())
            .map(|o| self.allowlist(o));
        self.close(obj);

        Some(FiltersConfig {
            enabled_filters,
            enabled_groups,
            custom_filters,
            user_filter: user_filter?,
            allowlist: allowlist?,
        })
    }

    fn custom_filters(&mut self, obj: &mut Obj<'_>) -> Vec<CustomFilterConfig> {
        let Some((path, items)) = self.array(obj, filters::CUSTOM_FILTERS) else {
            return Vec::new();
        };
        let mut custom = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            match item {
                Value::Object(map) => custom.push(self.custom_filter(Obj::new(map, item_path))),
                other => self.mismatch(item_path, "object", other.clone()),
            }
        }
        custom
    }

    fn custom_filter(&mut self, mut obj: Obj<'_>) -> CustomFilterConfig {
        let url_path = obj.path_of(custom_filter::CUSTOM_URL.key);
        let custom_url = self.string(&mut obj, &custom_filter::CUSTOM_URL);
        if !custom_url.is_empty() && custom_url.trim().is_empty() {
            self.constraint(url_path, "must not be blank", Value::String(custom_url.clone()));
        }
        let filter = CustomFilterConfig {
            custom_url,
            title: self.optional_string(&mut obj, &custom_filter::TITLE),
            trusted: self.boolean(&mut obj, &custom_filter::TRUSTED),
            enabled: self.boolean(&mut obj, &custom_filter::ENABLED),
        };
        self.close(obj);
        filter
    }

    fn user_filter(&mut self, mut obj: Obj<'_>) -> UserFilterConfig {
        let user = UserFilterConfig {
            enabled: self.boolean(&mut obj, &user_filter::ENABLED),
            rules: self.string(&mut obj, &user_filter::RULES),
            disabled_rules: self.string(&mut obj, &user_filter::DISABLED_RULES),
        };
        self.close(obj);
        user
    }

    fn allowlist(&mut self, mut obj: Obj<'_>) -> AllowlistConfig {
        let list = AllowlistConfig {
            enabled: self.boolean(&mut obj, &allowlist::ENABLED),
            inverted: self.boolean(&mut obj, &allowlist::INVERTED),
            domains: self.string_list(&mut obj, &allowlist::DOMAINS),
            inverted_domains: self.string_list(&mut obj, &allowlist::INVERTED_DOMAINS),
        };
        self.close(obj);
        list
    }

    fn stealth(&mut self, mut obj: Obj<'_>) -> StealthConfig {
        let config = StealthConfig {
            disable_stealth_mode: self.boolean(&mut obj, &stealth::DISABLE_STEALTH_MODE),
            hide_referrer: self.boolean(&mut obj, &stealth::HIDE_REFERRER),
            hide_search_queries: self.boolean(&mut obj, &stealth::HIDE_SEARCH_QUERIES),
            send_do_not_track: self.boolean(&mut obj, &stealth::SEND_DO_NOT_TRACK),
            block_webrtc: self.boolean(&mut obj, &stealth::BLOCK_WEBRTC),
            remove_x_client_data: self.boolean(&mut obj, &stealth::REMOVE_X_CLIENT_DATA),
            self_destruct_third_party_cookies: self
                .boolean(&mut obj, &stealth::SELF_DESTRUCT_THIRD_PARTY_COOKIES),
            self_destruct_third_party_cookies_time: self
                .cookie_lifetime(&mut obj, &stealth::SELF_DESTRUCT_THIRD_PARTY_COOKIES_TIME),
            self_destruct_first_party_cookies: self
                .boolean(&mut obj, &stealth::SELF_DESTRUCT_FIRST_PARTY_COOKIES),
            self_destruct_first_party_cookies_time: self
                .cookie_lifetime(&mut obj, &stealth::SELF_DESTRUCT_FIRST_PARTY_COOKIES_TIME),
            block_known_trackers: self.boolean(&mut obj, &stealth::BLOCK_KNOWN_TRACKERS),
            strip_tracking_parameters: self.boolean(&mut obj, &stealth::STRIP_TRACKING_PARAMETERS),
        };
        self.close(obj);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{arb, settings_v1, settings_v2};
    use proptest::prelude::*;

    fn errors_of(raw: &Value) -> Vec<ConfigValidationError> {
        validate(raw, ProtocolVersion::V2_0).unwrap_err().errors
    }

    fn paths(errors: &[ConfigValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn accepts_a_current_export() {
        let (cfg, report) = validate(&settings_v2(), ProtocolVersion::V2_0).unwrap();
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert_eq!(cfg.general_settings.filters_update_period, FiltersUpdatePeriod::OneDay);
        assert_eq!(cfg.general_settings.appearance_theme, AppearanceTheme::Dark);
        assert_eq!(cfg.filters.custom_filters.len(), 3);
        assert_eq!(cfg.filters.allowlist.inverted_domains, vec!["domain3.com", "domain4.com"]);
        assert_eq!(cfg.stealth.self_destruct_first_party_cookies_time, 4444);
    }

    #[test]
    fn string_booleans_are_coerced() {
        let mut raw = settings_v2();
        raw["general-settings"]["allow-acceptable-ads"] = json!("true");
        raw["stealth"]["stealth-block-webrtc"] = json!("false");
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert!(cfg.general_settings.allow_acceptable_ads);
        assert!(!cfg.stealth.block_webrtc);
    }

    #[test]
    fn non_boolean_string_is_a_type_mismatch() {
        let mut raw = settings_v2();
        raw["general-settings"]["autodetect-filters"] = json!("maybe");
        let errors = errors_of(&raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "general-settings.autodetect-filters");
        assert_eq!(errors[0].kind, ValidationErrorKind::TypeMismatch { expected: "boolean" });
        assert_eq!(errors[0].actual, Some(json!("maybe")));
    }

    #[test]
    fn numeric_strings_become_integers() {
        let mut raw = settings_v2();
        raw["stealth"]["stealth-block-third-party-cookies-time"] = json!("42");
        raw["general-settings"]["filters-update-period"] = json!("\"3600000\"");
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(cfg.stealth.self_destruct_third_party_cookies_time, 42);
        assert_eq!(cfg.general_settings.filters_update_period, FiltersUpdatePeriod::OneHour);
    }

    #[test]
    fn non_numeric_string_is_rejected_not_zeroed() {
        let mut raw = settings_v2();
        raw["stealth"]["stealth-block-third-party-cookies-time"] = json!("abc");
        let errors = errors_of(&raw);
        assert_eq!(paths(&errors), vec!["stealth.stealth-block-third-party-cookies-time"]);
        assert_eq!(errors[0].kind, ValidationErrorKind::TypeMismatch { expected: "integer" });
        assert_eq!(errors[0].actual, Some(json!("abc")));
    }

    #[test]
    fn update_period_must_be_enumerated() {
        let mut raw = settings_v2();
        raw["general-settings"]["filters-update-period"] = json!(7_200_000);
        let errors = errors_of(&raw);
        assert_eq!(
            errors[0].kind,
            ValidationErrorKind::TypeMismatch { expected: FiltersUpdatePeriod::EXPECTED }
        );

        raw["general-settings"]["filters-update-period"] = json!(-1);
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(cfg.general_settings.filters_update_period, FiltersUpdatePeriod::Never);
    }

    #[test]
    fn cookie_lifetime_accepts_sentinel_only() {
        let mut raw = settings_v2();
        raw["stealth"]["stealth-block-first-party-cookies-time"] = json!(-1);
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(cfg.stealth.self_destruct_first_party_cookies_time, -1);

        raw["stealth"]["stealth-block-first-party-cookies-time"] = json!(-5);
        let errors = errors_of(&raw);
        assert!(matches!(errors[0].kind, ValidationErrorKind::ConstraintViolation { .. }));
    }

    #[test]
    fn empty_custom_url_counts_as_missing() {
        let mut raw = settings_v2();
        raw["filters"]["custom-filters"] = json!([{ "customUrl": "" }]);
        let errors = errors_of(&raw);
        assert_eq!(paths(&errors), vec!["filters.custom-filters[0].customUrl"]);
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingRequiredField);
    }

    #[test]
    fn custom_filter_optional_fields_default() {
        let mut raw = settings_v2();
        raw["filters"]["custom-filters"] = json!([{ "customUrl": "https://example.org/list.txt" }]);
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        let filter = &cfg.filters.custom_filters[0];
        assert_eq!(filter.title, None);
        assert!(!filter.trusted);
        assert!(filter.enabled);
    }

    #[test]
    fn duplicate_ids_violate_uniqueness() {
        let mut raw = settings_v2();
        raw["filters"]["enabled-filters"] = json!([1, 1, 2]);
        let errors = errors_of(&raw);
        assert_eq!(paths(&errors), vec!["filters.enabled-filters[1]"]);
        assert_eq!(
            errors[0].kind,
            ValidationErrorKind::ConstraintViolation { constraint: "duplicate id 1".to_string() }
        );
    }

    #[test]
    fn negative_ids_are_rejected() {
        let mut raw = settings_v2();
        raw["filters"]["enabled-groups"] = json!([0, -3]);
        let errors = errors_of(&raw);
        assert_eq!(paths(&errors), vec!["filters.enabled-groups[1]"]);
    }

    #[test]
    fn quoted_ids_are_accepted() {
        let mut raw = settings_v2();
        raw["filters"]["enabled-filters"] = json!(["1", "\"2\"", 3]);
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(cfg.filters.enabled_filters, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn optional_fields_take_documented_defaults() {
        let mut raw = settings_v2();
        for (section, key) in [
            ("general-settings", "appearance-theme"),
            ("extension-specific-settings", "user-rules-editor-wrap"),
            ("stealth", "block-known-trackers"),
            ("stealth", "strip-tracking-parameters"),
        ] {
            raw[section].as_object_mut().unwrap().remove(key);
        }
        raw["filters"]["user-filter"].as_object_mut().unwrap().remove("enabled");
        raw["filters"]["user-filter"].as_object_mut().unwrap().remove("disabled-rules");
        raw["filters"]["allowlist"].as_object_mut().unwrap().remove("inverted");

        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(cfg.general_settings.appearance_theme, AppearanceTheme::System);
        assert!(!cfg.extension_specific_settings.user_rules_editor_wrap);
        assert!(!cfg.stealth.block_known_trackers);
        assert!(!cfg.stealth.strip_tracking_parameters);
        assert!(cfg.filters.user_filter.enabled);
        assert_eq!(cfg.filters.user_filter.disabled_rules, "");
        assert!(!cfg.filters.allowlist.inverted);
    }

    #[test]
    fn empty_theme_falls_back_to_default() {
        let mut raw = settings_v2();
        raw["general-settings"]["appearance-theme"] = json!("");
        let (cfg, _) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(cfg.general_settings.appearance_theme, AppearanceTheme::System);
    }

    #[test]
    fn missing_sections_are_reported() {
        let mut raw = settings_v2();
        raw.as_object_mut().unwrap().remove("general-settings");
        raw.as_object_mut().unwrap().remove("stealth");
        let errors = errors_of(&raw);
        assert_eq!(paths(&errors), vec!["general-settings", "stealth"]);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::MissingRequiredField));
    }

    #[test]
    fn errors_follow_declared_order_not_input_order() {
        let mut raw = settings_v2();
        raw["stealth"]["stealth-hide-referrer"] = json!("nope");
        raw["general-settings"]["show-blocked-ads-count"] = json!(3);
        raw["filters"]["allowlist"]["domains"] = json!(["ok.com", 7]);
        let errors = errors_of(&raw);
        assert_eq!(
            paths(&errors),
            vec![
                "general-settings.show-blocked-ads-count",
                "filters.allowlist.domains[1]",
                "stealth.stealth-hide-referrer",
            ]
        );
        assert_eq!(errors, errors_of(&raw));
    }

    #[test]
    fn unknown_keys_are_warnings() {
        let mut raw = settings_v2();
        raw["general-settings"]["future-option"] = json!(true);
        let (_, report) = validate(&raw, ProtocolVersion::V2_0).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "general-settings.future-option");
    }

    #[test]
    fn schema_is_parametrized_by_version() {
        assert!(validate(&settings_v1(), ProtocolVersion::V1_0).is_ok());

        let mut raw = settings_v1();
        raw["protocol-version"] = json!("2.0");
        let errors = errors_of(&raw);
        assert_eq!(paths(&errors), vec!["filters.allowlist"]);
    }

    #[test]
    fn protocol_version_must_match() {
        let errors = validate(&settings_v2(), ProtocolVersion::V1_0).unwrap_err().errors;
        assert_eq!(errors[0].path, "protocol-version");
    }

    #[test]
    fn non_object_document_is_rejected_at_root() {
        let errors = errors_of(&json!([1, 2, 3]));
        assert_eq!(paths(&errors), vec![ROOT_PATH]);
    }

    #[test]
    fn error_display_names_path_and_value() {
        let err = ConfigValidationError {
            path: "stealth.stealth-block-webrtc".to_string(),
            kind: ValidationErrorKind::TypeMismatch { expected: "boolean" },
            actual: Some(json!("maybe")),
        };
        assert_eq!(
            err.to_string(),
            "stealth.stealth-block-webrtc: expected boolean (got \"maybe\")"
        );
    }

    fn validated(raw: &Value) -> Config {
        validate(raw, ProtocolVersion::V2_0).unwrap().0
    }

    proptest! {
        #[test]
        fn integer_strings_coerce_to_cookie_lifetimes(
            n in arb::cookie_lifetime(),
            pad in " {0,2}",
        ) {
            let mut raw = settings_v2();
            let padded = format!("{pad}{n}{pad}");
            raw["stealth"]["stealth-block-first-party-cookies-time"] = json!(padded);
            raw["stealth"]["stealth-block-third-party-cookies-time"] = json!(n.to_string());
            let cfg = validated(&raw);
            prop_assert_eq!(cfg.stealth.self_destruct_first_party_cookies_time, n);
            prop_assert_eq!(cfg.stealth.self_destruct_third_party_cookies_time, n);
        }

        #[test]
        fn integer_strings_coerce_to_filter_ids(
            ids in prop::collection::btree_set(0u32..100_000, 0..6),
        ) {
            let mut raw = settings_v2();
            let as_strings: Vec<String> = ids.iter().map(u32::to_string).collect();
            raw["filters"]["enabled-filters"] = json!(as_strings);
            prop_assert_eq!(validated(&raw).filters.enabled_filters, ids);
        }

        #[test]
        fn boolean_strings_coerce_to_booleans(flags in prop::array::uniform3(any::<bool>())) {
            let mut raw = settings_v2();
            raw["stealth"]["stealth-block-webrtc"] = json!(flags[0].to_string());
            raw["general-settings"]["allow-acceptable-ads"] = json!(flags[1].to_string());
            raw["filters"]["user-filter"]["enabled"] = json!(flags[2].to_string());
            let cfg = validated(&raw);
            prop_assert_eq!(cfg.stealth.block_webrtc, flags[0]);
            prop_assert_eq!(cfg.general_settings.allow_acceptable_ads, flags[1]);
            prop_assert_eq!(cfg.filters.user_filter.enabled, flags[2]);
        }

        #[test]
        fn cookie_lifetimes_below_sentinel_are_rejected(n in i64::MIN / 2..-1) {
            let mut raw = settings_v2();
            raw["stealth"]["stealth-block-third-party-cookies-time"] = json!(n.to_string());
            let errors = errors_of(&raw);
            prop_assert_eq!(
                paths(&errors),
                vec!["stealth.stealth-block-third-party-cookies-time"]
            );
        }
    }
}
