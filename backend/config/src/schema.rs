//! Settings document schema.
//!
//! Describes the externally documented JSON shape of an exported settings
//! file: the key of every section and field, the coercions registered for
//! each field, which fields are optional and what they default to, and the
//! typed structures a validated document is turned into.
//!
//! Key names are a persistent contract. Renaming one requires a new protocol
//! version and a migration step.

use crate::preprocess::{
    empty_string_to_absent, to_boolean, to_clean_string, to_number, to_string_then_number,
    Preprocessor,
};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol version
// ---------------------------------------------------------------------------

/// Tag identifying which document shape a settings file conforms to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    /// Original shape, with the allow-list stored under `filters.whitelist`.
    V1_0,
    /// Current shape.
    V2_0,
}

impl ProtocolVersion {
    /// The version written by export and expected after migration.
    pub const CURRENT: ProtocolVersion = ProtocolVersion::V2_0;

    /// Every version an import understands, oldest first.
    pub const ALL: [ProtocolVersion; 2] = [ProtocolVersion::V1_0, ProtocolVersion::V2_0];

    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVersion::V1_0 => "1.0",
            ProtocolVersion::V2_0 => "2.0",
        }
    }

    /// Key of the allow-list section inside `filters` for this version.
    pub fn allowlist_key(self) -> &'static str {
        match self {
            ProtocolVersion::V1_0 => filters::WHITELIST,
            ProtocolVersion::V2_0 => filters::ALLOWLIST,
        }
    }

    /// Comma separated list of known tags, for error messages.
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a version tag is outside the known chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol version \"{0}\"")]
pub struct UnknownProtocolVersion(pub String);

impl FromStr for ProtocolVersion {
    type Err = UnknownProtocolVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownProtocolVersion(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Field definitions
// ---------------------------------------------------------------------------

/// A declared document field: its key, the coercions applied before the
/// type check, and the value used when an optional field is absent.
///
/// For array fields the chain is applied to each element.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef<T> {
    pub key: &'static str,
    pub preprocess: &'static [Preprocessor],
    pub default: Option<T>,
}

impl<T> FieldDef<T> {
    pub const fn required(key: &'static str, preprocess: &'static [Preprocessor]) -> Self {
        Self { key, preprocess, default: None }
    }

    pub const fn optional(
        key: &'static str,
        preprocess: &'static [Preprocessor],
        default: T,
    ) -> Self {
        Self { key, preprocess, default: Some(default) }
    }
}

/// Coercion chains shared by fields of the same kind.
pub mod chains {
    use super::*;

    pub const NONE: &[Preprocessor] = &[];
    pub const BOOLEAN: &[Preprocessor] = &[to_boolean];
    pub const NUMBER: &[Preprocessor] = &[to_number];
    pub const QUOTED_NUMBER: &[Preprocessor] = &[to_string_then_number];
    pub const NON_EMPTY_STRING: &[Preprocessor] = &[empty_string_to_absent];
    pub const CLEAN_NON_EMPTY_STRING: &[Preprocessor] = &[empty_string_to_absent, to_clean_string];
}

/// Top-level keys.
pub mod root {
    pub const PROTOCOL_VERSION: &str = "protocol-version";
    pub const GENERAL_SETTINGS: &str = "general-settings";
    pub const EXTENSION_SPECIFIC_SETTINGS: &str = "extension-specific-settings";
    pub const FILTERS: &str = "filters";
    pub const STEALTH: &str = "stealth";
}

/// `general-settings` fields.
pub mod general {
    use super::chains::*;
    use super::{AppearanceTheme, FieldDef, FiltersUpdatePeriod};

    pub const ALLOW_ACCEPTABLE_ADS: FieldDef<bool> =
        FieldDef::required("allow-acceptable-ads", BOOLEAN);
    pub const SHOW_BLOCKED_ADS_COUNT: FieldDef<bool> =
        FieldDef::required("show-blocked-ads-count", BOOLEAN);
    pub const AUTODETECT_FILTERS: FieldDef<bool> =
        FieldDef::required("autodetect-filters", BOOLEAN);
    pub const SAFEBROWSING_ENABLED: FieldDef<bool> =
        FieldDef::required("safebrowsing-enabled", BOOLEAN);
    pub const FILTERS_UPDATE_PERIOD: FieldDef<FiltersUpdatePeriod> =
        FieldDef::required("filters-update-period", QUOTED_NUMBER);
    pub const APPEARANCE_THEME: FieldDef<AppearanceTheme> =
        FieldDef::optional("appearance-theme", CLEAN_NON_EMPTY_STRING, AppearanceTheme::System);
}

/// `extension-specific-settings` fields.
pub mod extension {
    use super::chains::*;
    use super::FieldDef;

    pub const USE_OPTIMIZED_FILTERS: FieldDef<bool> =
        FieldDef::required("use-optimized-filters", BOOLEAN);
    pub const COLLECT_HITS_COUNT: FieldDef<bool> =
        FieldDef::required("collect-hits-count", BOOLEAN);
    pub const SHOW_CONTEXT_MENU: FieldDef<bool> =
        FieldDef::required("show-context-menu", BOOLEAN);
    pub const SHOW_INFO_ABOUT_ADGUARD: FieldDef<bool> =
        FieldDef::required("show-info-about-adguard", BOOLEAN);
    pub const SHOW_APP_UPDATED_INFO: FieldDef<bool> =
        FieldDef::required("show-app-updated-info", BOOLEAN);
    pub const HIDE_RATE_ADGUARD: FieldDef<bool> =
        FieldDef::required("hide-rate-adguard", BOOLEAN);
    pub const USER_RULES_EDITOR_WRAP: FieldDef<bool> =
        FieldDef::optional("user-rules-editor-wrap", BOOLEAN, false);
}

/// `filters` fields.
pub mod filters {
    use super::chains::*;
    use super::FieldDef;
    use std::collections::BTreeSet;

    pub const ENABLED_FILTERS: FieldDef<BTreeSet<u32>> =
        FieldDef::required("enabled-filters", QUOTED_NUMBER);
    pub const ENABLED_GROUPS: FieldDef<BTreeSet<u32>> =
        FieldDef::required("enabled-groups", QUOTED_NUMBER);
    pub const CUSTOM_FILTERS: &str = "custom-filters";
    pub const USER_FILTER: &str = "user-filter";
    pub const ALLOWLIST: &str = "allowlist";
    /// Protocol 1.0 name of [`ALLOWLIST`].
    pub const WHITELIST: &str = "whitelist";
}

/// Fields of one `filters.custom-filters` entry.
pub mod custom_filter {
    use super::chains::*;
    use super::FieldDef;

    pub const CUSTOM_URL: FieldDef<String> = FieldDef::required("customUrl", NON_EMPTY_STRING);
    /// Absent means the title is taken from the downloaded list header.
    pub const TITLE: FieldDef<Option<String>> =
        FieldDef::optional("title", NON_EMPTY_STRING, None);
    pub const TRUSTED: FieldDef<bool> = FieldDef::optional("trusted", BOOLEAN, false);
    pub const ENABLED: FieldDef<bool> = FieldDef::optional("enabled", BOOLEAN, true);
}

/// `filters.user-filter` fields.
pub mod user_filter {
    use super::chains::*;
    use super::FieldDef;

    pub const ENABLED: FieldDef<bool> = FieldDef::optional("enabled", BOOLEAN, true);
    pub const RULES: FieldDef<String> = FieldDef::required("rules", NONE);
    pub const DISABLED_RULES: FieldDef<String> =
        FieldDef::optional("disabled-rules", NONE, String::new());
}

/// `filters.allowlist` fields.
pub mod allowlist {
    use super::chains::*;
    use super::FieldDef;

    pub const ENABLED: FieldDef<bool> = FieldDef::optional("enabled", BOOLEAN, true);
    pub const INVERTED: FieldDef<bool> = FieldDef::optional("inverted", BOOLEAN, false);
    pub const DOMAINS: FieldDef<Vec<String>> = FieldDef::required("domains", NONE);
    pub const INVERTED_DOMAINS: FieldDef<Vec<String>> =
        FieldDef::required("inverted-domains", NONE);
}

/// `stealth` fields.
pub mod stealth {
    use super::chains::*;
    use super::FieldDef;

    pub const DISABLE_STEALTH_MODE: FieldDef<bool> =
        FieldDef::required("stealth_disable_stealth_mode", BOOLEAN);
    pub const HIDE_REFERRER: FieldDef<bool> =
        FieldDef::required("stealth-hide-referrer", BOOLEAN);
    pub const HIDE_SEARCH_QUERIES: FieldDef<bool> =
        FieldDef::required("stealth-hide-search-queries", BOOLEAN);
    pub const SEND_DO_NOT_TRACK: FieldDef<bool> =
        FieldDef::required("stealth-send-do-not-track", BOOLEAN);
    pub const BLOCK_WEBRTC: FieldDef<bool> = FieldDef::required("stealth-block-webrtc", BOOLEAN);
    pub const REMOVE_X_CLIENT_DATA: FieldDef<bool> =
        FieldDef::required("stealth-remove-x-client", BOOLEAN);
    pub const SELF_DESTRUCT_THIRD_PARTY_COOKIES: FieldDef<bool> =
        FieldDef::required("stealth-block-third-party-cookies", BOOLEAN);
    pub const SELF_DESTRUCT_THIRD_PARTY_COOKIES_TIME: FieldDef<i64> =
        FieldDef::required("stealth-block-third-party-cookies-time", NUMBER);
    pub const SELF_DESTRUCT_FIRST_PARTY_COOKIES: FieldDef<bool> =
        FieldDef::required("stealth-block-first-party-cookies", BOOLEAN);
    pub const SELF_DESTRUCT_FIRST_PARTY_COOKIES_TIME: FieldDef<i64> =
        FieldDef::required("stealth-block-first-party-cookies-time", NUMBER);
    pub const BLOCK_KNOWN_TRACKERS: FieldDef<bool> =
        FieldDef::optional("block-known-trackers", BOOLEAN, false);
    pub const STRIP_TRACKING_PARAMETERS: FieldDef<bool> =
        FieldDef::optional("strip-tracking-parameters", BOOLEAN, false);
}

// ---------------------------------------------------------------------------
// Enumerated values
// ---------------------------------------------------------------------------

/// UI colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AppearanceTheme {
    #[default]
    System,
    Dark,
    Light,
}

impl AppearanceTheme {
    pub const EXPECTED: &'static str = "one of \"system\", \"dark\", \"light\"";

    pub fn as_str(self) -> &'static str {
        match self {
            AppearanceTheme::System => "system",
            AppearanceTheme::Dark => "dark",
            AppearanceTheme::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(AppearanceTheme::System),
            "dark" => Some(AppearanceTheme::Dark),
            "light" => Some(AppearanceTheme::Light),
            _ => None,
        }
    }
}

/// How often filter lists are re-checked, stored in the document as
/// milliseconds. Only the enumerated values are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FiltersUpdatePeriod {
    /// `-1`: never auto-update.
    #[default]
    Never,
    /// `0`: use the product's default interval.
    Default,
    OneHour,
    SixHours,
    TwelveHours,
    OneDay,
    TwoDays,
}

impl FiltersUpdatePeriod {
    pub const EXPECTED: &'static str =
        "one of -1, 0, 3600000, 21600000, 43200000, 86400000, 172800000";

    /// Interval used for [`FiltersUpdatePeriod::Default`].
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(48 * 60 * 60);

    const HOUR_MS: i64 = 60 * 60 * 1000;

    pub fn as_millis(self) -> i64 {
        match self {
            FiltersUpdatePeriod::Never => -1,
            FiltersUpdatePeriod::Default => 0,
            FiltersUpdatePeriod::OneHour => Self::HOUR_MS,
            FiltersUpdatePeriod::SixHours => 6 * Self::HOUR_MS,
            FiltersUpdatePeriod::TwelveHours => 12 * Self::HOUR_MS,
            FiltersUpdatePeriod::OneDay => 24 * Self::HOUR_MS,
            FiltersUpdatePeriod::TwoDays => 48 * Self::HOUR_MS,
        }
    }

    pub fn from_millis(ms: i64) -> Option<Self> {
        [
            FiltersUpdatePeriod::Never,
            FiltersUpdatePeriod::Default,
            FiltersUpdatePeriod::OneHour,
            FiltersUpdatePeriod::SixHours,
            FiltersUpdatePeriod::TwelveHours,
            FiltersUpdatePeriod::OneDay,
            FiltersUpdatePeriod::TwoDays,
        ]
        .into_iter()
        .find(|p| p.as_millis() == ms)
    }

    /// Time between automatic checks, or `None` when auto-update is off.
    pub fn interval(self) -> Option<Duration> {
        match self {
            FiltersUpdatePeriod::Never => None,
            FiltersUpdatePeriod::Default => Some(Self::DEFAULT_INTERVAL),
            other => Some(Duration::from_millis(other.as_millis() as u64)),
        }
    }
}

/// Cookie lifetimes accept `-1` as "use the default / never expire".
pub const COOKIE_LIFETIME_SENTINEL: i64 = -1;

// ---------------------------------------------------------------------------
// Typed configuration
// ---------------------------------------------------------------------------

/// A fully validated settings document.
///
/// Every field carries its final type; optional document fields have already
/// been defaulted. Values are only produced by a successful import or by
/// cloning [`crate::defaults::DEFAULT_CONFIG`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub general_settings: GeneralSettings,
    pub extension_specific_settings: ExtensionSpecificSettings,
    pub filters: FiltersConfig,
    pub stealth: StealthConfig,
}

impl Default for Config {
    fn default() -> Self {
        crate::defaults::default_config()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralSettings {
    pub allow_acceptable_ads: bool,
    pub show_blocked_ads_count: bool,
    pub autodetect_filters: bool,
    pub safebrowsing_enabled: bool,
    pub filters_update_period: FiltersUpdatePeriod,
    pub appearance_theme: AppearanceTheme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSpecificSettings {
    pub use_optimized_filters: bool,
    pub collect_hits_count: bool,
    pub show_context_menu: bool,
    pub show_info_about_adguard: bool,
    pub show_app_updated_info: bool,
    pub hide_rate_adguard: bool,
    pub user_rules_editor_wrap: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiltersConfig {
    /// Enabled filter IDs. Unique by construction; order is not significant.
    pub enabled_filters: BTreeSet<u32>,
    /// Enabled group IDs.
    pub enabled_groups: BTreeSet<u32>,
    pub custom_filters: Vec<CustomFilterConfig>,
    pub user_filter: UserFilterConfig,
    pub allowlist: AllowlistConfig,
}

/// A user-supplied remote filter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFilterConfig {
    /// Non-empty subscription URL.
    pub custom_url: String,
    pub title: Option<String>,
    pub trusted: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilterConfig {
    pub enabled: bool,
    /// Raw rule text, newline separated.
    pub rules: String,
    pub disabled_rules: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistConfig {
    pub enabled: bool,
    /// When set, filtering applies only to `inverted_domains`.
    pub inverted: bool,
    pub domains: Vec<String>,
    pub inverted_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthConfig {
    pub disable_stealth_mode: bool,
    pub hide_referrer: bool,
    pub hide_search_queries: bool,
    pub send_do_not_track: bool,
    pub block_webrtc: bool,
    pub remove_x_client_data: bool,
    pub self_destruct_third_party_cookies: bool,
    /// Minutes, or [`COOKIE_LIFETIME_SENTINEL`].
    pub self_destruct_third_party_cookies_time: i64,
    pub self_destruct_first_party_cookies: bool,
    /// Minutes, or [`COOKIE_LIFETIME_SENTINEL`].
    pub self_destruct_first_party_cookies_time: i64,
    pub block_known_trackers: bool,
    pub strip_tracking_parameters: bool,
}
