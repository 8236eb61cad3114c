//! Built-in default settings, used when no stored settings exist.
//!
//! The defaults are built once into [`DEFAULT_CONFIG`] and never mutated.
//! Callers that want to edit them take a clone via [`default_config`].

use crate::schema::{
    AllowlistConfig, AppearanceTheme, Config, ExtensionSpecificSettings, FiltersConfig,
    FiltersUpdatePeriod, GeneralSettings, StealthConfig, UserFilterConfig,
};
use once_cell::sync::Lazy;

/// Filters enabled on a fresh install.
pub const DEFAULT_ENABLED_FILTERS: [u32; 2] = [2, 10];

/// Filter groups enabled on a fresh install.
pub const DEFAULT_ENABLED_GROUPS: [u32; 4] = [0, 1, 6, 7];

/// Default third-party cookie lifetime, in minutes (48 hours).
pub const DEFAULT_THIRD_PARTY_COOKIES_TIME: i64 = 2880;

/// Default first-party cookie lifetime, in minutes (72 hours).
pub const DEFAULT_FIRST_PARTY_COOKIES_TIME: i64 = 4320;

/// Process-wide default settings.
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(builtin_defaults);

/// An owned copy of the default settings.
pub fn default_config() -> Config {
    DEFAULT_CONFIG.clone()
}

fn builtin_defaults() -> Config {
    Config {
        general_settings: GeneralSettings {
            allow_acceptable_ads: true,
            show_blocked_ads_count: true,
            autodetect_filters: true,
            safebrowsing_enabled: false,
            filters_update_period: FiltersUpdatePeriod::Never,
            appearance_theme: AppearanceTheme::System,
        },
        extension_specific_settings: ExtensionSpecificSettings {
            use_optimized_filters: false,
            collect_hits_count: false,
            show_context_menu: true,
            show_info_about_adguard: true,
            show_app_updated_info: true,
            hide_rate_adguard: false,
            user_rules_editor_wrap: false,
        },
        filters: FiltersConfig {
            enabled_filters: DEFAULT_ENABLED_FILTERS.into_iter().collect(),
            enabled_groups: DEFAULT_ENABLED_GROUPS.into_iter().collect(),
            custom_filters: Vec::new(),
            user_filter: UserFilterConfig {
                enabled: true,
                rules: String::new(),
                disabled_rules: String::new(),
            },
            allowlist: AllowlistConfig {
                enabled: true,
                inverted: false,
                domains: Vec::new(),
                inverted_domains: Vec::new(),
            },
        },
        stealth: StealthConfig {
            disable_stealth_mode: true,
            hide_referrer: true,
            hide_search_queries: true,
            send_do_not_track: true,
            block_webrtc: false,
            remove_x_client_data: false,
            self_destruct_third_party_cookies: true,
            self_destruct_third_party_cookies_time: DEFAULT_THIRD_PARTY_COOKIES_TIME,
            self_destruct_first_party_cookies: false,
            self_destruct_first_party_cookies_time: DEFAULT_FIRST_PARTY_COOKIES_TIME,
            block_known_trackers: false,
            strip_tracking_parameters: false,
        },
    }
}
