//! Export a [`Config`] as a current-version settings document.
//!
//! Export is the structural dual of import: every field is written, optional
//! ones included, using the same key constants the validator reads.

use crate::schema::{
    allowlist, custom_filter, extension, filters, general, root, stealth, user_filter,
    AllowlistConfig, Config, CustomFilterConfig, ExtensionSpecificSettings, FiltersConfig,
    GeneralSettings, ProtocolVersion, StealthConfig, UserFilterConfig,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Serialize `config` into the documented JSON shape.
pub fn export(config: &Config) -> Value {
    object([
        (root::PROTOCOL_VERSION, Value::from(ProtocolVersion::CURRENT.as_str())),
        (root::GENERAL_SETTINGS, general_settings(&config.general_settings)),
        (
            root::EXTENSION_SPECIFIC_SETTINGS,
            extension_specific_settings(&config.extension_specific_settings),
        ),
        (root::FILTERS, filters_section(&config.filters)),
        (root::STEALTH, stealth_section(&config.stealth)),
    ])
}

/// Pretty-printed JSON text of [`export`].
pub fn export_string(config: &Config) -> String {
    format!("{:#}", export(config))
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<Map<_, _>>(),
    )
}

fn ids(set: &BTreeSet<u32>) -> Value {
    set.iter().copied().map(Value::from).collect()
}

fn general_settings(s: &GeneralSettings) -> Value {
    object([
        (general::ALLOW_ACCEPTABLE_ADS.key, s.allow_acceptable_ads.into()),
        (general::SHOW_BLOCKED_ADS_COUNT.key, s.show_blocked_ads_count.into()),
        (general::AUTODETECT_FILTERS.key, s.autodetect_filters.into()),
        (general::SAFEBROWSING_ENABLED.key, s.safebrowsing_enabled.into()),
        (general::FILTERS_UPDATE_PERIOD.key, s.filters_update_period.as_millis().into()),
        (general::APPEARANCE_THEME.key, s.appearance_theme.as_str().into()),
    ])
}

fn extension_specific_settings(s: &ExtensionSpecificSettings) -> Value {
    object([
        (extension::USE_OPTIMIZED_FILTERS.key, s.use_optimized_filters.into()),
        (extension::COLLECT_HITS_COUNT.key, s.collect_hits_count.into()),
        (extension::SHOW_CONTEXT_MENU.key, s.show_context_menu.into()),
        (extension::SHOW_INFO_ABOUT_ADGUARD.key, s.show_info_about_adguard.into()),
        (extension::SHOW_APP_UPDATED_INFO.key, s.show_app_updated_info.into()),
        (extension::HIDE_RATE_ADGUARD.key, s.hide_rate_adguard.into()),
        (extension::USER_RULES_EDITOR_WRAP.key, s.user_rules_editor_wrap.into()),
    ])
}

fn filters_section(f: &FiltersConfig) -> Value {
    object([
        (filters::ENABLED_FILTERS.key, ids(&f.enabled_filters)),
        (filters::ENABLED_GROUPS.key, ids(&f.enabled_groups)),
        (
            filters::CUSTOM_FILTERS,
            f.custom_filters.iter().map(custom_filter_entry).collect(),
        ),
        (filters::USER_FILTER, user_filter_section(&f.user_filter)),
        (ProtocolVersion::CURRENT.allowlist_key(), allowlist_section(&f.allowlist)),
    ])
}

fn custom_filter_entry(c: &CustomFilterConfig) -> Value {
    let mut entry = Map::new();
    entry.insert(custom_filter::CUSTOM_URL.key.to_string(), c.custom_url.clone().into());
    // No title means "use the list header"; leave the key out. An empty
    // title reads back as absent, so it is treated the same way.
    if let Some(title) = c.title.as_ref().filter(|t| !t.is_empty()) {
        entry.insert(custom_filter::TITLE.key.to_string(), title.clone().into());
    }
    entry.insert(custom_filter::TRUSTED.key.to_string(), c.trusted.into());
    entry.insert(custom_filter::ENABLED.key.to_string(), c.enabled.into());
    Value::Object(entry)
}

fn user_filter_section(u: &UserFilterConfig) -> Value {
    object([
        (user_filter::ENABLED.key, u.enabled.into()),
        (user_filter::RULES.key, u.rules.clone().into()),
        (user_filter::DISABLED_RULES.key, u.disabled_rules.clone().into()),
    ])
}

fn allowlist_section(a: &AllowlistConfig) -> Value {
    object([
        (allowlist::ENABLED.key, a.enabled.into()),
        (allowlist::INVERTED.key, a.inverted.into()),
        (allowlist::DOMAINS.key, a.domains.clone().into()),
        (allowlist::INVERTED_DOMAINS.key, a.inverted_domains.clone().into()),
    ])
}

fn stealth_section(s: &StealthConfig) -> Value {
    object([
        (stealth::DISABLE_STEALTH_MODE.key, s.disable_stealth_mode.into()),
        (stealth::HIDE_REFERRER.key, s.hide_referrer.into()),
        (stealth::HIDE_SEARCH_QUERIES.key, s.hide_search_queries.into()),
        (stealth::SEND_DO_NOT_TRACK.key, s.send_do_not_track.into()),
        (stealth::BLOCK_WEBRTC.key, s.block_webrtc.into()),
        (stealth::REMOVE_X_CLIENT_DATA.key, s.remove_x_client_data.into()),
        (
            stealth::SELF_DESTRUCT_THIRD_PARTY_COOKIES.key,
            s.self_destruct_third_party_cookies.into(),
        ),
        (
            stealth::SELF_DESTRUCT_THIRD_PARTY_COOKIES_TIME.key,
            s.self_destruct_third_party_cookies_time.into(),
        ),
        (
            stealth::SELF_DESTRUCT_FIRST_PARTY_COOKIES.key,
            s.self_destruct_first_party_cookies.into(),
        ),
        (
            stealth::SELF_DESTRUCT_FIRST_PARTY_COOKIES_TIME.key,
            s.self_destruct_first_party_cookies_time.into(),
        ),
        (stealth::BLOCK_KNOWN_TRACKERS.key, s.block_known_trackers.into()),
        (stealth::STRIP_TRACKING_PARAMETERS.key, s.strip_tracking_parameters.into()),
    ])
}
