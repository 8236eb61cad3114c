//! Settings documents shared by the unit tests.

use serde_json::{json, Value};

/// A protocol 1.0 document holding the shipped defaults plus a small allow-list.
pub(crate) fn settings_v1() -> Value {
    json!({
        "protocol-version": "1.0",
        "general-settings": {
            "allow-acceptable-ads": true,
            "show-blocked-ads-count": true,
            "autodetect-filters": true,
            "safebrowsing-enabled": false,
            "filters-update-period": -1,
            "appearance-theme": "system"
        },
        "extension-specific-settings": {
            "use-optimized-filters": false,
            "collect-hits-count": false,
            "show-context-menu": true,
            "show-info-about-adguard": false,
            "show-app-updated-info": true,
            "hide-rate-adguard": true,
            "user-rules-editor-wrap": false
        },
        "filters": {
            "enabled-filters": [2, 10],
            "enabled-groups": [0, 1, 6, 7],
            "custom-filters": [],
            "user-filter": {
                "enabled": true,
                "rules": "",
                "disabled-rules": ""
            },
            "whitelist": {
                "enabled": false,
                "inverted": false,
                "domains": ["allowdomain.com", "allowdomain.net"],
                "inverted-domains": ["invertedallowlist.com"]
            }
        },
        "stealth": {
            "stealth_disable_stealth_mode": true,
            "stealth-hide-referrer": true,
            "stealth-hide-search-queries": true,
            "stealth-send-do-not-track": true,
            "stealth-block-webrtc": false,
            "stealth-remove-x-client": true,
            "stealth-block-third-party-cookies": true,
            "stealth-block-third-party-cookies-time": 2880,
            "stealth-block-first-party-cookies": false,
            "stealth-block-first-party-cookies-time": 4320,
            "block-known-trackers": false,
            "strip-tracking-parameters": false
        }
    })
}

/// [`settings_v1`] after the 1.0 to 2.0 migration.
pub(crate) fn settings_v1_migrated() -> Value {
    let mut doc = settings_v1();
    doc["protocol-version"] = json!("2.0");
    let filters = doc["filters"].as_object_mut().expect("filters section");
    let allowlist = filters.remove("whitelist").expect("whitelist section");
    filters.insert("allowlist".to_string(), allowlist);
    doc
}

/// A protocol 2.0 export with every section populated.
pub(crate) fn settings_v2() -> Value {
    json!({
        "protocol-version": "2.0",
        "general-settings": {
            "allow-acceptable-ads": false,
            "show-blocked-ads-count": true,
            "autodetect-filters": true,
            "safebrowsing-enabled": true,
            "filters-update-period": 86400000,
            "appearance-theme": "dark"
        },
        "extension-specific-settings": {
            "use-optimized-filters": true,
            "collect-hits-count": false,
            "show-context-menu": true,
            "show-info-about-adguard": false,
            "show-app-updated-info": true,
            "hide-rate-adguard": true,
            "user-rules-editor-wrap": false
        },
        "filters": {
            "enabled-filters": [1, 2, 3, 4, 6, 11, 14, 16, 17, 224, 1001, 1002],
            "enabled-groups": [0, 1, 2, 3, 4, 5, 6, 7],
            "custom-filters": [
                {
                    "customUrl": "https://testcases.agrd.dev/Filters/css-rules/css-rules.txt",
                    "title": "Rules for CSS tests",
                    "trusted": false,
                    "enabled": false
                },
                {
                    "customUrl": concat!(
                        "https://testcases.agrd.dev/Filters/",
                        "element-hiding-rules/test-element-hiding-rules.txt"
                    ),
                    "title": "Rules for element hiding rules test",
                    "trusted": false,
                    "enabled": true
                },
                {
                    "customUrl": concat!(
                        "https://testcases.agrd.dev/Filters/",
                        "generichide-rules/generichide-rules.txt"
                    ),
                    "title": "Rules for generic hide tests",
                    "trusted": true,
                    "enabled": true
                }
            ],
            "user-filter": {
                "enabled": true,
                "rules": "||example.com^$document\nexample.org###h1",
                "disabled-rules": ""
            },
            "allowlist": {
                "enabled": true,
                "inverted": true,
                "domains": ["domain1.com", "domain2.com"],
                "inverted-domains": ["domain3.com", "domain4.com"]
            }
        },
        "stealth": {
            "stealth_disable_stealth_mode": false,
            "stealth-hide-referrer": true,
            "stealth-hide-search-queries": true,
            "stealth-send-do-not-track": true,
            "stealth-block-webrtc": true,
            "stealth-remove-x-client": true,
            "stealth-block-third-party-cookies": true,
            "stealth-block-third-party-cookies-time": 1080,
            "stealth-block-first-party-cookies": true,
            "stealth-block-first-party-cookies-time": 4444,
            "block-known-trackers": true,
            "strip-tracking-parameters": true
        }
    })
}

/// Strategies producing configs that satisfy every schema constraint.
pub(crate) mod arb {
    use crate::schema::{
        AllowlistConfig, AppearanceTheme, Config, CustomFilterConfig, ExtensionSpecificSettings,
        FiltersConfig, FiltersUpdatePeriod, GeneralSettings, StealthConfig, UserFilterConfig,
    };
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn update_period() -> impl Strategy<Value = FiltersUpdatePeriod> {
        prop::sample::select(vec![
            FiltersUpdatePeriod::Never,
            FiltersUpdatePeriod::Default,
            FiltersUpdatePeriod::OneHour,
            FiltersUpdatePeriod::SixHours,
            FiltersUpdatePeriod::TwelveHours,
            FiltersUpdatePeriod::OneDay,
            FiltersUpdatePeriod::TwoDays,
        ])
    }

    fn theme() -> impl Strategy<Value = AppearanceTheme> {
        prop::sample::select(vec![
            AppearanceTheme::System,
            AppearanceTheme::Dark,
            AppearanceTheme::Light,
        ])
    }

    pub(crate) fn cookie_lifetime() -> impl Strategy<Value = i64> {
        -1i64..1_000_000
    }

    fn ids() -> impl Strategy<Value = BTreeSet<u32>> {
        prop::collection::btree_set(0u32..2_000, 0..8)
    }

    fn domains() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z]{1,10}\\.(com|org|net)", 0..4)
    }

    fn general() -> impl Strategy<Value = GeneralSettings> {
        (prop::array::uniform4(any::<bool>()), update_period(), theme()).prop_map(
            |([ads, count, autodetect, safebrowsing], period, theme)| GeneralSettings {
                allow_acceptable_ads: ads,
                show_blocked_ads_count: count,
                autodetect_filters: autodetect,
                safebrowsing_enabled: safebrowsing,
                filters_update_period: period,
                appearance_theme: theme,
            },
        )
    }

    fn extension() -> impl Strategy<Value = ExtensionSpecificSettings> {
        prop::array::uniform7(any::<bool>()).prop_map(|f| ExtensionSpecificSettings {
            use_optimized_filters: f[0],
            collect_hits_count: f[1],
            show_context_menu: f[2],
            show_info_about_adguard: f[3],
            show_app_updated_info: f[4],
            hide_rate_adguard: f[5],
            user_rules_editor_wrap: f[6],
        })
    }

    fn custom_filter() -> impl Strategy<Value = CustomFilterConfig> {
        (
            "https://[a-z]{1,12}\\.org/[a-z]{1,8}\\.txt",
            prop::option::of("List [A-Za-z0-9 ]{0,16}"),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(custom_url, title, trusted, enabled)| CustomFilterConfig {
                custom_url,
                title,
                trusted,
                enabled,
            })
    }

    fn filters() -> impl Strategy<Value = FiltersConfig> {
        let user_filter = (any::<bool>(), "[a-z0-9|^$#.\n]{0,40}", "[a-z0-9|^$#.\n]{0,20}")
            .prop_map(|(enabled, rules, disabled_rules)| UserFilterConfig {
                enabled,
                rules,
                disabled_rules,
            });
        let allowlist = (any::<bool>(), any::<bool>(), domains(), domains()).prop_map(
            |(enabled, inverted, domains, inverted_domains)| AllowlistConfig {
                enabled,
                inverted,
                domains,
                inverted_domains,
            },
        );
        (
            ids(),
            ids(),
            prop::collection::vec(custom_filter(), 0..4),
            user_filter,
            allowlist,
        )
            .prop_map(
                |(enabled_filters, enabled_groups, custom_filters, user_filter, allowlist)| {
                    FiltersConfig {
                        enabled_filters,
                        enabled_groups,
                        custom_filters,
                        user_filter,
                        allowlist,
                    }
                },
            )
    }

    fn stealth() -> impl Strategy<Value = StealthConfig> {
        (prop::array::uniform10(any::<bool>()), cookie_lifetime(), cookie_lifetime()).prop_map(
            |(f, third_party_time, first_party_time)| StealthConfig {
                disable_stealth_mode: f[0],
                hide_referrer: f[1],
                hide_search_queries: f[2],
                send_do_not_track: f[3],
                block_webrtc: f[4],
                remove_x_client_data: f[5],
                self_destruct_third_party_cookies: f[6],
                self_destruct_third_party_cookies_time: third_party_time,
                self_destruct_first_party_cookies: f[7],
                self_destruct_first_party_cookies_time: first_party_time,
                block_known_trackers: f[8],
                strip_tracking_parameters: f[9],
            },
        )
    }

    pub(crate) fn config() -> impl Strategy<Value = Config> {
        (general(), extension(), filters(), stealth()).prop_map(
            |(general_settings, extension_specific_settings, filters, stealth)| Config {
                general_settings,
                extension_specific_settings,
                filters,
                stealth,
            },
        )
    }
}
