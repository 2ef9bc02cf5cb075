//! Configuration parsing through the crate's public entry point.

use std::collections::HashMap;
use std::env::VarError;

use shelfscan_core::{build_app_config, AppConfig, ConfigError};

fn lookup(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Result<String, VarError> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    move |key| map.get(key).map(|v| (*v).to_owned()).ok_or(VarError::NotPresent)
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = build_app_config(lookup(&[])).expect("defaults are valid");
    assert_eq!(
        config,
        AppConfig {
            log_level: "info".into(),
            request_timeout_secs: 30,
            user_agent: "shelfscan/0.1 (product-extraction)".into(),
            max_retries: 3,
            retry_backoff_base_secs: 2,
        }
    );
}

#[test]
fn fetch_settings_can_be_overridden() {
    let config = build_app_config(lookup(&[
        ("SHELFSCAN_MAX_RETRIES", "5"),
        ("SHELFSCAN_RETRY_BACKOFF_BASE_SECS", "0"),
    ]))
    .expect("overrides are valid");
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.retry_backoff_base_secs, 0);
}

#[test]
fn invalid_backoff_names_the_variable() {
    let err = build_app_config(lookup(&[("SHELFSCAN_RETRY_BACKOFF_BASE_SECS", "soon")]))
        .expect_err("non-numeric backoff is rejected");
    assert!(matches!(
        err,
        ConfigError::InvalidEnvVar { ref var, .. } if var == "SHELFSCAN_RETRY_BACKOFF_BASE_SECS"
    ));
}
