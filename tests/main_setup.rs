use docs_guard::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic};

// --- Setup/Teardown Utilities ---

/// Utility to run a test function and restore environment variables afterward
fn run_with_env<T, R>(test: T, cleanup_vars: Vec<&'static str>) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    // Save current environment variables
    let originals: Vec<(String, Option<String>)> = cleanup_vars
        .iter()
        .map(|&var| (var.to_string(), env::var(var).ok()))
        .collect();

    // Run the test
    let result = panic::catch_unwind(test);

    // Restore original environment variables
    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(&key, val);
            } else {
                env::remove_var(&key);
            }
        }
    }

    // Re-panic if the test failed
    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_defaults_to_local() {
    run_with_env(
        || {
            unsafe {
                env::remove_var("APP_ENV");
                env::remove_var("BIND_ADDR");
            }

            let config = AppConfig::load();

            assert_eq!(config.env, Env::Local);
            assert_eq!(config.bind_addr, "0.0.0.0:3000");
            // Local traffic is assumed plain HTTP for the same-origin identity call.
            assert_eq!(config.default_scheme, "http");
        },
        vec!["APP_ENV", "BIND_ADDR"],
    );
}

#[test]
#[serial]
fn test_app_config_production_uses_https_default() {
    run_with_env(
        || {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::remove_var("BIND_ADDR");
            }

            let config = AppConfig::load();

            assert_eq!(config.env, Env::Production);
            assert_eq!(config.default_scheme, "https");
        },
        vec!["APP_ENV", "BIND_ADDR"],
    );
}

#[test]
#[serial]
fn test_app_config_bind_addr_override() {
    run_with_env(
        || {
            unsafe {
                env::remove_var("APP_ENV");
                env::set_var("BIND_ADDR", "127.0.0.1:8080");
            }

            let config = AppConfig::load();

            assert_eq!(config.bind_addr, "127.0.0.1:8080");
        },
        vec!["APP_ENV", "BIND_ADDR"],
    );
}

#[test]
#[serial]
fn test_app_config_unknown_env_falls_back_to_local() {
    run_with_env(
        || {
            unsafe {
                env::set_var("APP_ENV", "staging");
            }

            let config = AppConfig::load();

            assert_eq!(config.env, Env::Local);
        },
        vec!["APP_ENV"],
    );
}

#[test]
fn test_default_config_matches_local_load() {
    // The test-oriented Default impl mirrors what load() produces with no
    // environment set.
    let config = AppConfig::default();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.default_scheme, "http");
}
