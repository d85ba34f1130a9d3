use std::env;
use std::path::PathBuf;

use geodata_core::config::{ENV_BASE_DIR, ENV_KEEP_GOING};
use geodata_core::{FailurePolicy, FetchConfig, Preset};
use serial_test::serial;

/// Restores the captured variables when dropped, even if the test body panics.
struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(value) => unsafe { env::set_var(key, value) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }
}

fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], body: F) {
    let _guard = EnvGuard {
        previous: vars
            .iter()
            .map(|(key, _)| (key.to_string(), env::var(key).ok()))
            .collect(),
    };
    for (key, value) in vars {
        match value {
            Some(value) => unsafe { env::set_var(key, value) },
            None => unsafe { env::remove_var(key) },
        }
    }
    body();
}

#[test]
#[serial]
fn base_dir_override_wins_over_preset() {
    with_env(
        &[(ENV_BASE_DIR, Some("scratch/geo")), (ENV_KEEP_GOING, None)],
        || {
            let mut config = FetchConfig::from_preset(Preset::DownloadedData);
            config.apply_env();
            assert_eq!(config.base_dir, PathBuf::from("scratch/geo"));
            assert_eq!(config.policy, FailurePolicy::FailFast);
        },
    );
}

#[test]
#[serial]
fn keep_going_flag_is_read() {
    with_env(
        &[(ENV_BASE_DIR, None), (ENV_KEEP_GOING, Some("yes"))],
        || {
            let mut config = FetchConfig::default();
            config.apply_env();
            assert_eq!(config.base_dir, PathBuf::from("data"));
            assert_eq!(config.policy, FailurePolicy::KeepGoing);
        },
    );
}

#[test]
#[serial]
fn empty_base_dir_is_ignored() {
    with_env(&[(ENV_BASE_DIR, Some("")), (ENV_KEEP_GOING, Some("0"))], || {
        let mut config = FetchConfig::from_preset(Preset::DownloadedData);
        config.apply_env();
        assert_eq!(config.base_dir, PathBuf::from("downloaded_data"));
        assert_eq!(config.policy, FailurePolicy::FailFast);
    });
}

#[test]
#[serial]
fn variables_are_restored_after_a_panicking_body() {
    unsafe {
        env::set_var(ENV_BASE_DIR, "before");
    }
    let outcome = std::panic::catch_unwind(|| {
        with_env(&[(ENV_BASE_DIR, Some("during"))], || panic!("body failed"));
    });
    assert!(outcome.is_err());
    assert_eq!(env::var(ENV_BASE_DIR).ok().as_deref(), Some("before"));
    unsafe {
        env::remove_var(ENV_BASE_DIR);
    }
}
