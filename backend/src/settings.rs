//! Daemon configuration loaded via OrthoConfig.
//!
//! Values layer CLI flags over `PEAPOD_*` environment variables over the
//! config file. Paths may start with `~/`.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::JobSchedulerConfig;

const DEFAULT_DATABASE_PATH: &str = "~/.peapod/db";
const DEFAULT_FILE_PATH: &str = "~/.peapod/file";

/// Configuration for the `peapodd` daemon.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PEAPOD")]
pub struct PeapodSettings {
    /// Database file location.
    pub database_path: Option<String>,
    /// Directory holding stored media files.
    pub file_path: Option<String>,
    /// Cap on concurrently executing jobs; zero is unbounded.
    #[ortho_config(default = 0)]
    pub max_concurrent_jobs: usize,
}

impl PeapodSettings {
    /// Database file path with `~` expanded.
    pub fn database_path(&self) -> PathBuf {
        expand(self.database_path.as_deref().unwrap_or(DEFAULT_DATABASE_PATH))
    }

    /// Media directory with `~` expanded.
    pub fn file_path(&self) -> PathBuf {
        expand(self.file_path.as_deref().unwrap_or(DEFAULT_FILE_PATH))
    }

    /// Scheduler tuning derived from these settings.
    pub fn scheduler_config(&self) -> JobSchedulerConfig {
        JobSchedulerConfig {
            max_concurrent_jobs: (self.max_concurrent_jobs > 0)
                .then_some(self.max_concurrent_jobs),
        }
    }
}

fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
mod tests {
    //! Unit tests for daemon configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> PeapodSettings {
        PeapodSettings::load_from_iter([OsString::from("peapodd")]).expect("config should load")
    }

    #[rstest]
    fn defaults_live_under_home() {
        let _guard = lock_env([
            ("HOME", Some("/home/tester".to_owned())),
            ("PEAPOD_DATABASE_PATH", None::<String>),
            ("PEAPOD_FILE_PATH", None::<String>),
            ("PEAPOD_MAX_CONCURRENT_JOBS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.max_concurrent_jobs, 0);
        assert_eq!(settings.database_path(), PathBuf::from("/home/tester/.peapod/db"));
        assert_eq!(settings.file_path(), PathBuf::from("/home/tester/.peapod/file"));
        assert_eq!(settings.scheduler_config(), JobSchedulerConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("HOME", Some("/home/tester".to_owned())),
            ("PEAPOD_DATABASE_PATH", Some("/var/lib/peapod/db".to_owned())),
            ("PEAPOD_FILE_PATH", Some("~/media".to_owned())),
            ("PEAPOD_MAX_CONCURRENT_JOBS", Some("4".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.database_path(), PathBuf::from("/var/lib/peapod/db"));
        assert_eq!(settings.file_path(), PathBuf::from("/home/tester/media"));
        assert_eq!(settings.scheduler_config().max_concurrent_jobs, Some(4));
    }

    #[rstest]
    #[case(0, None)]
    #[case(1, Some(1))]
    #[case(2, Some(2))]
    fn zero_cap_means_unbounded(#[case] configured: usize, #[case] expected: Option<usize>) {
        let settings = PeapodSettings {
            database_path: None,
            file_path: None,
            max_concurrent_jobs: configured,
        };
        assert_eq!(settings.scheduler_config().max_concurrent_jobs, expected);
    }
}
