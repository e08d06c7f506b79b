use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::cli::SystemCli;
use crate::core::error::JobDeckError;

const MIN_REFRESH_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub jobs_path: PathBuf,
    pub refresh_interval: Duration,
    pub retention_days: u32,
    pub log_file: Option<PathBuf>,
    pub log_level: Level,
}

impl Config {
    pub fn from_cli(cli: SystemCli) -> Result<Self, JobDeckError> {
        if cli.refresh_ms < MIN_REFRESH_MS {
            return Err(JobDeckError::InvalidConfig {
                message: format!(
                    "--refresh-ms must be at least {MIN_REFRESH_MS} (got {})",
                    cli.refresh_ms
                ),
            });
        }

        if cli.retention_days == 0 {
            return Err(JobDeckError::InvalidConfig {
                message: "--retention-days must be positive".to_string(),
            });
        }

        let log_level = Level::from_str(&cli.log_level).map_err(|_| JobDeckError::InvalidConfig {
            message: format!("unknown log level '{}'", cli.log_level),
        })?;

        Ok(Self {
            jobs_path: cli.jobs,
            refresh_interval: Duration::from_millis(cli.refresh_ms),
            retention_days: cli.retention_days,
            log_file: cli.log_file,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn config(args: &[&str]) -> Result<Config, JobDeckError> {
        let mut argv = vec!["jobdeck"];
        argv.extend_from_slice(args);
        Config::from_cli(SystemCli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn defaults_are_valid() {
        let config = config(&[]).unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(2));
        assert_eq!(config.retention_days, 90);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn accepts_overrides() {
        let config = config(&[
            "state/jobs.json",
            "--refresh-ms",
            "500",
            "--log-level",
            "debug",
            "--log-file",
            "jobdeck.log",
        ])
        .unwrap();
        assert_eq!(config.jobs_path, PathBuf::from("state/jobs.json"));
        assert_eq!(config.refresh_interval, Duration::from_millis(500));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.log_file, Some(PathBuf::from("jobdeck.log")));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            config(&["--refresh-ms", "10"]),
            Err(JobDeckError::InvalidConfig { .. })
        ));
        assert!(matches!(
            config(&["--retention-days", "0"]),
            Err(JobDeckError::InvalidConfig { .. })
        ));
        assert!(matches!(
            config(&["--log-level", "loud"]),
            Err(JobDeckError::InvalidConfig { .. })
        ));
    }
}
