//! Runtime configuration.
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `CAGR_`-prefixed environment variables.

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::cagr::parse::RowPolicy;
use crate::cagr::session::{FetchOptions, PaginationMode};
use crate::cagr::{BASE_URL, HttpConnector};
use crate::crawler::PipelineSettings;

/// Config file read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "cagr.toml";

const ENV_PREFIX: &str = "CAGR_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landing page and search endpoint.
    pub base_url: Url,
    /// Level for this crate's log targets; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    /// Pause before every form post, in milliseconds.
    pub request_delay_ms: u64,
    pub user_agent: String,
    /// Pages a fetcher may run ahead of its parser.
    pub page_queue_capacity: usize,
    pub pagination: PaginationMode,
    pub row_policy: RowPolicy,
    /// Cancel all pipelines once one of them fails.
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(BASE_URL).expect("BASE_URL is a valid URL"),
            log_level: "info".to_string(),
            request_timeout: 30,
            request_delay_ms: 0,
            user_agent: concat!("cagr/", env!("CARGO_PKG_VERSION")).to_string(),
            page_queue_capacity: 4,
            pagination: PaginationMode::default(),
            row_policy: RowPolicy::default(),
            fail_fast: false,
        }
    }
}

impl Config {
    pub fn figment(path: Option<&Path>) -> Figment {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.page_queue_capacity == 0 {
            return Err("page_queue_capacity must be at least 1".to_string().into());
        }
        if self.request_timeout == 0 {
            return Err("request_timeout must be at least 1 second".to_string().into());
        }
        Ok(())
    }

    pub fn connector(&self) -> HttpConnector {
        HttpConnector::new(
            Duration::from_secs(self.request_timeout),
            self.user_agent.clone(),
        )
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            endpoint: self.base_url.clone(),
            fetch: FetchOptions {
                mode: self.pagination,
                request_delay: Duration::from_millis(self.request_delay_ms),
            },
            row_policy: self.row_policy,
            queue_capacity: self.page_queue_capacity,
            fail_fast: self.fail_fast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None)?;
            assert_eq!(config.base_url.as_str(), BASE_URL);
            assert_eq!(config.pagination, PaginationMode::Counted);
            assert_eq!(config.row_policy, RowPolicy::Strict);
            assert_eq!(config.page_queue_capacity, 4);
            assert!(!config.fail_fast);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                    pagination = "until-repeat"
                    row_policy = "lenient"
                    request_delay_ms = 250
                "#,
            )?;
            jail.set_env("CAGR_ROW_POLICY", "strict");
            jail.set_env("CAGR_FAIL_FAST", "true");

            let config = Config::load(None)?;
            assert_eq!(config.pagination, PaginationMode::UntilRepeat);
            assert_eq!(config.row_policy, RowPolicy::Strict);
            assert!(config.fail_fast);

            let settings = config.pipeline_settings();
            assert_eq!(settings.fetch.request_delay, Duration::from_millis(250));
            assert_eq!(settings.fetch.mode, PaginationMode::UntilRepeat);
            Ok(())
        });
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("CAGR_PAGE_QUEUE_CAPACITY", "0");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }
}
