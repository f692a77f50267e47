//! Application configuration.
//!
//! The deployment host is chosen from a fixed allow-list; any unrecognized
//! host falls back to the default (development) host. Configuration is read
//! from YAML and the host may be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use hs_jobs::PollOptions;
use hs_present::{BandEntry, ColorBand, PresentOptions};

use crate::error::{AppError, AppResult};

/// Environment variable naming the host the panel is served from.
pub const HOST_ENV_VAR: &str = "HAILSWATH_HOST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub deployment: DeploymentConfig,
    pub job: JobConfig,
    pub polling: PollingConfig,
    pub presenter: PresenterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub scheme: String,
    pub recognized_hosts: Vec<String>,
    pub default_host: String,
    pub service_path: String,
    /// Host the panel is running on, if known.
    pub host: Option<String>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            recognized_hosts: vec![
                "gis.example.com".to_string(),
                "gistest.example.com".to_string(),
                "gistest106.example.com".to_string(),
                "gisdev.example.com".to_string(),
            ],
            default_host: "gisdev.example.com".to_string(),
            service_path: "/arcgis/rest/services/GPTools/HailPredictionTool/GPServer/HailPredictionTool"
                .to_string(),
            host: None,
        }
    }
}

impl DeploymentConfig {
    /// `host` if it is on the allow-list, otherwise the default host.
    pub fn resolve_host<'a>(&'a self, host: &'a str) -> &'a str {
        if self.recognized_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            host
        } else {
            &self.default_host
        }
    }

    pub fn endpoint_for(&self, host: &str) -> String {
        format!(
            "{}://{}{}",
            self.scheme,
            self.resolve_host(host),
            self.service_path
        )
    }

    /// Endpoint for the configured host (or the default one).
    pub fn endpoint(&self) -> String {
        self.endpoint_for(self.host.as_deref().unwrap_or(&self.default_host))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub date_parameter: String,
    pub geometry_output: String,
    pub table_output: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            date_parameter: "Date".to_string(),
            geometry_output: "Output_Hail_Layer".to_string(),
            table_output: "Output_JSON".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub timeout_ms: Option<u64>,
    pub retry_budget: u32,
    /// Period of the elapsed-time counter.
    pub tick_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_ms: None,
            retry_budget: 3,
            tick_ms: 1000,
        }
    }
}

impl PollingConfig {
    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.interval_ms),
            timeout: self.timeout_ms.map(Duration::from_millis),
            retry_budget: self.retry_budget,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    pub options: PresentOptions,
    /// Overrides the built-in hail size band.
    pub color_band: Option<Vec<BandEntry>>,
}

impl PresenterConfig {
    pub fn color_band(&self) -> AppResult<ColorBand> {
        match &self.color_band {
            Some(entries) => Ok(ColorBand::from_entries(entries)?),
            None => Ok(ColorBand::hail_size()),
        }
    }
}

impl AppConfig {
    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup (e.g. `std::env::var`).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV_VAR).filter(|h| !h.trim().is_empty()) {
            self.deployment.host = Some(host.trim().to_string());
        }
        self
    }

    pub fn from_process_env(self) -> Self {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> AppResult<()> {
        let d = &self.deployment;
        if d.recognized_hosts.is_empty() {
            return Err(AppError::Config("recognized_hosts is empty".to_string()));
        }
        if !d.recognized_hosts.iter().any(|h| h == &d.default_host) {
            return Err(AppError::Config(format!(
                "default_host '{}' is not a recognized host",
                d.default_host
            )));
        }
        if self.polling.interval_ms == 0 {
            return Err(AppError::Config("polling.interval_ms must be positive".to_string()));
        }
        if self.polling.tick_ms == 0 {
            return Err(AppError::Config("polling.tick_ms must be positive".to_string()));
        }
        for (field, value) in [
            ("job.date_parameter", &self.job.date_parameter),
            ("job.geometry_output", &self.job.geometry_output),
            ("job.table_output", &self.job.table_output),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{field} must not be empty")));
            }
        }
        self.presenter
            .color_band()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn recognized_host_is_kept() {
        let d = DeploymentConfig::default();
        assert_eq!(
            d.endpoint_for("gistest.example.com"),
            "https://gistest.example.com/arcgis/rest/services/GPTools/HailPredictionTool/GPServer/HailPredictionTool"
        );
    }

    #[test]
    fn unknown_host_falls_back_to_default() {
        let d = DeploymentConfig::default();
        assert_eq!(d.resolve_host("localhost"), "gisdev.example.com");
        assert!(d.endpoint_for("evil.example.org").starts_with("https://gisdev.example.com/"));
    }

    #[test]
    fn env_override_sets_host() {
        let config = AppConfig::default().with_env_overrides(|key| {
            (key == HOST_ENV_VAR).then(|| "gis.example.com".to_string())
        });
        assert!(config.deployment.endpoint().starts_with("https://gis.example.com/"));

        let untouched = AppConfig::default().with_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(untouched.deployment.host, None);
    }

    #[test]
    fn yaml_overrides_merge_with_defaults() {
        let yaml = r#"
polling:
  interval_ms: 250
  timeout_ms: 60000
presenter:
  options:
    show_all_columns: true
    header_labels:
      diam_in: Hail Size
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.polling.interval_ms, 250);
        assert_eq!(config.polling.retry_budget, 3);
        assert_eq!(
            config.polling.poll_options().timeout,
            Some(Duration::from_secs(60))
        );
        assert!(config.presenter.options.show_all_columns);
        assert_eq!(config.presenter.options.hidden_column_indexes, vec![2, 6]);
        assert_eq!(config.job.table_output, "Output_JSON");
    }

    #[test]
    fn custom_band_from_yaml() {
        let yaml = r#"
presenter:
  color_band:
    - { key: "1", color: [1, 2, 3] }
    - { key: "2", color: [4, 5, 6] }
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        let band = config.presenter.color_band().unwrap();
        assert_eq!(band.color_for("9"), Some(hs_present::Rgb(4, 5, 6)));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad_default = "deployment:\n  default_host: nowhere.example.com\n";
        assert!(matches!(
            AppConfig::from_yaml_str(bad_default),
            Err(AppError::Config(_))
        ));

        let zero_interval = "polling:\n  interval_ms: 0\n";
        assert!(matches!(
            AppConfig::from_yaml_str(zero_interval),
            Err(AppError::Config(_))
        ));

        let bad_band = "presenter:\n  color_band:\n    - { key: big, color: [0, 0, 0] }\n";
        assert!(matches!(
            AppConfig::from_yaml_str(bad_band),
            Err(AppError::Config(_))
        ));
    }
}
