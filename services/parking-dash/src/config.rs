// services/parking-dash/src/config.rs

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use parkkit::config::DashboardConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/parking-dash.yaml";
pub const ENV_PREFIX: &str = "PARKING_DASH";

/// Built-in defaults, then the YAML file at `path` if it exists, then
/// `PARKING_DASH__SECTION__KEY` environment variables.
pub fn load_config(path: &str) -> Result<DashboardConfig> {
    let config = Config::builder()
        .add_source(File::from(Path::new(path)).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("/nonexistent/parking-dash.yaml").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.polling.spots_interval_ms, 2000);
        assert_eq!(config.cameras.names, vec!["cam1", "cam2", "cam3"]);
        assert!(config.polling.backoff.is_none());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "api:\n  base_url: http://parking.local:9000\npolling:\n  spots_interval_ms: 500\n  backoff:\n    multiplier: 1.5\n    max_delay_ms: 8000\ncameras:\n  names: [north, south]\n  initial: south"
        )
        .unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.base_url, "http://parking.local:9000");
        assert_eq!(config.api.request_timeout_ms, 5000);
        assert_eq!(config.polling.spots_interval_ms, 500);
        assert_eq!(config.polling.analytics_interval_ms, 30000);
        assert_eq!(config.cameras.names, vec!["north", "south"]);
        assert_eq!(config.cameras.initial.as_deref(), Some("south"));

        let policy = config.polling.backoff_policy().unwrap();
        assert_eq!(policy.multiplier, 1.5);
    }

    #[test]
    fn test_env_overrides_file() {
        std::env::set_var("PARKING_DASH__POLLING__METRICS_INTERVAL_MS", "45000");
        let config = load_config("/nonexistent/parking-dash.yaml").unwrap();
        std::env::remove_var("PARKING_DASH__POLLING__METRICS_INTERVAL_MS");

        assert_eq!(config.polling.metrics_interval_ms, 45000);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "polling: [not, a, map").unwrap();
        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }
}
