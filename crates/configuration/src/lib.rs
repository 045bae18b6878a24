use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    BenchmarkSettings, Config, CriterionSettings, DecompositionSettings, ForecastSettings,
    HttpProviderSettings, LoggingSettings, OrchestratorSettings, PeerGroupSettings,
    PreprocessingSettings, ProviderSettings, ScenarioSettings, ServerSettings,
};

/// The default configuration file, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads the application configuration.
///
/// Reads `path` (or `config.toml` when `None`), then applies environment overrides such as
/// `MERIDIAN__FORECAST__HORIZON=12`, deserializes everything into the strongly-typed
/// `Config` struct and validates it. An explicitly given file must exist; the default
/// file is optional so that environment-only deployments work.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_an_explicit_file_over_defaults() {
        let path = std::env::temp_dir().join(format!("meridian-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[forecast]\nhorizon = 9\n\n[orchestrator]\nretry_backoff = \"250ms\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.forecast.horizon, 9);
        assert_eq!(config.orchestrator.retry_backoff, std::time::Duration::from_millis(250));
        assert_eq!(config.preprocessing.smoothing_window, Config::default().preprocessing.smoothing_window);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("meridian-config-does-not-exist.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
