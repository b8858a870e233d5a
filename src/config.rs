use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::pipeline::PipelineSchema;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Env var naming a JSON config file.
pub const CONFIG_ENV: &str = "SPHINX_CONFIG";
/// Config file looked up in the working directory when `SPHINX_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "sphinx.json";
pub const ASYMMETRIES_PATH_ENV: &str = "SPHINX_ASYMMETRIES_PATH";
pub const EXERCISES_PATH_ENV: &str = "SPHINX_EXERCISES_PATH";

/// One named dataset and the file it is read from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub sheet: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub asymmetries: SourceConfig,
    pub exercises: SourceConfig,
    pub cache_ttl_secs: u64,
    pub range_columns: Vec<String>,
    pub description_column: String,
    pub scenario_marker: String,
    pub exercise_scenario_prefix: String,
    pub exercise_filter_columns: Vec<String>,
    pub default_scenario_count: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asymmetries: SourceConfig {
                sheet: "BASE Asimetrias del Cerebro".into(),
                path: None,
            },
            exercises: SourceConfig {
                sheet: "BASE Ejercicios".into(),
                path: None,
            },
            cache_ttl_secs: 600,
            range_columns: vec![
                "% Hemisferio Correspondiente al ojo (Natural)".into(),
                "% de Hemisferio Recesivo (Anitnatural)".into(),
            ],
            description_column: "Descripcion".into(),
            scenario_marker: "Escenario".into(),
            exercise_scenario_prefix: "Escenario:".into(),
            exercise_filter_columns: vec![
                "Filmina".into(),
                "Nivel de Ejercicio".into(),
                "Dificultad".into(),
                "Dificultad de Nivel Ejercicio".into(),
            ],
            default_scenario_count: 5,
        }
    }
}

impl AppConfig {
    /// Resolve the configuration: `SPHINX_CONFIG` file, else `sphinx.json`
    /// if present, else defaults; then apply path overrides from the env.
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                p.exists().then_some(p)
            });

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var_os(name).map(PathBuf::from));
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<PathBuf>) {
        if let Some(p) = lookup(ASYMMETRIES_PATH_ENV) {
            self.asymmetries.path = Some(p);
        }
        if let Some(p) = lookup(EXERCISES_PATH_ENV) {
            self.exercises.path = Some(p);
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn pipeline_schema(&self) -> PipelineSchema {
        PipelineSchema {
            scenario_marker: self.scenario_marker.clone(),
            description_column: self.description_column.clone(),
            range_columns: self.range_columns.clone(),
            secondary_scenario_prefix: self.exercise_scenario_prefix.clone(),
            secondary_filter_columns: self.exercise_filter_columns.clone(),
            default_scenario_count: self.default_scenario_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"exercises": {{"sheet": "Hoja 2", "path": "ej.parquet"}}, "cache_ttl_secs": 60}}"#
        )
        .unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.exercises.sheet, "Hoja 2");
        assert_eq!(config.exercises.path, Some(PathBuf::from("ej.parquet")));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.asymmetries, AppConfig::default().asymmetries);
        assert_eq!(config.default_scenario_count, 5);
    }

    #[test]
    fn env_overrides_replace_paths() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| {
            (name == ASYMMETRIES_PATH_ENV).then(|| PathBuf::from("/data/asim.csv"))
        });
        assert_eq!(config.asymmetries.path, Some(PathBuf::from("/data/asim.csv")));
        assert_eq!(config.exercises.path, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
