use anyhow::{anyhow, Result};
use config::Config;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Key under the `[custom]` section holding the default schema prefix
pub const PREFIX_KEY: &str = "database.prefix";

#[derive(Debug, Clone)]
pub struct SchemactlConfig {
    /// Path to the directory to hold schemactl's data
    pub data_dir: String,

    /// Directory holding one SQLite file per schema
    pub schema_dir: String,

    /// Free-form `[custom]` settings, e.g. `"database.prefix"`
    pub custom: BTreeMap<String, String>,
}

const EMPTY_CONFIG: &str = r#"### schemactl configuration file

### directory for data used by schemactl
# data_dir = "~/.schemactl"

### directory holding the schema files (defaults to <data_dir>/schemas)
# schema_dir = "~/.schemactl/schemas"

### custom settings
# [custom]
# "database.prefix" = "dev_"
"#;

/// Shape of the merged configuration sources before defaults are applied
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    data_dir: Option<String>,
    schema_dir: Option<String>,
    #[serde(default)]
    custom: BTreeMap<String, String>,
}

impl Default for SchemactlConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let data_dir = format!("{}/.schemactl", home_dir);

        Self {
            schema_dir: format!("{}/schemas", data_dir),
            data_dir,
            custom: BTreeMap::new(),
        }
    }
}

impl SchemactlConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<SchemactlConfig> {
        let mut builder = Config::builder();

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let p = Self::config_file_path();
                let schemactl_dir = Path::new(&p)
                    .parent()
                    .ok_or_else(|| anyhow!("Could not determine configuration directory"))?;
                std::fs::create_dir_all(schemactl_dir)
                    .map_err(|e| anyhow!("Unable to create schemactl directory: {}", e))?;
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of SCHEMACTL)
        // E.g., `SCHEMACTL_SCHEMA_DIR=/tmp/schemas ./schemactl` would set the schema directory
        builder = builder.add_source(config::Environment::with_prefix("SCHEMACTL"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let raw = settings
            .try_deserialize::<RawConfig>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> SchemactlConfig {
        let defaults = SchemactlConfig::default();

        let data_dir = raw
            .data_dir
            .map(|d| d.trim_end_matches('/').to_string())
            .unwrap_or(defaults.data_dir);

        let schema_dir = raw
            .schema_dir
            .map(|d| d.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{}/schemas", data_dir));

        SchemactlConfig {
            data_dir,
            schema_dir,
            custom: raw.custom,
        }
    }

    /// Set the `[custom]` prefix entry, mostly useful for library callers
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom.insert(PREFIX_KEY.to_string(), prefix.into());
        self
    }

    /// Configured default prefix, if present and non-empty
    pub fn database_prefix(&self) -> Option<&str> {
        self.custom
            .get(PREFIX_KEY)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Config File:        {}", Self::config_file_path()),
            format!("Data Directory:     {}", self.data_dir),
            format!("Schema Directory:   {}", self.schema_dir),
            format!(
                "Default Prefix:     {}",
                self.database_prefix().unwrap_or("(not set)")
            ),
        ];

        for (key, value) in self.custom.iter().filter(|(k, _)| *k != PREFIX_KEY) {
            lines.push(format!("custom.{:13} {}", format!("{}:", key), value));
        }

        lines.join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.schemactl/schemactl.toml", home_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemactlConfig::default();
        assert!(config.data_dir.ends_with("/.schemactl"));
        assert_eq!(config.schema_dir, format!("{}/schemas", config.data_dir));
        assert_eq!(config.database_prefix(), None);
    }

    #[test]
    fn test_schema_dir_follows_data_dir() {
        let config = SchemactlConfig::from_raw(RawConfig {
            data_dir: Some("/test/dir/".to_string()),
            ..Default::default()
        });

        assert_eq!(config.data_dir, "/test/dir");
        assert_eq!(config.schema_dir, "/test/dir/schemas");
    }

    #[test]
    fn test_load_custom_prefix_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemactl.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/schemactl"
schema_dir = "/srv/schemas"

[custom]
"database.prefix" = "lab_"
"#,
        )
        .unwrap();

        let config = SchemactlConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.data_dir, "/srv/schemactl");
        assert_eq!(config.schema_dir, "/srv/schemas");
        assert_eq!(config.database_prefix(), Some("lab_"));
    }

    #[test]
    fn test_missing_file_is_created_from_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        let config = SchemactlConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert!(path.exists());
        assert_eq!(config.database_prefix(), None);

        // The template is all comments, so loading it again yields the same result
        let again = SchemactlConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(again.database_prefix(), None);
    }

    #[test]
    fn test_empty_prefix_is_unset() {
        let config = SchemactlConfig::default().with_prefix("");
        assert_eq!(config.database_prefix(), None);

        let config = SchemactlConfig::default().with_prefix("dev_");
        assert_eq!(config.database_prefix(), Some("dev_"));
    }

    #[test]
    fn test_config_is_clone_and_debug() {
        let config = SchemactlConfig::default().with_prefix("dev_");
        let copy = config.clone();
        assert_eq!(copy.schema_dir, config.schema_dir);
        assert_eq!(copy.database_prefix(), Some("dev_"));

        let debug = format!("{:?}", copy);
        assert!(debug.starts_with("SchemactlConfig"));
        assert!(debug.contains("dev_"));
    }

    #[test]
    fn test_summary_mentions_prefix() {
        let config = SchemactlConfig::default().with_prefix("dev_");
        let summary = config.summary();
        assert!(summary.contains("Default Prefix:     dev_"));
        assert!(summary.contains("Schema Directory:"));
    }
}
