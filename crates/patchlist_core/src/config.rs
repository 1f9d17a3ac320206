use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATALOG: &str = "src/patches.yaml";
pub const DEFAULT_PATCHES_DIR: &str = "public/patches";
pub const DEFAULT_SCREENSHOTS_DIR: &str = "public/screenshots";
pub const DEFAULT_EXTRAS_DIR: &str = "public/extras";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PatchlistConfig {
    #[serde(default)]
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PathsSection {
    pub catalog: Option<String>,
    pub patches_dir: Option<String>,
    pub screenshots_dir: Option<String>,
    pub extras_dir: Option<String>,
}

impl PatchlistConfig {
    /// Catalog path relative to the project root: config > DEFAULT_CATALOG.
    pub fn catalog(&self) -> &str {
        non_empty(self.paths.catalog.as_deref()).unwrap_or(DEFAULT_CATALOG)
    }

    pub fn patches_dir(&self) -> &str {
        non_empty(self.paths.patches_dir.as_deref()).unwrap_or(DEFAULT_PATCHES_DIR)
    }

    pub fn screenshots_dir(&self) -> &str {
        non_empty(self.paths.screenshots_dir.as_deref()).unwrap_or(DEFAULT_SCREENSHOTS_DIR)
    }

    pub fn extras_dir(&self) -> &str {
        non_empty(self.paths.extras_dir.as_deref()).unwrap_or(DEFAULT_EXTRAS_DIR)
    }

    /// True when the catalog location came from the config file rather than the default.
    pub fn has_catalog_override(&self) -> bool {
        non_empty(self.paths.catalog.as_deref()).is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Load and parse a PatchlistConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<PatchlistConfig> {
    if !config_path.exists() {
        return Ok(PatchlistConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: PatchlistConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_uses_site_layout() {
        let config = PatchlistConfig::default();
        assert_eq!(config.catalog(), "src/patches.yaml");
        assert_eq!(config.patches_dir(), "public/patches");
        assert_eq!(config.screenshots_dir(), "public/screenshots");
        assert_eq!(config.extras_dir(), "public/extras");
        assert!(!config.has_catalog_override());
    }

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/patchlist.toml")).expect("load config");
        assert_eq!(config, PatchlistConfig::default());
    }

    #[test]
    fn load_config_parses_paths_section() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("patchlist.toml");
        fs::write(
            &config_path,
            r#"
[paths]
catalog = "data/hacks.yaml"
patches_dir = "static/patches"
screenshots_dir = "static/shots"
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        assert_eq!(config.catalog(), "data/hacks.yaml");
        assert_eq!(config.patches_dir(), "static/patches");
        assert_eq!(config.screenshots_dir(), "static/shots");
        assert_eq!(config.extras_dir(), "public/extras");
        assert!(config.has_catalog_override());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = PatchlistConfig {
            paths: PathsSection {
                catalog: Some("   ".to_string()),
                ..PathsSection::default()
            },
        };
        assert_eq!(config.catalog(), "src/patches.yaml");
        assert!(!config.has_catalog_override());
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("patchlist.toml");
        fs::write(&config_path, "[paths\ncatalog = \"oops\"").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }
}
