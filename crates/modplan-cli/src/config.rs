use anyhow::{Context, Result};
use modplan_core::ResolveConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project file name, looked up in the descriptor root.
pub const PROJECT_CONFIG_FILE: &str = "modplan.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `pretty`, `text` or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

pub fn load_project_config(root: &Path) -> Result<ProjectConfig> {
    let path = root.join(PROJECT_CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("modplan/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg, ProjectConfig::default());
        assert!(cfg.resolve.report_pch_conflicts);
        assert!(cfg.output.format.is_none());
    }

    #[test]
    fn project_config_reads_both_tables() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[resolve]\nstrict_dynamic_modules = true\n\n[output]\nformat = \"json\"\n",
        )
        .expect("write config");

        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert!(cfg.resolve.strict_dynamic_modules);
        assert!(!cfg.resolve.warnings_as_errors);
        assert_eq!(cfg.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn malformed_project_config_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "[resolve\n").expect("write");

        let err = load_project_config(dir.path()).expect_err("parse must fail");
        assert!(err.to_string().contains(PROJECT_CONFIG_FILE));
    }
}
