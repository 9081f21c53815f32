//! Gradebook configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sqlite::SqliteGateway;

/// Environment variable that overrides the configured database path.
pub const DATABASE_ENV: &str = "GRADEBOOK_DATABASE";

/// Top-level gradebook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradebookConfig {
    /// SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Directory for generated HTML reports.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("./gradebook.db")
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("./gradebook-reports")
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            report_dir: default_report_dir(),
        }
    }
}

impl GradebookConfig {
    /// Gateway for the configured database.
    pub fn gateway(&self) -> SqliteGateway {
        SqliteGateway::open(&self.database)
    }
}

/// Expand `${NAME}` references from the environment. Unset variables
/// expand to nothing; an unterminated `${` is kept as written.
fn resolve_env_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.split_once('}') {
            Some((name, tail)) => {
                out.push_str(&std::env::var(name).unwrap_or_default());
                rest = tail;
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from `explicit`, which must exist, or else from
/// `./gradebook.toml`, then `~/.config/gradebook/config.toml`, falling back
/// to defaults.
///
/// `GRADEBOOK_DATABASE` overrides the database path.
pub fn load_config_from(explicit: Option<&Path>) -> Result<GradebookConfig> {
    let source = match explicit {
        Some(path) if !path.exists() => {
            anyhow::bail!("config file not found: {}", path.display())
        }
        Some(path) => Some(path.to_path_buf()),
        None => {
            let mut candidates = vec![PathBuf::from("gradebook.toml")];
            candidates.extend(dirs_path().map(|dir| dir.join("config.toml")));
            candidates.into_iter().find(|candidate| candidate.exists())
        }
    };

    let mut config = match source {
        Some(path) => read_config(&path)?,
        None => GradebookConfig::default(),
    };

    if let Some(database) = std::env::var_os(DATABASE_ENV).filter(|v| !v.is_empty()) {
        config.database = PathBuf::from(database);
    }
    config.database = resolve_path(&config.database);
    config.report_dir = resolve_path(&config.report_dir);

    Ok(config)
}

fn read_config(path: &Path) -> Result<GradebookConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradebook"))
}
