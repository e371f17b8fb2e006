use crate::CdiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SPEC_DIR: &str = "/etc/cdi";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cdi/cdi.toml";

/// Environment variable overriding the spec directory.
pub const SPEC_DIR_ENV: &str = "CDI_SPEC_DIR";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CDI_CONFIG";

/// What the registry does when two specs claim the same vendor/runtime slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The spec loaded later replaces the earlier one.
    #[default]
    LastWins,
    /// The spec loaded first is kept; later ones are skipped.
    FirstWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CdiConfig {
    #[serde(default = "default_spec_dir")]
    pub spec_dir: PathBuf,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for CdiConfig {
    fn default() -> Self {
        Self {
            spec_dir: default_spec_dir(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

fn default_spec_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SPEC_DIR)
}

impl CdiConfig {
    pub fn with_spec_dir(spec_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec_dir: spec_dir.into(),
            ..Self::default()
        }
    }

    pub fn parse(input: &str) -> Result<Self, CdiError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, CdiError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CdiError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Resolve the effective configuration from the environment.
    ///
    /// The config file named by `CDI_CONFIG` must exist; the default location
    /// is only read when present. `CDI_SPEC_DIR` overrides whatever the file says.
    pub fn from_env() -> Result<Self, CdiError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::load(default)?
                } else {
                    Self::default()
                }
            }
        };
        if let Some(dir) = std::env::var_os(SPEC_DIR_ENV) {
            if !dir.is_empty() {
                config.spec_dir = PathBuf::from(dir);
            }
        }
        tracing::debug!(
            "cdi config: spec_dir={} duplicate_policy={:?}",
            config.spec_dir.display(),
            config.duplicate_policy
        );
        Ok(config)
    }
}
