pub mod completions;
pub mod has;
pub mod inject;
pub mod list;

use cdi_core::{CdiConfig, Registry, WILDCARD_RUNTIME};
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Build the registry from the environment, with `--spec-dir` taking precedence.
pub fn make_registry(spec_dir: Option<&Path>) -> Result<Registry, String> {
    let mut config = CdiConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(dir) = spec_dir {
        config.spec_dir = dir.to_path_buf();
    }
    Ok(Registry::new(config))
}

pub fn colorize_runtime(runtime: &str) -> String {
    use console::Style;
    if runtime == WILDCARD_RUNTIME {
        Style::new().green().apply_to(runtime).to_string()
    } else {
        Style::new().yellow().apply_to(runtime).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn colorize_runtime_keeps_text() {
        assert!(colorize_runtime("all").contains("all"));
        assert!(colorize_runtime("runc").contains("runc"));
    }

    #[test]
    fn spec_dir_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let registry = make_registry(Some(dir.path())).unwrap();
        assert_eq!(registry.root(), dir.path());
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_CONFIG_ERROR);
    }
}
