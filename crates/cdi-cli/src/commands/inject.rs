use super::{json_pretty, EXIT_SUCCESS};
use cdi_core::Injector;
use cdi_schema::OciConfig;
use std::path::Path;

/// Inject `devices` into the OCI config at `config_path`.
///
/// The file is only written once every device resolved, so a failed run
/// leaves it untouched.
pub fn run(
    injector: &Injector,
    config_path: &Path,
    devices: &[String],
    output: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    tracing::debug!("loading OCI config {}", config_path.display());
    let mut config = OciConfig::load(config_path)
        .map_err(|e| format!("{}: {e}", config_path.display()))?;
    let mounts_before = config.mounts.len();
    let hooks_before = config.hooks.len();

    injector
        .update_spec(&mut config, devices)
        .map_err(|e| e.to_string())?;

    let target = output.unwrap_or(config_path);
    config
        .save(target)
        .map_err(|e| format!("{}: {e}", target.display()))?;

    let added_mounts = config.mounts.len() - mounts_before;
    let added_hooks = config.hooks.len() - hooks_before;
    if json {
        let payload = serde_json::json!({
            "config": target,
            "devices": devices,
            "mounts_added": added_mounts,
            "hooks_added": added_hooks,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "injected {} device(s) into {}: {added_mounts} mount(s), {added_hooks} hook(s)",
            devices.len(),
            target.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
