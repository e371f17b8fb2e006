//! Merging CDI container edits into an OCI runtime configuration.
//!
//! All mutation is append-only: existing mounts and hooks are never removed,
//! reordered or deduplicated, and nothing appended is rolled back if a later
//! step fails. Applying the same edits twice to one config doubles them.

use crate::CdiError;
use cdi_schema::{ContainerEdits, DeviceNode, Hook, Mount, OciConfig, OciHook, OciMount, Spec};
use tracing::{debug, warn};

/// Apply the edits of `device` from `spec`.
///
/// Fails with [`CdiError::DeviceNotInSpec`] if `spec` has no such device.
pub fn apply_device_edits(
    config: &mut OciConfig,
    spec: &Spec,
    device: &str,
) -> Result<(), CdiError> {
    let dev = spec
        .device(device)
        .ok_or_else(|| CdiError::DeviceNotInSpec {
            device: device.to_owned(),
            kind: spec.kind.to_string(),
        })?;
    debug!("cdi: applying edits for device '{device}' of '{}'", spec.kind);
    apply_edits(config, dev.container_edits.as_ref())
}

/// Apply the spec-level edits of `spec`.
pub fn apply_global_edits(config: &mut OciConfig, spec: &Spec) -> Result<(), CdiError> {
    debug!("cdi: applying global edits of '{}'", spec.kind);
    apply_edits(config, spec.container_edits.as_ref())
}

/// Append device nodes, then mounts, then hooks from `edits` onto `config`.
///
/// `None` is a no-op. Hooks with an unknown `hookName` are dropped with a
/// warning.
#[allow(clippy::unnecessary_wraps)]
pub fn apply_edits(config: &mut OciConfig, edits: Option<&ContainerEdits>) -> Result<(), CdiError> {
    let Some(edits) = edits else {
        return Ok(());
    };

    config
        .mounts
        .extend(edits.device_nodes.iter().map(device_node_to_mount));
    config.mounts.extend(edits.mounts.iter().map(mount_to_mount));

    for hook in &edits.hooks {
        match hook.point() {
            Some(point) => config.hooks.list_mut(point).push(hook_to_hook(hook)),
            None => warn!("cdi: unknown hook '{}' for {}, dropping it", hook.hook_name, hook.path),
        }
    }

    Ok(())
}

fn device_node_to_mount(node: &DeviceNode) -> OciMount {
    let options = if node.permissions.is_empty() {
        Vec::new()
    } else {
        vec![node.permissions.clone()]
    };
    OciMount {
        destination: node.container_path.clone(),
        source: node.host_path.clone(),
        options,
        ..OciMount::default()
    }
}

fn mount_to_mount(mount: &Mount) -> OciMount {
    OciMount {
        destination: mount.container_path.clone(),
        source: mount.host_path.clone(),
        options: mount.options.clone(),
        ..OciMount::default()
    }
}

fn hook_to_hook(hook: &Hook) -> OciHook {
    OciHook {
        path: hook.path.clone(),
        args: hook.args.clone(),
        env: hook.env.clone(),
        timeout: hook.timeout,
    }
}
