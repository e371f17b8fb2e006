use crate::edits::{apply_device_edits, apply_global_edits};
use crate::registry::Registry;
use crate::CdiError;
use cdi_schema::{OciConfig, Spec};
use std::sync::Arc;
use tracing::debug;

/// Resolves requested device names against a freshly loaded registry and
/// injects their edits into an OCI config.
#[derive(Debug, Clone, Default)]
pub struct Injector {
    registry: Registry,
}

impl Injector {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// True iff some wildcard-runtime spec on disk declares `device`.
    pub fn has_device(&self, device: &str) -> bool {
        self.registry.load().has_device(device)
    }

    /// Apply the edits for `devices`, in order, then the global edits of
    /// every distinct spec they resolved to, once each, in the order those
    /// specs were first resolved.
    ///
    /// This is not atomic. If a device cannot be resolved the call stops with
    /// [`CdiError::DeviceNotFound`], and edits already appended for earlier
    /// devices stay in `config`.
    pub fn update_spec<S: AsRef<str>>(
        &self,
        config: &mut OciConfig,
        devices: &[S],
    ) -> Result<(), CdiError> {
        let index = self.registry.load();
        let mut resolved: Vec<Arc<Spec>> = Vec::new();

        for device in devices {
            let device = device.as_ref();
            let spec = index
                .find_device(device)
                .ok_or_else(|| CdiError::DeviceNotFound(device.to_owned()))?;

            if !resolved.iter().any(|s| Arc::ptr_eq(s, spec)) {
                resolved.push(Arc::clone(spec));
            }
            apply_device_edits(config, spec, device)?;
        }

        for spec in &resolved {
            apply_global_edits(config, spec)?;
        }

        debug!(
            "cdi: injected {} device(s) from {} spec(s)",
            devices.len(),
            resolved.len()
        );
        Ok(())
    }
}

/// [`Injector::has_device`] against the configuration from the environment.
///
/// A configuration error counts as "no device".
pub fn has_device(device: &str) -> bool {
    match Registry::from_env() {
        Ok(registry) => Injector::new(registry).has_device(device),
        Err(e) => {
            tracing::warn!("cdi: {e}");
            false
        }
    }
}

/// [`Injector::update_spec`] against the configuration from the environment.
pub fn update_spec<S: AsRef<str>>(config: &mut OciConfig, devices: &[S]) -> Result<(), CdiError> {
    Injector::new(Registry::from_env()?).update_spec(config, devices)
}
