//! CDI device resolution and OCI edit injection.
//!
//! This crate ties the spec documents from `cdi-schema` to a container's
//! runtime configuration: the `Registry` discovers and indexes spec files,
//! `find_spec` resolves a device name to its owning spec, the `edits` module
//! merges container edits into an `OciConfig`, and the `Injector` runs the
//! whole resolve-then-apply sequence for a list of requested devices.

pub mod config;
pub mod edits;
pub mod inject;
pub mod registry;
pub mod resolver;

pub use config::{CdiConfig, DuplicatePolicy, DEFAULT_SPEC_DIR};
pub use edits::{apply_device_edits, apply_edits, apply_global_edits};
pub use inject::{has_device, update_spec, Injector};
pub use registry::{LoadDiagnostic, Registry, SpecIndex, VendorSpecs, WILDCARD_RUNTIME};
pub use resolver::find_spec;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdiError {
    #[error("could not find device '{0}'")]
    DeviceNotFound(String),
    #[error("device '{device}' not found in spec for vendor '{kind}'")]
    DeviceNotInSpec { device: String, kind: String },
    #[error("config error: {0}")]
    Config(String),
    #[error("config error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
