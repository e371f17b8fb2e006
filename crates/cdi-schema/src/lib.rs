//! CDI spec documents and the OCI runtime configuration they edit.
//!
//! This crate defines the data layer: the decoded CDI document model (`Spec`,
//! `Device`, `ContainerEdits` and their parts), the spec file decoder
//! (`parse_spec_file`), and the target OCI `config.json` shape (`OciConfig`)
//! with its six lifecycle hook lists (`HookPoint`).

pub mod oci;
pub mod spec;
pub mod types;

pub use oci::{HookPoint, OciConfig, OciError, OciHook, OciHooks, OciMount};
pub use spec::{
    has_spec_extension, parse_spec_file, parse_spec_str, ContainerEdits, Device, DeviceNode, Hook,
    Mount, Spec, SpecError, SPEC_FILE_EXTENSION,
};
pub use types::{RuntimeName, VendorKind};
