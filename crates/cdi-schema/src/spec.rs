use crate::oci::HookPoint;
use crate::types::{RuntimeName, VendorKind};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Extension a file must carry to be treated as a spec document.
pub const SPEC_FILE_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read spec file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse spec: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// Decode an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One vendor's device catalog, as decoded from a CDI document.
///
/// Unknown fields are ignored so that documents written for newer schema
/// revisions still load.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cdi_version: String,
    pub kind: VendorKind,
    /// Runtimes this spec is restricted to. Empty means "any runtime".
    #[serde(default, alias = "containerRuntimes", deserialize_with = "null_as_default")]
    pub container_runtime: Vec<RuntimeName>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: Vec<Device>,
    /// Global edits, applied once per container for this spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_edits: Option<ContainerEdits>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_edits: Option<ContainerEdits>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEdits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub device_nodes: Vec<DeviceNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mounts: Vec<Mount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hooks: Vec<Hook>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNode {
    pub host_path: String,
    pub container_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
    pub host_path: String,
    pub container_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    pub hook_name: String,
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    /// Timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i32>,
}

impl Spec {
    /// First device with the given name, if any.
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn has_device(&self, name: &str) -> bool {
        self.device(name).is_some()
    }
}

impl Hook {
    /// Lifecycle point this hook targets; `None` for names this crate does not know.
    pub fn point(&self) -> Option<HookPoint> {
        HookPoint::from_name(&self.hook_name)
    }
}

impl ContainerEdits {
    pub fn is_empty(&self) -> bool {
        self.device_nodes.is_empty() && self.mounts.is_empty() && self.hooks.is_empty()
    }
}

pub fn parse_spec_str(input: &str) -> Result<Spec, SpecError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_spec_file(path: impl AsRef<Path>) -> Result<Spec, SpecError> {
    let content = fs::read_to_string(path)?;
    parse_spec_str(&content)
}

/// True if `path` carries the spec document extension.
pub fn has_spec_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SPEC_FILE_EXTENSION)
}
