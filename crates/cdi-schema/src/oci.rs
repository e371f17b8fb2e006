//! The slice of an OCI runtime `config.json` that device injection edits.
//!
//! Only `mounts` and `hooks` are modelled; every other field of the document
//! is carried through untouched in a flattened JSON map, so a bundle config
//! can be read, edited and written back without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OciError {
    #[error("failed to read OCI config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse OCI config: {0}")]
    ParseJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OciConfig {
    #[serde(default)]
    pub mounts: Vec<OciMount>,
    #[serde(default, skip_serializing_if = "OciHooks::is_empty")]
    pub hooks: OciHooks,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OciMount {
    pub destination: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OciHook {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OciHooks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prestart: Vec<OciHook>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create_runtime: Vec<OciHook>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create_container: Vec<OciHook>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start_container: Vec<OciHook>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poststart: Vec<OciHook>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poststop: Vec<OciHook>,
}

/// Container lifecycle stage a hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookPoint {
    Prestart,
    CreateRuntime,
    CreateContainer,
    StartContainer,
    Poststart,
    Poststop,
}

impl HookPoint {
    pub const ALL: [HookPoint; 6] = [
        HookPoint::Prestart,
        HookPoint::CreateRuntime,
        HookPoint::CreateContainer,
        HookPoint::StartContainer,
        HookPoint::Poststart,
        HookPoint::Poststop,
    ];

    /// Parse a CDI `hookName`. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "prestart" => Some(Self::Prestart),
            "createRuntime" => Some(Self::CreateRuntime),
            "createContainer" => Some(Self::CreateContainer),
            "startContainer" => Some(Self::StartContainer),
            "poststart" => Some(Self::Poststart),
            "poststop" => Some(Self::Poststop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prestart => "prestart",
            Self::CreateRuntime => "createRuntime",
            Self::CreateContainer => "createContainer",
            Self::StartContainer => "startContainer",
            Self::Poststart => "poststart",
            Self::Poststop => "poststop",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OciHooks {
    pub fn list(&self, point: HookPoint) -> &[OciHook] {
        match point {
            HookPoint::Prestart => &self.prestart,
            HookPoint::CreateRuntime => &self.create_runtime,
            HookPoint::CreateContainer => &self.create_container,
            HookPoint::StartContainer => &self.start_container,
            HookPoint::Poststart => &self.poststart,
            HookPoint::Poststop => &self.poststop,
        }
    }

    pub fn list_mut(&mut self, point: HookPoint) -> &mut Vec<OciHook> {
        match point {
            HookPoint::Prestart => &mut self.prestart,
            HookPoint::CreateRuntime => &mut self.create_runtime,
            HookPoint::CreateContainer => &mut self.create_container,
            HookPoint::StartContainer => &mut self.start_container,
            HookPoint::Poststart => &mut self.poststart,
            HookPoint::Poststop => &mut self.poststop,
        }
    }

    /// Total number of hooks across all six lists.
    pub fn len(&self) -> usize {
        HookPoint::ALL.iter().map(|p| self.list(*p).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OciConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, OciError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String, OciError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, OciError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Write the config as pretty-printed JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), OciError> {
        let content = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.persist(path).map_err(|e| OciError::Io(e.error))?;
        Ok(())
    }
}
