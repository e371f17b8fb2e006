//! Spec discovery and the `vendor → runtime → spec` index.
//!
//! The index is rebuilt from disk on every [`Registry::load`]; nothing is
//! cached between calls. Problems with individual files never fail a load:
//! they are logged and recorded as [`LoadDiagnostic`]s on the returned index.

use crate::config::{CdiConfig, DuplicatePolicy};
use crate::CdiError;
use cdi_schema::{has_spec_extension, parse_spec_file, RuntimeName, Spec, VendorKind};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runtime key for specs that declare no runtime restriction.
pub const WILDCARD_RUNTIME: &str = "all";

/// Specs of one vendor, keyed by runtime name.
pub type VendorSpecs = BTreeMap<RuntimeName, Arc<Spec>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDiagnostic {
    /// The spec directory itself could not be listed.
    RootUnreadable { path: PathBuf, reason: String },
    EntryUnreadable { path: PathBuf, reason: String },
    NotRegularFile { path: PathBuf },
    WrongExtension { path: PathBuf },
    ParseFailed { path: PathBuf, reason: String },
    /// Two specs claimed the same vendor/runtime slot. `path` is the later one.
    Duplicate {
        kind: VendorKind,
        runtime: RuntimeName,
        path: PathBuf,
        policy: DuplicatePolicy,
    },
}

impl LoadDiagnostic {
    pub fn path(&self) -> &Path {
        match self {
            Self::RootUnreadable { path, .. }
            | Self::EntryUnreadable { path, .. }
            | Self::NotRegularFile { path }
            | Self::WrongExtension { path }
            | Self::ParseFailed { path, .. }
            | Self::Duplicate { path, .. } => path,
        }
    }

    /// Whether this diagnostic is worth a warning rather than a debug line.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::EntryUnreadable { .. } | Self::ParseFailed { .. } | Self::Duplicate { .. }
        )
    }
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootUnreadable { path, reason } => {
                write!(f, "cannot read spec directory {}: {reason}", path.display())
            }
            Self::EntryUnreadable { path, reason } => {
                write!(f, "skipped unreadable path {}: {reason}", path.display())
            }
            Self::NotRegularFile { path } => {
                write!(f, "skipped non-regular file {}", path.display())
            }
            Self::WrongExtension { path } => {
                write!(f, "skipped non-json file {}", path.display())
            }
            Self::ParseFailed { path, reason } => {
                write!(f, "failed to parse {}: {reason}, skipping it", path.display())
            }
            Self::Duplicate {
                kind,
                runtime,
                path,
                policy,
            } => {
                let outcome = match policy {
                    DuplicatePolicy::LastWins => "replacing earlier spec",
                    DuplicatePolicy::FirstWins => "keeping earlier spec",
                };
                write!(
                    f,
                    "duplicate spec for vendor '{kind}' and runtime '{runtime}' at {}, {outcome}",
                    path.display()
                )
            }
        }
    }
}

/// Result of one registry load.
#[derive(Debug, Default)]
pub struct SpecIndex {
    specs: BTreeMap<VendorKind, VendorSpecs>,
    diagnostics: Vec<LoadDiagnostic>,
}

impl SpecIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec` under each runtime it declares, or under
    /// [`WILDCARD_RUNTIME`] if it declares none.
    pub fn insert(&mut self, spec: Arc<Spec>, origin: &Path, policy: DuplicatePolicy) {
        // A runtime listed twice in the same document is one slot.
        let runtimes: BTreeSet<RuntimeName> = if spec.container_runtime.is_empty() {
            BTreeSet::from([RuntimeName::from(WILDCARD_RUNTIME)])
        } else {
            spec.container_runtime.iter().cloned().collect()
        };

        let mut duplicates = Vec::new();
        let bucket = self.specs.entry(spec.kind.clone()).or_default();
        for runtime in runtimes {
            if bucket.contains_key(&runtime) {
                duplicates.push(runtime.clone());
                if policy == DuplicatePolicy::FirstWins {
                    continue;
                }
            }
            bucket.insert(runtime, Arc::clone(&spec));
        }

        for runtime in duplicates {
            self.note(LoadDiagnostic::Duplicate {
                kind: spec.kind.clone(),
                runtime,
                path: origin.to_path_buf(),
                policy,
            });
        }
    }

    pub fn get(&self, kind: &str, runtime: &str) -> Option<&Arc<Spec>> {
        self.specs.get(kind).and_then(|bucket| bucket.get(runtime))
    }

    pub fn vendor(&self, kind: &str) -> Option<&VendorSpecs> {
        self.specs.get(kind)
    }

    /// Vendor buckets in lexicographic vendor order.
    pub fn vendors(&self) -> impl Iterator<Item = (&VendorKind, &VendorSpecs)> {
        self.specs.iter()
    }

    /// Number of occupied vendor/runtime slots.
    pub fn slot_count(&self) -> usize {
        self.specs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }

    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    fn note(&mut self, diagnostic: LoadDiagnostic) {
        if diagnostic.is_warning() {
            warn!("cdi: {diagnostic}");
        } else {
            debug!("cdi: {diagnostic}");
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Loads CDI specs from a spec directory.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: CdiConfig,
}

impl Registry {
    pub fn new(config: CdiConfig) -> Self {
        Self { config }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(CdiConfig::with_spec_dir(root))
    }

    pub fn from_env() -> Result<Self, CdiError> {
        Ok(Self::new(CdiConfig::from_env()?))
    }

    pub fn root(&self) -> &Path {
        &self.config.spec_dir
    }

    pub fn config(&self) -> &CdiConfig {
        &self.config
    }

    /// Walk the spec directory and build a fresh index.
    ///
    /// Files are visited in lexicographic path order, so which spec wins a
    /// duplicate slot is reproducible. A missing directory gives an empty index.
    pub fn load(&self) -> SpecIndex {
        let mut index = SpecIndex::new();
        let root = self.root();

        let mut files = Vec::new();
        if let Err(e) = collect_spec_files(root, &mut index, &mut files) {
            index.note(LoadDiagnostic::RootUnreadable {
                path: root.to_path_buf(),
                reason: e.to_string(),
            });
            return index;
        }

        for path in files {
            debug!("cdi: reading {}", path.display());
            match parse_spec_file(&path) {
                Ok(spec) => index.insert(Arc::new(spec), &path, self.config.duplicate_policy),
                Err(e) => index.note(LoadDiagnostic::ParseFailed {
                    path,
                    reason: e.to_string(),
                }),
            }
        }

        debug!(
            "cdi: loaded {} vendor(s), {} slot(s) from {}",
            index.specs.len(),
            index.slot_count(),
            root.display()
        );
        index
    }
}

/// Collect candidate spec files below `dir`, recording everything skipped.
/// Only an error listing `dir` itself is returned.
fn collect_spec_files(
    dir: &Path,
    index: &mut SpecIndex,
    files: &mut Vec<PathBuf>,
) -> Result<(), std::io::Error> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => index.note(LoadDiagnostic::EntryUnreadable {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
    paths.sort();

    for path in paths {
        // Follows symlinks, so a link to a spec file is still loaded.
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                index.note(LoadDiagnostic::EntryUnreadable {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if meta.is_dir() {
            // Never descend through symlinked directories.
            let real_dir = path.symlink_metadata().is_ok_and(|m| m.is_dir());
            if !real_dir {
                index.note(LoadDiagnostic::NotRegularFile { path });
            } else if let Err(e) = collect_spec_files(&path, index, files) {
                index.note(LoadDiagnostic::EntryUnreadable {
                    path,
                    reason: e.to_string(),
                });
            }
        } else if !meta.is_file() {
            index.note(LoadDiagnostic::NotRegularFile { path });
        } else if !has_spec_extension(&path) {
            index.note(LoadDiagnostic::WrongExtension { path });
        } else {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_spec(dir: &Path, file: &str, doc: &serde_json::Value) {
        fs::write(dir.join(file), serde_json::to_vec_pretty(doc).unwrap()).unwrap();
    }

    #[test]
    fn registers_under_each_declared_runtime() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(
            dir.path(),
            "gpu.json",
            &json!({"kind": "v.com/gpu", "containerRuntime": ["runc", "crun", "youki"]}),
        );
        let index = Registry::with_root(dir.path()).load();
        assert_eq!(index.slot_count(), 3);
        assert!(index.get("v.com/gpu", WILDCARD_RUNTIME).is_none());

        let runc = index.get("v.com/gpu", "runc").unwrap();
        let crun = index.get("v.com/gpu", "crun").unwrap();
        assert!(Arc::ptr_eq(runc, crun));
    }

    #[test]
    fn registers_once_under_wildcard_without_runtimes() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "nic.json", &json!({"kind": "v.com/nic"}));
        let index = Registry::with_root(dir.path()).load();
        assert_eq!(index.slot_count(), 1);
        assert!(index.get("v.com/nic", "all").is_some());
    }

    #[test]
    fn repeated_runtime_in_one_spec_is_not_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(
            dir.path(),
            "a.json",
            &json!({"kind": "v.com/x", "containerRuntime": ["runc", "runc"]}),
        );
        let index = Registry::with_root(dir.path()).load();
        assert_eq!(index.slot_count(), 1);
        assert!(index.diagnostics().is_empty());
    }

    #[test]
    fn repeated_runtime_colliding_under_first_wins_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(
            dir.path(),
            "a.json",
            &json!({"kind": "V", "containerRuntime": ["R"], "devices": [{"name": "first"}]}),
        );
        write_spec(
            dir.path(),
            "b.json",
            &json!({"kind": "V", "containerRuntime": ["R", "R"], "devices": [{"name": "second"}]}),
        );

        let config = CdiConfig {
            spec_dir: dir.path().to_path_buf(),
            duplicate_policy: DuplicatePolicy::FirstWins,
        };
        let index = Registry::new(config).load();
        assert!(index.get("V", "R").unwrap().has_device("first"));
        assert_eq!(index.diagnostics().len(), 1);
    }

    #[test]
    fn null_runtime_list_registers_under_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("go.json"),
            r#"{"cdiVersion": "0.2.0", "kind": "v.com/x", "containerRuntime": null,
                "devices": [{"name": "d0", "containerEdits": {"deviceNodes": null}}]}"#,
        )
        .unwrap();
        let index = Registry::with_root(dir.path()).load();
        assert!(index.diagnostics().is_empty());
        assert!(index.get("v.com/x", WILDCARD_RUNTIME).unwrap().has_device("d0"));
    }

    #[test]
    fn duplicate_slot_last_wins_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(
            dir.path(),
            "a.json",
            &json!({"kind": "V", "containerRuntime": ["R"], "devices": [{"name": "first"}]}),
        );
        write_spec(
            dir.path(),
            "b.json",
            &json!({"kind": "V", "containerRuntime": ["R"], "devices": [{"name": "second"}]}),
        );

        let index = Registry::with_root(dir.path()).load();
        assert_eq!(index.vendor("V").unwrap().len(), 1);
        assert!(index.get("V", "R").unwrap().has_device("second"));

        let dups: Vec<_> = index
            .diagnostics()
            .iter()
            .filter(|d| matches!(d, LoadDiagnostic::Duplicate { .. }))
            .collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].path(), dir.path().join("b.json"));
    }

    #[test]
    fn duplicate_slot_first_wins_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(
            dir.path(),
            "a.json",
            &json!({"kind": "V", "devices": [{"name": "first"}]}),
        );
        write_spec(
            dir.path(),
            "b.json",
            &json!({"kind": "V", "devices": [{"name": "second"}]}),
        );

        let config = CdiConfig {
            spec_dir: dir.path().to_path_buf(),
            duplicate_policy: DuplicatePolicy::FirstWins,
        };
        let index = Registry::new(config).load();
        assert!(index.get("V", "all").unwrap().has_device("first"));
        assert_eq!(index.diagnostics().len(), 1);
        assert!(index.diagnostics()[0].to_string().contains("keeping earlier spec"));
    }

    #[test]
    fn missing_root_yields_empty_index_and_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let index = Registry::with_root(dir.path().join("absent")).load();
        assert!(index.is_empty());
        assert!(matches!(
            index.diagnostics(),
            [LoadDiagnostic::RootUnreadable { .. }]
        ));
    }

    #[test]
    fn skips_bad_files_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(dir.path().join("README.md"), "# specs").unwrap();
        write_spec(dir.path(), "ok.json", &json!({"kind": "v.com/ok"}));

        let index = Registry::with_root(dir.path()).load();
        assert_eq!(index.slot_count(), 1);

        let diags = index.diagnostics();
        assert!(diags
            .iter()
            .any(|d| matches!(d, LoadDiagnostic::ParseFailed { .. })));
        assert!(diags
            .iter()
            .any(|d| matches!(d, LoadDiagnostic::WrongExtension { .. })));
    }

    #[test]
    fn walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("vendor").join("gpu");
        fs::create_dir_all(&nested).unwrap();
        write_spec(&nested, "gpu.json", &json!({"kind": "v.com/gpu"}));

        let index = Registry::with_root(dir.path()).load();
        assert!(index.get("v.com/gpu", "all").is_some());
    }

    #[test]
    fn empty_runtime_and_wildcard_share_a_slot() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "a.json", &json!({"kind": "V"}));
        write_spec(
            dir.path(),
            "b.json",
            &json!({"kind": "V", "containerRuntime": ["all"]}),
        );
        let index = Registry::with_root(dir.path()).load();
        assert_eq!(index.slot_count(), 1);
        assert_eq!(index.diagnostics().len(), 1);
    }

    #[test]
    fn each_load_produces_distinct_spec_instances() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "a.json", &json!({"kind": "V"}));
        let registry = Registry::with_root(dir.path());
        let first = registry.load();
        let second = registry.load();
        let a = first.get("V", "all").unwrap();
        let b = second.get("V", "all").unwrap();
        assert!(!Arc::ptr_eq(a, b));
        assert_eq!(a, b);
    }
}
