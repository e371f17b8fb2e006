use crate::registry::{SpecIndex, WILDCARD_RUNTIME};
use cdi_schema::Spec;
use std::sync::Arc;

/// Find the spec that declares `device` under the wildcard runtime.
///
/// Only each vendor's `"all"` slot is searched; specs registered solely under
/// a named runtime are not reachable here. Vendors are searched in
/// lexicographic order, so a device name defined by two vendors resolves to
/// the lexicographically smaller vendor.
pub fn find_spec<'a>(index: &'a SpecIndex, device: &str) -> Option<&'a Arc<Spec>> {
    index
        .vendors()
        .filter_map(|(_, runtimes)| runtimes.get(WILDCARD_RUNTIME))
        .find(|spec| spec.has_device(device))
}

impl SpecIndex {
    pub fn find_device(&self, device: &str) -> Option<&Arc<Spec>> {
        find_spec(self, device)
    }

    pub fn has_device(&self, device: &str) -> bool {
        self.find_device(device).is_some()
    }
}
