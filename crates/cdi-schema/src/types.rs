//! Newtype wrappers for the string keys of the spec index.
//!
//! Both newtypes serialize/deserialize as plain strings, so they can sit
//! directly in decoded CDI documents.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        // Lets `BTreeMap<$name, _>` be queried with a plain `&str`.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Vendor/kind identifier of a CDI spec, e.g. `nvidia.com/gpu`.
    VendorKind
);

string_newtype!(
    /// Name of a container runtime a spec is restricted to, e.g. `runc`.
    RuntimeName
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn vendor_kind_display_and_as_ref() {
        let kind = VendorKind::new("vendor.com/device");
        assert_eq!(kind.to_string(), "vendor.com/device");
        assert_eq!(kind.as_str(), "vendor.com/device");
        assert_eq!(AsRef::<str>::as_ref(&kind), "vendor.com/device");
    }

    #[test]
    fn runtime_name_serde_is_transparent() {
        let rt = RuntimeName::new("runc");
        let json = serde_json::to_string(&rt).unwrap();
        assert_eq!(json, "\"runc\"");
        let back: RuntimeName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rt);
    }

    #[test]
    fn map_keyed_by_newtype_accepts_str_lookup() {
        let mut map = BTreeMap::new();
        map.insert(RuntimeName::from("all"), 1);
        assert_eq!(map.get("all"), Some(&1));
        assert!(map.get("runc").is_none());
    }

    #[test]
    fn newtypes_order_lexicographically() {
        let mut kinds = vec![VendorKind::from("b.com/x"), VendorKind::from("a.com/x")];
        kinds.sort();
        assert_eq!(kinds[0], "a.com/x");
    }
}
