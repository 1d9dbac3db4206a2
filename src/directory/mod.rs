//! Directory access
//!
//! Talks to the remote directory service: acquires a client-credentials
//! token and walks the paginated group listing into a complete
//! identifier -> display name mapping.

pub mod client;
pub mod pages;

pub use client::DirectoryClient;
pub use pages::{GroupPage, GroupRecord};

use crate::error::MapperResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// Short-lived bearer credential for the groups listing endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Complete identifier -> display name mapping from one fetch cycle
///
/// Keys are stored lower-cased so lookups ignore GUID letter case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionMapping {
    names: HashMap<String, String>,
}

impl ResolutionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, display_name: impl Into<String>) {
        self.names.insert(id.to_ascii_lowercase(), display_name.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.names
            .get(&id.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResolutionMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = ResolutionMapping::new();
        for (id, name) in iter {
            mapping.insert(id.as_ref(), name);
        }
        mapping
    }
}

/// Source of complete group mappings
///
/// The resolution cache only needs this one operation; tests substitute
/// in-memory directories.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Fetch every known group. All-or-nothing: any failure discards
    /// whatever was accumulated.
    async fn fetch_group_names(&self) -> MapperResult<ResolutionMapping>;
}
