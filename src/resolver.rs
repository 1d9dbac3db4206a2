/// Group Resolver - swaps directory object IDs for display names
///
/// Resolution order for each raw group:
/// 1. Not GUID-shaped: already a usable name, passed through
/// 2. GUID-shaped and in the mapping: replaced by its display name
/// 3. GUID-shaped but unknown (or the directory is down): kept as-is
use crate::{
    cache::GroupNameCache,
    config::MapperConfig,
    directory::{DirectoryClient, GroupDirectory},
    error::MapperResult,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref OBJECT_ID: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .expect("object id pattern is valid");
}

/// Canonical 8-4-4-4-12 hex GUID, any letter case
pub fn is_object_id(value: &str) -> bool {
    OBJECT_ID.is_match(value)
}

/// Public resolution entry point
#[derive(Clone)]
pub struct GroupResolver {
    cache: Arc<GroupNameCache>,
}

impl GroupResolver {
    pub fn new(cache: Arc<GroupNameCache>) -> Self {
        Self { cache }
    }

    /// Wire a directory client and cache from configuration
    pub fn from_config(config: &MapperConfig) -> MapperResult<Self> {
        let directory: Arc<dyn GroupDirectory> =
            Arc::new(DirectoryClient::new(config.directory.clone())?);
        let cache = GroupNameCache::new(directory, config.cache.clone())?;
        Ok(Self::new(Arc::new(cache)))
    }

    pub fn cache(&self) -> &Arc<GroupNameCache> {
        &self.cache
    }

    /// Resolve a raw group set. Never fails.
    ///
    /// The cache is consulted (and refreshed if stale) at most once per
    /// call, and only when at least one entry looks like an object ID.
    pub async fn resolve(&self, groups: &HashSet<String>) -> HashSet<String> {
        if !groups.iter().any(|g| is_object_id(g)) {
            return groups.clone();
        }

        let mapping = self.cache.mapping().await;

        groups
            .iter()
            .map(|group| {
                if !is_object_id(group) {
                    return group.clone();
                }
                match mapping.get(group) {
                    Some(name) => {
                        self.cache.record_lookup(true);
                        debug!("Resolved group {} to {}", group, name);
                        name.to_string()
                    }
                    None => {
                        self.cache.record_lookup(false);
                        debug!("Could not resolve group {}, keeping object ID", group);
                        group.clone()
                    }
                }
            })
            .collect()
    }
}
