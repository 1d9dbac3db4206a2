/// Group Name Cache - one whole-directory mapping with a single expiry
///
/// Readers always see a complete mapping: rebuilds assemble the new one
/// off to the side and swap the snapshot pointer under a short write lock.
/// At most one rebuild runs at a time; callers that queued behind a
/// rebuild attempt reuse its outcome instead of fetching again.
use crate::{
    config::CacheConfig,
    directory::{GroupDirectory, ResolutionMapping},
    error::MapperResult,
    metrics::CacheMetrics,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Immutable view of the cache at one point in time
#[derive(Debug)]
struct CacheSnapshot {
    mapping: Arc<ResolutionMapping>,
    /// `None` until the first successful rebuild
    expires_at: Option<DateTime<Utc>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    fn empty() -> Self {
        Self {
            mapping: Arc::new(ResolutionMapping::new()),
            expires_at: None,
            refreshed_at: None,
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| now < expires_at)
    }
}

/// Rebuild bookkeeping
#[derive(Debug, Default)]
struct RebuildStatus {
    rebuilds: u64,
    failures: u64,
    last_error: Option<String>,
    last_failure_at: Option<DateTime<Utc>>,
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub rebuilds: u64,
    pub failures: u64,
}

/// Resolution cache over a [`GroupDirectory`]
pub struct GroupNameCache {
    directory: Arc<dyn GroupDirectory>,
    ttl: Duration,
    snapshot: RwLock<Arc<CacheSnapshot>>,
    /// Held for the whole of a rebuild; never held by readers
    rebuild_guard: Mutex<()>,
    /// Bumped after every rebuild attempt, successful or not
    rebuild_epoch: AtomicU64,
    status: Mutex<RebuildStatus>,
    metrics: CacheMetrics,
}

impl GroupNameCache {
    /// Create an empty, stale cache. Nothing is fetched until first use.
    pub fn new(directory: Arc<dyn GroupDirectory>, config: CacheConfig) -> MapperResult<Self> {
        Ok(Self {
            directory,
            ttl: config.ttl(),
            snapshot: RwLock::new(Arc::new(CacheSnapshot::empty())),
            rebuild_guard: Mutex::new(()),
            rebuild_epoch: AtomicU64::new(0),
            status: Mutex::new(RebuildStatus::default()),
            metrics: CacheMetrics::new()?,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    async fn current(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// True while the current mapping is inside its TTL
    pub async fn is_fresh(&self) -> bool {
        self.current().await.is_fresh(Utc::now())
    }

    /// Look up one identifier, rebuilding first if the mapping is stale.
    ///
    /// A failed rebuild is not surfaced here: the lookup answers from
    /// whatever mapping is held, which may be stale or empty.
    pub async fn lookup(&self, id: &str) -> Option<String> {
        let mapping = self.mapping().await;
        let name = mapping.get(id).map(str::to_string);
        self.metrics.record_lookup(name.is_some());
        name
    }

    /// Current mapping, rebuilding first if stale
    pub async fn mapping(&self) -> Arc<ResolutionMapping> {
        self.refresh_if_stale().await;
        Arc::clone(&self.current().await.mapping)
    }

    /// Record a lookup outcome made against a mapping from [`Self::mapping`]
    pub(crate) fn record_lookup(&self, hit: bool) {
        self.metrics.record_lookup(hit);
    }

    async fn refresh_if_stale(&self) {
        if self.current().await.is_fresh(Utc::now()) {
            return;
        }

        let observed_epoch = self.rebuild_epoch.load(Ordering::Acquire);
        let _guard = self.rebuild_guard.lock().await;

        // Someone else attempted a rebuild while we waited for the guard
        if self.rebuild_epoch.load(Ordering::Acquire) != observed_epoch {
            debug!("Group cache rebuild already attempted by a concurrent caller");
            return;
        }
        if self.current().await.is_fresh(Utc::now()) {
            return;
        }

        if let Err(e) = self.run_rebuild().await {
            debug!("Serving previous group mapping after failed rebuild: {}", e);
        }
    }

    /// Rebuild the mapping from the directory unconditionally.
    ///
    /// On success the whole mapping is replaced and the expiry reset to
    /// `now + ttl`; on failure the held mapping and expiry are untouched.
    /// Returns the number of entries in the new mapping.
    pub async fn rebuild(&self) -> MapperResult<usize> {
        let _guard = self.rebuild_guard.lock().await;
        self.run_rebuild().await
    }

    /// Caller must hold `rebuild_guard`
    async fn run_rebuild(&self) -> MapperResult<usize> {
        let started = std::time::Instant::now();
        let result = self.directory.fetch_group_names().await;

        let outcome = match result {
            Ok(mapping) => {
                let now = Utc::now();
                let entries = mapping.len();
                let expires_at = now + self.ttl;
                let snapshot = Arc::new(CacheSnapshot {
                    mapping: Arc::new(mapping),
                    expires_at: Some(expires_at),
                    refreshed_at: Some(now),
                });

                *self.snapshot.write().await = snapshot;

                let mut status = self.status.lock().await;
                status.rebuilds += 1;
                status.last_error = None;
                drop(status);

                self.metrics.record_rebuild(true);
                self.metrics.set_entries(entries);
                info!(
                    "Refreshed group cache with {} entries in {:?}, valid until {}",
                    entries,
                    started.elapsed(),
                    expires_at.to_rfc3339()
                );
                Ok(entries)
            }
            Err(e) => {
                let held = self.current().await.mapping.len();

                let mut status = self.status.lock().await;
                status.failures += 1;
                status.last_error = Some(e.to_string());
                status.last_failure_at = Some(Utc::now());
                drop(status);

                self.metrics.record_rebuild(false);
                error!(
                    "Failed to refresh group cache: {}; keeping {} previously cached entries",
                    e, held
                );
                Err(e)
            }
        };

        self.rebuild_epoch.fetch_add(1, Ordering::Release);
        outcome
    }

    pub async fn stats(&self) -> CacheStats {
        let snapshot = self.current().await;
        let status = self.status.lock().await;

        CacheStats {
            entries: snapshot.mapping.len(),
            fresh: snapshot.is_fresh(Utc::now()),
            expires_at: snapshot.expires_at,
            last_refreshed_at: snapshot.refreshed_at,
            last_error: status.last_error.clone(),
            last_failure_at: status.last_failure_at,
            rebuilds: status.rebuilds,
            failures: status.failures,
        }
    }
}
