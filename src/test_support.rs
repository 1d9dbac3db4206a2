//! In-memory directory doubles and environment helpers shared by unit tests.

use crate::{
    directory::{GroupDirectory, ResolutionMapping},
    error::{GroupMapperError, MapperResult},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Every variable read by `MapperConfig::from_env`
const MAPPER_ENV_VARS: &[&str] = &[
    "GUAC_ENTRA_TENANT_ID",
    "GUAC_ENTRA_CLIENT_ID",
    "GUAC_ENTRA_CLIENT_SECRET",
    "GUAC_ENTRA_CLOUD",
    "GUAC_ENTRA_LOGIN_ENDPOINT",
    "GUAC_ENTRA_GRAPH_ENDPOINT",
    "GUAC_ENTRA_CACHE_TTL_SECS",
    "GUAC_ENTRA_REQUEST_TIMEOUT_SECS",
    "GUAC_ENTRA_LOG_LEVEL",
];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with exactly `vars` set among the mapper's variables.
/// Tests touching the process environment serialize here.
pub fn with_mapper_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    for name in MAPPER_ENV_VARS {
        std::env::remove_var(name);
    }
    for (name, value) in vars {
        std::env::set_var(name, value);
    }
    let result = f();
    for name in MAPPER_ENV_VARS {
        std::env::remove_var(name);
    }
    result
}

pub fn mapping_of(pairs: &[(&str, &str)]) -> ResolutionMapping {
    pairs.iter().copied().collect()
}

/// Directory that answers each fetch with the next scripted result.
/// Once the script runs out every fetch fails.
pub struct ScriptedDirectory {
    script: Mutex<VecDeque<MapperResult<ResolutionMapping>>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedDirectory {
    pub fn new(script: Vec<MapperResult<ResolutionMapping>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep this long inside every fetch, to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupDirectory for ScriptedDirectory {
    async fn fetch_group_names(&self) -> MapperResult<ResolutionMapping> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GroupMapperError::fetch(None, "script exhausted")))
    }
}
