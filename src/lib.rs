//! Entra group names
//!
//! Resolves the directory object IDs found in Entra ID group claims into
//! group display names, so authorization rules can be written against
//! names instead of GUIDs.
//!
//! The core is a resolution cache holding one complete `id -> displayName`
//! mapping fetched from Microsoft Graph. The mapping expires as a whole and
//! is rebuilt lazily on the next lookup. Resolution is best effort: any
//! identifier that cannot be resolved, for whatever reason, is handed back
//! unchanged so login never blocks on the directory.
//!
//! # Example
//!
//! ```no_run
//! use entra_group_names::{GroupResolver, MapperConfig};
//! use std::collections::HashSet;
//!
//! # async fn example() -> entra_group_names::MapperResult<()> {
//! let config = MapperConfig::from_env()?;
//! let resolver = GroupResolver::from_config(&config)?;
//!
//! let raw: HashSet<String> = ["550e8400-e29b-41d4-a716-446655440000", "Administrators"]
//!     .into_iter()
//!     .map(String::from)
//!     .collect();
//! let resolved = resolver.resolve(&raw).await;
//! # let _ = resolved;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod resolver;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use cache::{CacheStats, GroupNameCache};
pub use config::{CacheConfig, DirectoryCloud, DirectoryConfig, LoggingConfig, MapperConfig};
pub use directory::{AccessToken, DirectoryClient, GroupDirectory, ResolutionMapping};
pub use error::{GroupMapperError, MapperResult};
pub use metrics::CacheMetrics;
pub use provider::{
    AuthenticatedUser, AuthenticationProvider, Credentials, GroupNameProvider, PROVIDER_IDENTIFIER,
};
pub use resolver::{is_object_id, GroupResolver};
