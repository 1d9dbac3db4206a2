/// Authentication provider adapter
///
/// The host authentication pipeline talks to providers through
/// [`AuthenticationProvider`]. [`GroupNameProvider`] is a decorator with
/// no login logic of its own: it wraps an inner provider and rewrites the
/// effective groups of users that provider produced.
use crate::{config::MapperConfig, error::MapperResult, resolver::GroupResolver};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Identifier the host uses for this extension
pub const PROVIDER_IDENTIFIER: &str = "entra-group-names";

/// Credentials presented at login, as handed over by the host
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub parameters: HashMap<String, String>,
}

/// An authenticated user as seen by the authorization layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub identifier: String,
    /// Identifier of the provider that authenticated the user
    pub provider: String,
    pub effective_groups: HashSet<String>,
}

impl AuthenticatedUser {
    pub fn new(identifier: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            provider: provider.into(),
            effective_groups: HashSet::new(),
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effective_groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

/// Capabilities the host pipeline calls on each provider
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    fn identifier(&self) -> &str;

    /// Authenticate from raw credentials; `None` when this provider does
    /// not recognise them
    async fn authenticate_user(
        &self,
        credentials: &Credentials,
    ) -> MapperResult<Option<AuthenticatedUser>>;

    /// Give the provider a chance to replace a user authenticated elsewhere
    async fn update_authenticated_user(
        &self,
        user: AuthenticatedUser,
        credentials: &Credentials,
    ) -> MapperResult<AuthenticatedUser>;

    /// Adjust a user after every provider has seen it
    async fn decorate(
        &self,
        user: AuthenticatedUser,
        credentials: &Credentials,
    ) -> MapperResult<AuthenticatedUser>;
}

/// Delegating provider that resolves group object IDs to display names
pub struct GroupNameProvider<P> {
    inner: P,
    /// `None` when activated without directory configuration
    resolver: Option<GroupResolver>,
}

impl<P: AuthenticationProvider> GroupNameProvider<P> {
    pub fn new(inner: P, resolver: GroupResolver) -> Self {
        Self {
            inner,
            resolver: Some(resolver),
        }
    }

    /// Wrap `inner` without resolution; groups pass through untouched
    pub fn passthrough(inner: P) -> Self {
        Self {
            inner,
            resolver: None,
        }
    }

    /// Build the directory client, cache and resolver from configuration
    pub fn from_config(inner: P, config: &MapperConfig) -> MapperResult<Self> {
        Ok(Self::new(inner, GroupResolver::from_config(config)?))
    }

    /// Build from the environment. Missing or invalid configuration
    /// activates the provider as a passthrough instead of failing login.
    pub fn from_env(inner: P) -> Self {
        match MapperConfig::from_env().and_then(|config| GroupResolver::from_config(&config)) {
            Ok(resolver) => {
                info!("Entra group name resolution enabled");
                Self::new(inner, resolver)
            }
            Err(e) => {
                warn!(
                    "Entra group name extension is not properly configured ({}); \
                     group identifiers will pass through unchanged",
                    e
                );
                Self::passthrough(inner)
            }
        }
    }

    pub fn is_resolving(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn resolve_user(&self, mut user: AuthenticatedUser) -> AuthenticatedUser {
        let Some(resolver) = &self.resolver else {
            return user;
        };
        if user.effective_groups.is_empty() {
            return user;
        }
        user.effective_groups = resolver.resolve(&user.effective_groups).await;
        user
    }
}

#[async_trait]
impl<P: AuthenticationProvider> AuthenticationProvider for GroupNameProvider<P> {
    fn identifier(&self) -> &str {
        PROVIDER_IDENTIFIER
    }

    /// Authentication itself is left to the inner provider
    async fn authenticate_user(
        &self,
        credentials: &Credentials,
    ) -> MapperResult<Option<AuthenticatedUser>> {
        match self.inner.authenticate_user(credentials).await? {
            Some(user) => Ok(Some(self.resolve_user(user).await)),
            None => Ok(None),
        }
    }

    async fn update_authenticated_user(
        &self,
        user: AuthenticatedUser,
        credentials: &Credentials,
    ) -> MapperResult<AuthenticatedUser> {
        let user = self
            .inner
            .update_authenticated_user(user, credentials)
            .await?;
        Ok(self.resolve_user(user).await)
    }

    async fn decorate(
        &self,
        user: AuthenticatedUser,
        credentials: &Credentials,
    ) -> MapperResult<AuthenticatedUser> {
        self.inner.decorate(user, credentials).await
    }
}
