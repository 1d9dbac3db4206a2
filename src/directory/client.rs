/// Directory client - token acquisition and full group listing
use crate::{
    config::DirectoryConfig,
    directory::{pages, AccessToken, GroupDirectory, GroupPage, ResolutionMapping},
    error::{GroupMapperError, MapperResult},
};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Fields requested from the groups listing
const GROUP_SELECT: &str = "id,displayName";

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 error body, when the endpoint sends one
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
}

/// HTTP client for the token endpoint and the groups listing
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http_client: reqwest::Client,
    config: DirectoryConfig,
}

impl DirectoryClient {
    /// Create a new directory client
    pub fn new(config: DirectoryConfig) -> MapperResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                GroupMapperError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Client-credentials exchange against the tenant's token endpoint.
    ///
    /// No expiry tracking: every rebuild asks for a fresh token.
    #[instrument(skip(self), fields(tenant_id = %self.config.tenant_id))]
    pub async fn acquire_access_token(&self) -> MapperResult<AccessToken> {
        let scope = self.config.scope();
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(self.config.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| GroupMapperError::auth(None, format!("Token request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(GroupMapperError::auth(
                Some(status.as_u16()),
                format!("Token endpoint rejected the request: {}", reason),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            GroupMapperError::auth(
                Some(status.as_u16()),
                format!("Failed to parse token response: {}", e),
            )
        })?;

        if token.access_token.is_empty() {
            return Err(GroupMapperError::auth(
                Some(status.as_u16()),
                "Token response carried an empty access_token",
            ));
        }

        debug!("Acquired directory access token");
        Ok(AccessToken::new(token.access_token))
    }

    /// First page of the listing, `$select`ing only id and display name
    pub fn groups_listing_url(&self) -> MapperResult<Url> {
        let mut url = Url::parse(&self.config.groups_url()).map_err(|e| {
            GroupMapperError::Configuration(format!("Invalid groups listing URL: {}", e))
        })?;
        url.query_pairs_mut().append_pair("$select", GROUP_SELECT);
        Ok(url)
    }

    /// Lazy page sequence over the listing. Not restartable; ask again for
    /// a new walk.
    pub fn group_pages<'a>(
        &'a self,
        token: &'a AccessToken,
    ) -> MapperResult<impl Stream<Item = MapperResult<GroupPage>> + 'a> {
        let first_url = self.groups_listing_url()?;
        Ok(pages::page_stream(&self.http_client, first_url, token))
    }

    /// Walk every page into a fresh mapping.
    ///
    /// The first failing page aborts the walk and the partial mapping is
    /// dropped with it.
    #[instrument(skip(self, token))]
    pub async fn fetch_all_groups(&self, token: &AccessToken) -> MapperResult<ResolutionMapping> {
        let pages = self.group_pages(token)?;
        futures::pin_mut!(pages);

        let mut mapping = ResolutionMapping::new();
        let mut page_count = 0usize;
        let mut skipped = 0usize;

        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            for group in page.groups {
                match group.display_name {
                    Some(name) => mapping.insert(&group.id, name),
                    None => {
                        skipped += 1;
                        debug!("Group {} has no display name, skipping", group.id);
                    }
                }
            }
        }

        info!(
            "Fetched {} groups across {} pages ({} without display name)",
            mapping.len(),
            page_count,
            skipped
        );

        Ok(mapping)
    }
}

#[async_trait]
impl GroupDirectory for DirectoryClient {
    async fn fetch_group_names(&self) -> MapperResult<ResolutionMapping> {
        let token = self.acquire_access_token().await?;
        self.fetch_all_groups(&token).await
    }
}
