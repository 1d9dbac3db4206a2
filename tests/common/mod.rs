//! Mock directory service shared by the integration tests.

#![allow(dead_code)]

use entra_group_names::{DirectoryClient, DirectoryConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT_ID: &str = "contoso-tenant";
pub const ACCESS_TOKEN: &str = "mock-access-token";

pub fn create_group(id: &str, name: &str) -> Value {
    json!({ "id": id, "displayName": name })
}

/// Wraps groups in a Graph listing page
pub fn create_page(groups: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut page = json!({
        "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#groups(id,displayName)",
        "value": groups
    });
    if let Some(link) = next_link {
        page["@odata.nextLink"] = json!(link);
    }
    page
}

pub fn create_token_response(access_token: &str) -> Value {
    json!({
        "token_type": "Bearer",
        "expires_in": 3599,
        "ext_expires_in": 3599,
        "access_token": access_token
    })
}

/// Mock server standing in for both the token endpoint and Graph
pub struct MockDirectory {
    pub server: MockServer,
}

impl MockDirectory {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> DirectoryConfig {
        DirectoryConfig::new(TENANT_ID, "client-id", "client-secret")
            .with_endpoints(self.url(), self.url())
            .with_request_timeout_secs(5)
    }

    pub fn client(&self) -> DirectoryClient {
        DirectoryClient::new(self.config()).unwrap()
    }

    /// Continuation link for page `n` (2-based)
    pub fn page_link(&self, n: usize) -> String {
        format!("{}/v1.0/groups?$skiptoken=page{}", self.url(), n)
    }

    /// Token endpoint answering every form-encoded client-credentials request
    pub async fn mock_token_endpoint(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/oauth2/v2.0/token", TENANT_ID)))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-id"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_token_response(ACCESS_TOKEN)),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_token_failure(&self, status: u16, error: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/oauth2/v2.0/token", TENANT_ID)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": error,
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&self.server)
            .await;
    }

    /// First page of the listing, the one requested with `$select`
    pub async fn mock_first_page(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v1.0/groups"))
            .and(query_param("$select", "id,displayName"))
            .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Page reached through a continuation link
    pub async fn mock_page(&self, n: usize, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v1.0/groups"))
            .and(query_param("$skiptoken", format!("page{}", n).as_str()))
            .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Three pages: 2 groups, 2 groups, 1 group
    pub async fn mock_three_pages(&self) {
        self.mock_first_page(ResponseTemplate::new(200).set_body_json(create_page(
            vec![
                create_group("00000000-0000-0000-0000-000000000001", "Group One"),
                create_group("00000000-0000-0000-0000-000000000002", "Group Two"),
            ],
            Some(&self.page_link(2)),
        )))
        .await;
        self.mock_page(
            2,
            ResponseTemplate::new(200).set_body_json(create_page(
                vec![
                    create_group("00000000-0000-0000-0000-000000000003", "Group Three"),
                    create_group("00000000-0000-0000-0000-000000000004", "Group Four"),
                ],
                Some(&self.page_link(3)),
            )),
        )
        .await;
        self.mock_page(
            3,
            ResponseTemplate::new(200).set_body_json(create_page(
                vec![create_group(
                    "00000000-0000-0000-0000-000000000005",
                    "Group Five",
                )],
                None,
            )),
        )
        .await;
    }

    pub async fn request_count(&self, method_name: &str, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == method_name && r.url.path() == request_path)
            .count()
    }
}
