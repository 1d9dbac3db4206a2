/// Paginated group listing
///
/// The listing is consumed as a lazy, finite stream of pages. Each page
/// names the next one through `@odata.nextLink`; the stream ends when a
/// page carries no link and stops at the first error.
use crate::{
    directory::AccessToken,
    error::{GroupMapperError, MapperResult},
};
use futures::Stream;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// One `{ id, displayName }` record from the listing
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

/// One page of the listing
#[derive(Debug, Clone, Deserialize)]
pub struct GroupPage {
    #[serde(rename = "value")]
    pub groups: Vec<GroupRecord>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Where the walk is, and every link already followed
struct PageCursor {
    next: Option<Url>,
    visited: HashSet<Url>,
    page_number: usize,
}

/// Stream every page of the listing starting at `first_url`.
///
/// Continuation links must stay on the origin of `first_url`, and a link
/// that was already followed ends the walk with an error instead of looping.
pub fn page_stream<'a>(
    http_client: &'a reqwest::Client,
    first_url: Url,
    token: &'a AccessToken,
) -> impl Stream<Item = MapperResult<GroupPage>> + 'a {
    let origin = first_url.origin();
    let mut visited = HashSet::new();
    visited.insert(first_url.clone());

    let cursor = PageCursor {
        next: Some(first_url),
        visited,
        page_number: 0,
    };

    futures::stream::try_unfold(cursor, move |mut cursor| {
        let origin = origin.clone();
        async move {
            let url = match cursor.next.take() {
                Some(url) => url,
                None => return Ok(None),
            };
            cursor.page_number += 1;

            let page = fetch_page(http_client, url, token, cursor.page_number).await?;

            if let Some(link) = &page.next_link {
                let next = Url::parse(link).map_err(|e| {
                    GroupMapperError::fetch(None, format!("Invalid continuation link: {}", e))
                })?;
                if next.origin() != origin {
                    return Err(GroupMapperError::fetch(
                        None,
                        format!(
                            "Continuation link leaves the directory origin: {}",
                            next.origin().ascii_serialization()
                        ),
                    ));
                }
                if !cursor.visited.insert(next.clone()) {
                    return Err(GroupMapperError::fetch(
                        None,
                        format!("Continuation link repeats an earlier page: {}", next),
                    ));
                }
                cursor.next = Some(next);
            }

            Ok(Some((page, cursor)))
        }
    })
}

/// GET one page; anything but 200 with a well-formed body fails the page
async fn fetch_page(
    http_client: &reqwest::Client,
    url: Url,
    token: &AccessToken,
    page_number: usize,
) -> MapperResult<GroupPage> {
    debug!("Fetching group page {}: {}", page_number, url);

    let response = http_client
        .get(url)
        .bearer_auth(token.as_str())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(GroupMapperError::fetch(
            Some(status.as_u16()),
            format!("Group listing page {} returned {}", page_number, status),
        ));
    }

    let body = response.text().await?;
    serde_json::from_str::<GroupPage>(&body).map_err(|e| {
        GroupMapperError::fetch(
            Some(status.as_u16()),
            format!("Malformed group listing page {}: {}", page_number, e),
        )
    })
}
