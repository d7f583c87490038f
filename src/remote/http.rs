//! REST backend for the list screens.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Screen          | List                                     | Mutate                               | Delete                       |
//! |-----------------|------------------------------------------|--------------------------------------|------------------------------|
//! | categories      | `GET categories`                         | `PATCH categories/{id}/{action}`     | `DELETE categories/{id}`     |
//! | sub-categories  | `GET categories/{parent}/sub-categories` | `PATCH sub-categories/{id}/{action}` | `DELETE sub-categories/{id}` |
//! | vendors-active  | `GET vendors?status=active`              | `PATCH vendors/{id}/{action}`        | `DELETE vendors/{id}`        |
//! | vendors-blocked | `GET vendors?status=blocked`             | `PATCH vendors/{id}/{action}`        | `DELETE vendors/{id}`        |
//!
//! List requests also carry `page` and `limit` query parameters.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use super::error::ApiError;
use super::{ItemMutator, PageSource};
use crate::collection::BulkAction;
use crate::config::Config;
use crate::error::{BackofficeError, Result};
use crate::screen::{Screen, ScreenKind};

/// Connection attempts give up sooner than whole requests.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(BackofficeError::Config(format!(
                "'{base}' cannot be used as a base URL"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .build()
            .map_err(|e| BackofficeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.require_api_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of one page of `screen`'s list.
    pub fn list_url(&self, screen: &Screen, page: usize, limit: usize) -> Result<Url> {
        let mut url = match (screen.kind, screen.validate_context()?) {
            (ScreenKind::SubCategories, Some(parent)) => {
                join(&self.base, &["categories", parent, "sub-categories"])?
            }
            (kind, _) => join(&self.base, &[resource(kind)])?,
        };

        {
            let mut query = url.query_pairs_mut();
            match screen.kind {
                ScreenKind::VendorsActive => {
                    query.append_pair("status", "active");
                }
                ScreenKind::VendorsBlocked => {
                    query.append_pair("status", "blocked");
                }
                ScreenKind::Categories | ScreenKind::SubCategories => {}
            }
            query
                .append_pair("page", &page.to_string())
                .append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }

    /// Mutator bound to `screen`'s item endpoints.
    pub fn mutator(&self, screen: &Screen) -> HttpMutator {
        HttpMutator {
            client: self.client.clone(),
            base: self.base.clone(),
            resource: resource(screen.kind),
        }
    }
}

impl PageSource for HttpBackend {
    async fn fetch_page(&self, screen: &Screen, page: usize, limit: usize) -> Result<Value> {
        let url = self.list_url(screen, page, limit)?;
        tracing::debug!("GET {url}");

        let response = self.client.get(url).send().await?;
        let response = check_status(response, screen.kind.needs_parent()).await?;
        Ok(response.json::<Value>().await?)
    }
}

/// Sends single-item mutations for one resource
#[derive(Debug, Clone)]
pub struct HttpMutator {
    client: Client,
    base: Url,
    resource: &'static str,
}

impl HttpMutator {
    pub fn item_url(&self, action: BulkAction, identifier: &str) -> Result<Url> {
        let action_segment = action.to_string();
        match action {
            BulkAction::Delete => join(&self.base, &[self.resource, identifier]),
            _ => join(&self.base, &[self.resource, identifier, action_segment.as_str()]),
        }
    }
}

impl ItemMutator for HttpMutator {
    async fn mutate_item(&self, action: BulkAction, identifier: &str) -> Result<()> {
        let url = self.item_url(action, identifier)?;
        let request = match action {
            BulkAction::Delete => self.client.delete(url.clone()),
            _ => self.client.patch(url.clone()),
        };
        tracing::debug!("{action} {url}");

        let response = request.send().await?;
        check_status(response, false).await?;
        Ok(())
    }
}

fn resource(kind: ScreenKind) -> &'static str {
    match kind {
        ScreenKind::Categories => "categories",
        ScreenKind::SubCategories => "sub-categories",
        ScreenKind::VendorsActive | ScreenKind::VendorsBlocked => "vendors",
    }
}

/// Append path segments to `base`, percent-encoding each one.
fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| BackofficeError::Config(format!("'{base}' cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check_status(response: Response, parent_scoped: bool) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error = ApiError::from_body(status, &body).parent_scoped(parent_scoped);
    tracing::debug!("request failed with {status}: {error}");
    Err(error.into())
}
