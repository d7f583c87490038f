//! Remote collaborators for list screens.
//!
//! The collection controller only needs two capabilities: fetch one page of a
//! screen's list, and mutate a single item. [`http::HttpBackend`] provides
//! both over REST; tests supply in-memory versions.

pub mod error;
pub mod http;

use serde_json::Value;

use crate::collection::BulkAction;
use crate::error::Result;
use crate::screen::Screen;

pub use error::ApiError;
pub use http::{HttpBackend, HttpMutator};

/// Fetches raw list responses
pub trait PageSource: Send + Sync {
    /// Fetch `page` (1-based) of `screen` with `limit` rows per page.
    ///
    /// The response is returned untouched; the loader works out its shape.
    fn fetch_page(
        &self,
        screen: &Screen,
        page: usize,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;
}

/// Applies one action to one item
pub trait ItemMutator: Send + Sync {
    fn mutate_item(
        &self,
        action: BulkAction,
        identifier: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
