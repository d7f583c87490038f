//! Page loading and response normalization
//!
//! Backends answer list requests in one of four shapes:
//!
//! - a bare array: `[...]`
//! - `{"data": [...], "pagination": {...}}`
//! - `{"<name>": [...], "pagination": {...}}`
//! - `{"data": {"<name>": [...], "pagination": {...}}}`
//!
//! `pagination` may also be spelled `meta`, and is optional in every object
//! shape. Anything else normalizes to an empty page with a diagnostic; the
//! screen shows its empty state instead of an error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::pagination::{PaginationState, ServerPagination};
use crate::error::{BackofficeError, Result};
use crate::remote::PageSource;
use crate::screen::Screen;

const PAGINATION_KEYS: [&str; 2] = ["pagination", "meta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseShape {
    BareList,
    DataList,
    NamedList,
    NestedData,
    Unrecognized,
}

/// Where the rows and pagination block sit in a response
#[derive(Debug, Clone, Copy)]
pub struct Classified<'a> {
    pub shape: ResponseShape,
    pub items: &'a [Value],
    pub pagination: Option<&'a Value>,
}

/// Work out which shape `response` has.
///
/// Named lists are looked up under `list_field` first; failing that, an
/// object with exactly one array-valued key is taken as the list.
pub fn classify<'a>(response: &'a Value, list_field: &str) -> Classified<'a> {
    let unrecognized = Classified {
        shape: ResponseShape::Unrecognized,
        items: &[],
        pagination: None,
    };

    let object = match response {
        Value::Array(items) => {
            return Classified {
                shape: ResponseShape::BareList,
                items,
                pagination: None,
            };
        }
        Value::Object(object) => object,
        _ => return unrecognized,
    };

    match object.get("data") {
        Some(Value::Array(items)) => Classified {
            shape: ResponseShape::DataList,
            items,
            pagination: pagination_block(object),
        },
        Some(Value::Object(inner)) => match named_list(inner, list_field) {
            Some(items) => Classified {
                shape: ResponseShape::NestedData,
                items,
                pagination: pagination_block(inner).or_else(|| pagination_block(object)),
            },
            None => unrecognized,
        },
        _ => match named_list(object, list_field) {
            Some(items) => Classified {
                shape: ResponseShape::NamedList,
                items,
                pagination: pagination_block(object),
            },
            None => unrecognized,
        },
    }
}

fn named_list<'a>(object: &'a Map<String, Value>, list_field: &str) -> Option<&'a [Value]> {
    if let Some(Value::Array(items)) = object.get(list_field) {
        return Some(items.as_slice());
    }

    let mut arrays = object
        .iter()
        .filter(|(key, _)| !PAGINATION_KEYS.contains(&key.as_str()))
        .filter_map(|(_, value)| value.as_array().map(Vec::as_slice));
    match (arrays.next(), arrays.next()) {
        (Some(items), None) => Some(items),
        _ => None,
    }
}

fn pagination_block(object: &Map<String, Value>) -> Option<&Value> {
    PAGINATION_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .filter(|value| value.is_object())
}

/// One normalized page
#[derive(Debug, Clone)]
pub struct LoadedPage<T> {
    pub items: Vec<T>,
    /// Present when the backend paginates; reconciled on arrival.
    pub server_pagination: Option<PaginationState>,
    pub shape: ResponseShape,
    /// Why the response was treated as empty, when it was malformed.
    pub diagnostic: Option<String>,
}

impl<T> LoadedPage<T> {
    pub fn malformed(shape: ResponseShape, diagnostic: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            server_pagination: None,
            shape,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Decode a raw response into items of type `T`.
///
/// `requested_page` and `requested_limit` fill gaps in the server's
/// pagination block.
pub fn normalize<T: DeserializeOwned>(
    response: &Value,
    list_field: &str,
    requested_page: usize,
    requested_limit: usize,
) -> LoadedPage<T> {
    let classified = classify(response, list_field);
    if classified.shape == ResponseShape::Unrecognized {
        return LoadedPage::malformed(
            classified.shape,
            format!(
                "unrecognized response shape (expected a list, 'data', or '{list_field}')"
            ),
        );
    }

    let mut items = Vec::with_capacity(classified.items.len());
    for (index, raw) in classified.items.iter().enumerate() {
        match T::deserialize(raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                return LoadedPage::malformed(classified.shape, format!("item {index}: {e}"));
            }
        }
    }

    let server_pagination = classified.pagination.and_then(|block| {
        match ServerPagination::deserialize(block) {
            Ok(parsed) => Some(parsed.into_state(requested_page, requested_limit, items.len())),
            Err(e) => {
                tracing::warn!("ignoring unreadable pagination block: {e}");
                None
            }
        }
    });

    LoadedPage {
        items,
        server_pagination,
        shape: classified.shape,
        diagnostic: None,
    }
}

/// Fetch and normalize one page of `screen`.
///
/// The navigation context is checked before anything is sent. Network and
/// navigation errors propagate; a malformed response does not.
pub async fn load<T, S>(
    source: &S,
    screen: &Screen,
    page: usize,
    limit: usize,
) -> Result<LoadedPage<T>>
where
    T: DeserializeOwned,
    S: PageSource,
{
    screen.validate_context()?;

    let response = match source.fetch_page(screen, page, limit).await {
        Ok(response) => response,
        Err(BackofficeError::MalformedResponse(reason)) => {
            tracing::warn!("malformed response for {screen}: {reason}");
            return Ok(LoadedPage::malformed(ResponseShape::Unrecognized, reason));
        }
        Err(e) => return Err(e),
    };

    let loaded = normalize(&response, screen.list_field(), page, limit);
    match &loaded.diagnostic {
        Some(diagnostic) => tracing::warn!("malformed response for {screen}: {diagnostic}"),
        None => tracing::debug!(
            "loaded {} rows for {screen} ({:?})",
            loaded.items.len(),
            loaded.shape
        ),
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{JsonItem, Record};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ids(page: &LoadedPage<JsonItem>) -> Vec<&str> {
        page.items.iter().map(|item| item.id()).collect()
    }

    #[test]
    fn test_bare_list() {
        let response = json!([{"_id": "a"}, {"_id": "b"}]);
        let page: LoadedPage<JsonItem> = normalize(&response, "vendors", 1, 10);
        assert_eq!(page.shape, ResponseShape::BareList);
        assert_eq!(ids(&page), vec!["a", "b"]);
        assert!(page.server_pagination.is_none());
    }

    #[test]
    fn test_data_list_with_pagination() {
        let response = json!({
            "data": [{"_id": "a"}],
            "pagination": {"page": 2, "limit": 1, "total": 3}
        });
        let page: LoadedPage<JsonItem> = normalize(&response, "vendors", 1, 10);
        assert_eq!(page.shape, ResponseShape::DataList);
        let pagination = page.server_pagination.unwrap();
        assert_eq!(pagination.page(), 2);
        assert_eq!(pagination.page_count(), 3);
    }

    #[test]
    fn test_named_list() {
        let response = json!({"vendors": [{"_id": "v1"}], "meta": {"totalItems": 1}});
        let page: LoadedPage<JsonItem> = normalize(&response, "vendors", 1, 10);
        assert_eq!(page.shape, ResponseShape::NamedList);
        assert_eq!(ids(&page), vec!["v1"]);
        assert_eq!(page.server_pagination.unwrap().total(), 1);
    }

    #[test]
    fn test_named_list_under_unexpected_key() {
        let response = json!({"success": true, "items": [{"id": 7}]});
        let page: LoadedPage<JsonItem> = normalize(&response, "categories", 1, 10);
        assert_eq!(page.shape, ResponseShape::NamedList);
        assert_eq!(ids(&page), vec!["7"]);
    }

    #[test]
    fn test_nested_data() {
        let response = json!({
            "data": {
                "subCategories": [{"_id": "s1"}, {"_id": "s2"}],
                "pagination": {"currentPage": 1, "perPage": 2, "totalPages": 4}
            }
        });
        let page: LoadedPage<JsonItem> = normalize(&response, "subCategories", 1, 10);
        assert_eq!(page.shape, ResponseShape::NestedData);
        assert_eq!(ids(&page), vec!["s1", "s2"]);
        let pagination = page.server_pagination.unwrap();
        assert_eq!(pagination.total(), 8);
        assert_eq!(pagination.limit(), 2);
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        for response in [
            json!("ok"),
            json!({"message": "nothing here"}),
            json!({"data": {"a": [], "b": []}}),
            json!({"data": 5}),
        ] {
            let page: LoadedPage<JsonItem> = normalize(&response, "vendors", 1, 10);
            assert!(page.items.is_empty());
            assert!(page.is_malformed(), "{response} should be malformed");
        }
    }

    #[test]
    fn test_item_without_identifier_is_malformed() {
        let response = json!({"data": [{"_id": "a"}, {"label": "no id"}]});
        let page: LoadedPage<JsonItem> = normalize(&response, "categories", 1, 10);
        assert_eq!(page.shape, ResponseShape::DataList);
        assert!(page.items.is_empty());
        assert!(page.diagnostic.unwrap().starts_with("item 1:"));
    }

    #[test]
    fn test_unreadable_pagination_is_ignored() {
        let response = json!({"data": [{"_id": "a"}], "pagination": {"page": [1]}});
        let page: LoadedPage<JsonItem> = normalize(&response, "categories", 1, 10);
        assert!(!page.is_malformed());
        assert!(page.server_pagination.is_none());
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let response = json!({"data": [], "pagination": {"page": "18446744073709551615"}});
        let page: LoadedPage<JsonItem> = normalize(&response, "vendors", 1, 10);
        assert!(!page.is_malformed());
        let pagination = page.server_pagination.unwrap();
        assert!(pagination.page() >= 1 && pagination.page() <= pagination.page_count());
        assert!(pagination.on_last_page());
    }

    struct StaticSource {
        response: Value,
        calls: AtomicUsize,
    }

    impl PageSource for StaticSource {
        async fn fetch_page(&self, _screen: &Screen, _page: usize, _limit: usize) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_load_validates_context_before_fetching() {
        let source = StaticSource {
            response: json!([]),
            calls: AtomicUsize::new(0),
        };
        let screen = Screen::new(crate::screen::ScreenKind::SubCategories);
        let result = load::<JsonItem, _>(&source, &screen, 1, 10).await;

        assert!(matches!(result, Err(BackofficeError::NavigationContext(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_uses_screen_list_field() {
        let source = StaticSource {
            response: json!({"data": {"subCategories": [{"_id": "s1"}], "categories": []}}),
            calls: AtomicUsize::new(0),
        };
        let page = load::<JsonItem, _>(&source, &Screen::sub_categories("c1"), 1, 10)
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["s1"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
