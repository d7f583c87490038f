//! Pagination state and reconciliation.
//!
//! [`PaginationState`] can only be built through constructors that reconcile,
//! so `page_count == max(1, ceil(total / limit))` and `1 <= page <= page_count`
//! hold for every value a caller can observe.

use serde::{Deserialize, Deserializer, Serialize};

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    page: usize,
    limit: usize,
    total: usize,
    page_count: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    /// Empty state on page 1. A zero limit is raised to 1.
    pub fn new(limit: usize) -> Self {
        Self::from_parts(1, limit, 0)
    }

    /// Build a reconciled state from raw values.
    pub fn from_parts(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        let page_count = page_count_for(total, limit);
        Self {
            page: page.clamp(1, page_count),
            limit,
            total,
            page_count,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Zero-based index of the first row on the current page.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    /// Recompute for a new filtered count, keeping page and limit where valid.
    pub fn reconcile(self, filtered_count: usize) -> Self {
        Self::from_parts(self.page, self.limit, filtered_count)
    }

    /// Change the page size. Always returns to page 1.
    pub fn set_limit(&mut self, limit: usize) {
        *self = Self::from_parts(1, limit, self.total);
    }

    /// Jump to `page`, clamped into range.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count);
    }

    pub fn next_page(&mut self) {
        if !self.on_last_page() {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if !self.on_first_page() {
            self.page -= 1;
        }
    }

    pub fn on_first_page(&self) -> bool {
        self.page == 1
    }

    pub fn on_last_page(&self) -> bool {
        self.page == self.page_count
    }

    /// 1-based inclusive bounds of the rows shown, for "showing X-Y of Z".
    /// `None` when there is nothing to show.
    pub fn item_range(&self) -> Option<(usize, usize)> {
        if self.total == 0 {
            return None;
        }
        let start = self.offset() + 1;
        let end = self.offset().saturating_add(self.limit).min(self.total);
        Some((start, end))
    }
}

fn page_count_for(total: usize, limit: usize) -> usize {
    total.div_ceil(limit).max(1)
}

/// Reconcile `state` against a filtered item count.
pub fn reconcile(filtered_count: usize, state: PaginationState) -> PaginationState {
    state.reconcile(filtered_count)
}

/// Rows of `items` that fall on the current page.
pub fn visible_slice<'a, T>(items: &'a [T], state: &PaginationState) -> &'a [T] {
    let start = state.offset().min(items.len());
    let end = start.saturating_add(state.limit()).min(items.len());
    &items[start..end]
}

/// Pagination block as servers send it.
///
/// Accepts the usual spellings of each key, and numbers sent as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPagination {
    #[serde(default, alias = "currentPage", deserialize_with = "lenient_count")]
    pub page: Option<usize>,
    #[serde(
        default,
        alias = "perPage",
        alias = "pageSize",
        deserialize_with = "lenient_count"
    )]
    pub limit: Option<usize>,
    #[serde(
        default,
        alias = "totalItems",
        alias = "count",
        deserialize_with = "lenient_count"
    )]
    pub total: Option<usize>,
    #[serde(
        default,
        alias = "totalPages",
        alias = "pages",
        deserialize_with = "lenient_count"
    )]
    pub page_count: Option<usize>,
}

impl ServerPagination {
    /// Turn the server's block into a reconciled state. Missing values fall
    /// back to what was requested; a missing total is inferred from the page
    /// count or from the rows received.
    pub fn into_state(
        self,
        requested_page: usize,
        requested_limit: usize,
        received: usize,
    ) -> PaginationState {
        let page = self.page.unwrap_or(requested_page).max(1);
        let limit = self.limit.unwrap_or(requested_limit).max(1);
        let total = match (self.total, self.page_count) {
            (Some(total), _) => total,
            (None, Some(pages)) => pages.saturating_mul(limit),
            (None, None) => (page - 1).saturating_mul(limit).saturating_add(received),
        };
        PaginationState::from_parts(page, limit, total)
    }
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Number(n)) => usize::try_from(n).ok(),
        Some(Count::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
