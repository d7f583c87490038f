//! The collection controller behind one list screen.
//!
//! A [`CollectionController`] owns the loaded rows, the filter, pagination,
//! and the selection for a single screen, and drives bulk actions against the
//! screen's mutator. It is a cheap `Clone` handle: the presentation layer can
//! keep one copy for [`snapshot`](CollectionController::snapshot) while
//! another runs a load or a bulk action.
//!
//! State lives behind a `parking_lot::Mutex` that is never held across an
//! `.await`. Long operations mark themselves with a busy flag instead; a
//! second operation of the same kind fails with [`BackofficeError::Busy`].
//!
//! # Paging modes
//!
//! Every load asks for the current page and limit. If the response carries a
//! pagination block the controller is in [`PagingMode::Server`]: page and
//! limit changes refetch, and client-side filters narrow the loaded page
//! only. Otherwise the response is the full set and is paged locally
//! ([`PagingMode::Client`]). The mode is re-detected on every load.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::bulk::{self, BulkAction, BulkOperationResult, BulkOptions, DeleteToken, PendingDelete};
use super::config::CollectionConfig;
use super::filter::{self, FilterState, ValueFilter};
use super::loader::{self, LoadedPage};
use super::notice::Notice;
use super::pagination::{self, DEFAULT_PAGE_SIZE, PaginationState};
use super::selection::{PageSelection, Selection};
use crate::config::Config;
use crate::error::{BackofficeError, Result};
use crate::record::Record;
use crate::remote::{ItemMutator, PageSource};
use crate::screen::Screen;

/// Tunables shared by every screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: usize,
    pub bulk_concurrency: usize,
    pub notice_ttl: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            bulk_concurrency: 1,
            notice_ttl: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size.max(1),
            bulk_concurrency: config.bulk_concurrency.max(1),
            notice_ttl: config.notice_ttl(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PagingMode {
    #[default]
    Client,
    Server,
}

/// A visible row and whether it is selected
#[derive(Debug, Clone, Serialize)]
pub struct RowView<T> {
    pub item: T,
    pub selected: bool,
}

/// Everything a list screen needs to render, copied out of the controller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot<T> {
    pub rows: Vec<RowView<T>>,
    pub page_selection: PageSelection,
    pub selected_count: usize,
    pub loaded_count: usize,
    pub filtered_count: usize,
    pub pagination: PaginationState,
    pub filter: FilterState,
    pub mode: PagingMode,
    pub loading: bool,
    pub bulk_action_loading: bool,
    pub delete_loading: bool,
    pub notice: Option<Notice>,
    /// Set when the screen cannot show anything (bad navigation context).
    pub blocking_error: Option<String>,
    #[serde(skip)]
    pub pending_delete: Option<PendingDelete>,
    pub last_bulk_result: Option<BulkOperationResult>,
    /// Why the last response was treated as empty.
    pub diagnostic: Option<String>,
}

impl<T> ViewSnapshot<T> {
    pub fn visible_ids(&self) -> Vec<&str>
    where
        T: Record,
    {
        self.rows.iter().map(|row| row.item.id()).collect()
    }
}

struct CollectionState<T> {
    items: Vec<T>,
    filtered: Vec<T>,
    filter: FilterState,
    pagination: PaginationState,
    mode: PagingMode,
    selection: Selection,
    loading: bool,
    bulk_action_loading: bool,
    delete_loading: bool,
    notice: Option<Notice>,
    blocking_error: Option<String>,
    pending_delete: Option<PendingDelete>,
    last_bulk_result: Option<BulkOperationResult>,
    diagnostic: Option<String>,
    bulk_cancel: Option<CancellationToken>,
}

impl<T: Record + Clone> CollectionState<T> {
    fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            filter: FilterState::default(),
            pagination: PaginationState::new(page_size),
            mode: PagingMode::Client,
            selection: Selection::new(),
            loading: false,
            bulk_action_loading: false,
            delete_loading: false,
            notice: None,
            blocking_error: None,
            pending_delete: None,
            last_bulk_result: None,
            diagnostic: None,
            bulk_cancel: None,
        }
    }

    /// Re-run the filter and, in client mode, reconcile pagination.
    fn recompute(&mut self, config: &CollectionConfig) {
        self.filtered = filter::apply(&self.items, &self.filter, config);
        if self.mode == PagingMode::Client {
            self.pagination = self.pagination.reconcile(self.filtered.len());
        }
    }

    fn visible(&self) -> &[T] {
        match self.mode {
            PagingMode::Client => pagination::visible_slice(&self.filtered, &self.pagination),
            PagingMode::Server => self.filtered.as_slice(),
        }
    }

    fn is_loaded(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    fn visible_ids(&self) -> Vec<String> {
        self.visible().iter().map(|item| item.id().to_string()).collect()
    }

    fn accept(&mut self, loaded: LoadedPage<T>, page: usize, config: &CollectionConfig) {
        let limit = self.pagination.limit();
        self.items = loaded.items;
        self.diagnostic = loaded.diagnostic;
        self.blocking_error = None;
        match loaded.server_pagination {
            Some(server) => {
                self.mode = PagingMode::Server;
                self.pagination = server;
            }
            None => {
                self.mode = PagingMode::Client;
                self.pagination = PaginationState::from_parts(page, limit, self.items.len());
            }
        }
        self.recompute(config);
    }

    fn record_failure(&mut self, err: &BackofficeError) {
        if err.is_blocking() {
            self.items.clear();
            self.filtered.clear();
            self.pagination = PaginationState::new(self.pagination.limit());
            self.blocking_error = Some(err.user_message());
        } else {
            self.notice = Some(Notice::error(err.user_message()));
        }
    }

    /// Selected identifiers: loaded rows first, in load order, then any
    /// remaining selections sorted.
    fn ordered_selection(&self) -> Vec<String> {
        let mut ordered: Vec<String> = self
            .items
            .iter()
            .map(Record::id)
            .filter(|id| self.selection.contains(id))
            .map(str::to_string)
            .collect();
        let seen: HashSet<String> = ordered.iter().cloned().collect();
        ordered.extend(
            self.selection
                .ids()
                .into_iter()
                .filter(|id| !seen.contains(id)),
        );
        ordered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusyFlag {
    Loading,
    BulkAction,
    Delete,
}

impl BusyFlag {
    fn name(self) -> &'static str {
        match self {
            BusyFlag::Loading => "load",
            BusyFlag::BulkAction => "bulk action",
            BusyFlag::Delete => "delete",
        }
    }
}

/// Clears its busy flag on drop, whatever way the operation ends.
struct BusyGuard<'a, T> {
    state: &'a Mutex<CollectionState<T>>,
    flag: BusyFlag,
}

impl<'a, T> BusyGuard<'a, T> {
    fn acquire(state: &'a Mutex<CollectionState<T>>, flag: BusyFlag) -> Result<Self> {
        let mut guard = state.lock();
        // Bulk actions and deletes exclude each other
        let busy = match flag {
            BusyFlag::Loading => guard.loading,
            BusyFlag::BulkAction | BusyFlag::Delete => {
                guard.bulk_action_loading || guard.delete_loading
            }
        };
        if busy {
            return Err(BackofficeError::Busy(flag.name()));
        }
        match flag {
            BusyFlag::Loading => guard.loading = true,
            BusyFlag::BulkAction => guard.bulk_action_loading = true,
            BusyFlag::Delete => guard.delete_loading = true,
        }
        Ok(Self { state, flag })
    }
}

impl<T> Drop for BusyGuard<'_, T> {
    fn drop(&mut self) {
        let mut guard = self.state.lock();
        match self.flag {
            BusyFlag::Loading => guard.loading = false,
            BusyFlag::BulkAction => guard.bulk_action_loading = false,
            BusyFlag::Delete => guard.delete_loading = false,
        }
    }
}

struct Inner<T, S, M> {
    screen: Screen,
    config: CollectionConfig,
    source: S,
    mutator: M,
    options: ControllerOptions,
    state: Mutex<CollectionState<T>>,
}

pub struct CollectionController<T, S, M> {
    inner: Arc<Inner<T, S, M>>,
}

impl<T, S, M> Clone for CollectionController<T, S, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, S, M> CollectionController<T, S, M>
where
    T: Record + Clone + DeserializeOwned + Send,
    S: PageSource,
    M: ItemMutator,
{
    /// Controller for `screen` using the screen's own field configuration.
    pub fn new(screen: Screen, source: S, mutator: M, options: ControllerOptions) -> Self {
        let config = screen.collection_config();
        Self::with_collection_config(screen, config, source, mutator, options)
    }

    pub fn with_collection_config(
        screen: Screen,
        config: CollectionConfig,
        source: S,
        mutator: M,
        options: ControllerOptions,
    ) -> Self {
        let state = CollectionState::new(options.page_size.max(1));
        Self {
            inner: Arc::new(Inner {
                screen,
                config,
                source,
                mutator,
                options,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.inner.screen
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.inner.options
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut CollectionState<T>) -> R) -> R {
        let mut state = self.inner.state.lock();
        f(&mut state)
    }

    /// Mutate the filter and re-derive the visible rows.
    fn update_filter(&self, f: impl FnOnce(&mut FilterState)) {
        let config = &self.inner.config;
        self.with_state(|state| {
            f(&mut state.filter);
            state.recompute(config);
        });
    }

    // Loading

    /// Reload the current page.
    pub async fn refresh(&self) -> Result<()> {
        let page = self.with_state(|state| state.pagination.page());
        self.fetch(page).await
    }

    pub async fn load_page(&self, page: usize) -> Result<()> {
        self.fetch(page.max(1)).await
    }

    async fn fetch(&self, page: usize) -> Result<()> {
        let _busy = BusyGuard::acquire(&self.inner.state, BusyFlag::Loading)?;
        let limit = self.with_state(|state| state.pagination.limit());

        let result =
            loader::load::<T, S>(&self.inner.source, &self.inner.screen, page, limit).await;

        let config = &self.inner.config;
        self.with_state(|state| match result {
            Ok(loaded) => {
                state.accept(loaded, page, config);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("loading {} failed: {e}", self.inner.screen);
                state.record_failure(&e);
                Err(e)
            }
        })
    }

    // Filters

    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        self.update_filter(|filter| filter.search_text = text);
    }

    pub fn set_status_filter(&self, status: ValueFilter) {
        self.update_filter(|filter| filter.status_filter = status);
    }

    pub fn set_type_filter(&self, type_filter: ValueFilter) {
        self.update_filter(|filter| filter.type_filter = type_filter);
    }

    /// Sort by `key`, flipping direction if it is already the sort key.
    pub fn request_sort(&self, key: &str) {
        self.update_filter(|filter| filter.request_sort(key));
    }

    pub fn clear_sort(&self) {
        self.update_filter(|filter| filter.sort = None);
    }

    /// Drop every filter and the sort. Also clears the selection.
    pub fn reset_filters(&self) {
        let config = &self.inner.config;
        self.with_state(|state| {
            state.filter = FilterState::default();
            state.selection.clear();
            state.recompute(config);
        });
    }

    // Pagination

    pub async fn go_to_page(&self, page: usize) -> Result<()> {
        let (mode, target) = self.with_state(|state| {
            let target = page.clamp(1, state.pagination.page_count());
            if state.mode == PagingMode::Client {
                state.pagination.go_to_page(target);
            }
            (state.mode, target)
        });
        match mode {
            PagingMode::Client => Ok(()),
            PagingMode::Server => self.fetch(target).await,
        }
    }

    pub async fn next_page(&self) -> Result<()> {
        let (on_last, page) =
            self.with_state(|state| (state.pagination.on_last_page(), state.pagination.page()));
        if on_last {
            return Ok(());
        }
        self.go_to_page(page + 1).await
    }

    pub async fn prev_page(&self) -> Result<()> {
        let (on_first, page) =
            self.with_state(|state| (state.pagination.on_first_page(), state.pagination.page()));
        if on_first {
            return Ok(());
        }
        self.go_to_page(page - 1).await
    }

    /// Change rows per page. Returns to page 1.
    pub async fn set_limit(&self, limit: usize) -> Result<()> {
        let config = &self.inner.config;
        let mode = self.with_state(|state| {
            state.pagination.set_limit(limit);
            if state.mode == PagingMode::Client {
                state.recompute(config);
            }
            state.mode
        });
        match mode {
            PagingMode::Client => Ok(()),
            PagingMode::Server => self.fetch(1).await,
        }
    }

    // Selection

    /// Returns whether `id` is selected afterwards. Only loaded rows can be
    /// added; a selected id can always be removed.
    pub fn toggle(&self, id: &str) -> bool {
        self.with_state(|state| {
            if !state.selection.contains(id) && !state.is_loaded(id) {
                tracing::debug!("ignoring toggle of unknown id {id}");
                return false;
            }
            state.selection.toggle(id)
        })
    }

    /// Select `id` if it is one of the loaded rows. Returns false for
    /// unknown identifiers and for rows already selected.
    pub fn select(&self, id: &str) -> bool {
        self.with_state(|state| {
            if !state.is_loaded(id) {
                tracing::debug!("ignoring selection of unknown id {id}");
                return false;
            }
            state.selection.select(id)
        })
    }

    pub fn deselect(&self, id: &str) -> bool {
        self.with_state(|state| state.selection.deselect(id))
    }

    /// Toggle every visible row as a block.
    pub fn select_page(&self) -> PageSelection {
        self.with_state(|state| {
            let visible = state.visible_ids();
            state.selection.select_page(&visible)
        })
    }

    /// Select every row matching the current filter, on every page that is
    /// loaded. Returns how many were newly selected.
    pub fn select_all_matching(&self) -> usize {
        self.with_state(|state| {
            let matching: Vec<String> = state
                .filtered
                .iter()
                .map(|item| item.id().to_string())
                .collect();
            state.selection.select_all_matching(&matching)
        })
    }

    pub fn clear_selection(&self) -> usize {
        self.with_state(|state| state.selection.clear())
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.with_state(|state| state.ordered_selection())
    }

    // Bulk actions

    fn selection_for(&self, action: BulkAction) -> Result<Vec<String>> {
        self.inner.screen.ensure_allows(action)?;
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Err(BackofficeError::EmptySelection);
        }
        Ok(ids)
    }

    /// Apply `action` to every selected row.
    ///
    /// Per-item failures are reported in the result, not as an error.
    /// Delete must go through [`request_bulk_delete`](Self::request_bulk_delete).
    pub async fn run_bulk_action(&self, action: BulkAction) -> Result<BulkOperationResult> {
        if action.requires_confirmation() {
            return Err(BackofficeError::ConfirmationRequired);
        }
        let ids = self.selection_for(action)?;
        let _busy = BusyGuard::acquire(&self.inner.state, BusyFlag::BulkAction)?;
        Ok(self.execute_bulk(action, ids).await)
    }

    /// Stage a delete of the current selection. Nothing is sent until the
    /// returned token is confirmed.
    pub fn request_bulk_delete(&self) -> Result<DeleteToken> {
        let ids = self.selection_for(BulkAction::Delete)?;
        let pending = PendingDelete::new(ids);
        let token = pending.token;
        self.with_state(|state| {
            if state.delete_loading {
                return Err(BackofficeError::Busy(BusyFlag::Delete.name()));
            }
            if state.pending_delete.replace(pending).is_some() {
                tracing::debug!("replacing an unconfirmed delete");
            }
            Ok(token)
        })
    }

    /// Run the delete staged under `token`.
    pub async fn confirm_bulk_delete(&self, token: DeleteToken) -> Result<BulkOperationResult> {
        let _busy = BusyGuard::acquire(&self.inner.state, BusyFlag::Delete)?;
        let pending = self.with_state(|state| match state.pending_delete.take() {
            Some(pending) if pending.token == token => Ok(pending),
            other => {
                state.pending_delete = other;
                Err(BackofficeError::InvalidDeleteToken(token.to_string()))
            }
        })?;
        Ok(self.execute_bulk(BulkAction::Delete, pending.identifiers).await)
    }

    /// Drop the staged delete. Returns false if none was staged.
    pub fn cancel_bulk_delete(&self) -> bool {
        self.with_state(|state| state.pending_delete.take().is_some())
    }

    /// Stop a running bulk action before its next item. Returns false if
    /// nothing is running.
    pub fn cancel_bulk_action(&self) -> bool {
        self.with_state(|state| match &state.bulk_cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        })
    }

    async fn execute_bulk(&self, action: BulkAction, ids: Vec<String>) -> BulkOperationResult {
        let cancel = CancellationToken::new();
        self.with_state(|state| state.bulk_cancel = Some(cancel.clone()));

        let options = BulkOptions::default()
            .with_concurrency(self.inner.options.bulk_concurrency)
            .with_cancel(cancel);
        let result = bulk::run_bulk_action(action, &ids, &self.inner.mutator, &options).await;

        self.with_state(|state| {
            state.bulk_cancel = None;
            state.notice = Some(bulk_notice(&result));
            state.last_bulk_result = Some(result.clone());
        });

        let refreshed = self.refresh().await;
        self.with_state(|state| {
            state.selection.clear();
            if let Err(e) = &refreshed {
                tracing::warn!("refresh after bulk {action} failed: {e}");
                let message =
                    format!("{}; reload failed: {}", result.summary(), e.user_message());
                state.notice = Some(Notice::warning(message));
            }
        });

        result
    }

    /// Apply `action` to a single row, then reload.
    pub async fn mutate_item(&self, action: BulkAction, id: &str) -> Result<()> {
        self.inner.screen.ensure_allows(action)?;
        let _busy = BusyGuard::acquire(&self.inner.state, BusyFlag::BulkAction)?;

        if let Err(e) = self.inner.mutator.mutate_item(action, id).await {
            tracing::warn!("{action} {id} failed: {e}");
            self.with_state(|state| state.notice = Some(Notice::error(e.user_message())));
            return Err(e);
        }

        self.with_state(|state| {
            state.selection.deselect(id);
            state.notice = Some(Notice::info(format!("'{id}' {}", action.past_tense())));
        });
        if let Err(e) = self.refresh().await {
            tracing::warn!("refresh after {action} {id} failed: {e}");
        }
        Ok(())
    }

    // View

    /// Copy out the current view. A notice older than the configured
    /// `notice_ttl` is dismissed first.
    pub fn snapshot(&self) -> ViewSnapshot<T> {
        let ttl = self.inner.options.notice_ttl;
        self.with_state(|state| {
            if state.notice.as_ref().is_some_and(|n| n.is_expired(ttl)) {
                state.notice = None;
            }
            let visible = state.visible();
            let visible_ids: Vec<&str> = visible.iter().map(Record::id).collect();
            let rows = visible
                .iter()
                .map(|item| RowView {
                    item: item.clone(),
                    selected: state.selection.contains(item.id()),
                })
                .collect();

            ViewSnapshot {
                rows,
                page_selection: state.selection.page_state(&visible_ids),
                selected_count: state.selection.len(),
                loaded_count: state.items.len(),
                filtered_count: state.filtered.len(),
                pagination: state.pagination,
                filter: state.filter.clone(),
                mode: state.mode,
                loading: state.loading,
                bulk_action_loading: state.bulk_action_loading,
                delete_loading: state.delete_loading,
                notice: state.notice.clone(),
                blocking_error: state.blocking_error.clone(),
                pending_delete: state.pending_delete.clone(),
                last_bulk_result: state.last_bulk_result.clone(),
                diagnostic: state.diagnostic.clone(),
            }
        })
    }

    pub fn dismiss_notice(&self) -> bool {
        self.with_state(|state| state.notice.take().is_some())
    }

    /// Drop the notice once it is older than `ttl`. Returns true if it was
    /// dropped.
    pub fn expire_notice(&self, ttl: Duration) -> bool {
        self.with_state(|state| match &state.notice {
            Some(notice) if notice.is_expired(ttl) => {
                state.notice = None;
                true
            }
            _ => false,
        })
    }
}

fn bulk_notice(result: &BulkOperationResult) -> Notice {
    let summary = result.summary();
    if !result.has_failures() && !result.was_cancelled() {
        Notice::info(summary)
    } else if result.success_count() == 0 && result.has_failures() {
        Notice::error(summary)
    } else {
        Notice::warning(summary)
    }
}
