//! In-memory backend shared by the integration tests.
//!
//! [`MockStore`] holds the rows; [`MockSource`] serves them either as one
//! full list or as server-side pages, and [`MockMutator`] applies actions to
//! the same rows so a post-action refresh sees the change.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use backoffice::collection::BulkAction;
use backoffice::error::{BackofficeError, Result};
use backoffice::record::JsonItem;
use backoffice::screen::Screen;
use backoffice::{CollectionController, ControllerOptions, ItemMutator, PageSource};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub type TestController = CollectionController<JsonItem, MockSource, MockMutator>;

/// Rows shared between the source and the mutator
#[derive(Clone, Default)]
pub struct MockStore {
    rows: Arc<Mutex<Vec<Value>>>,
}

impl MockStore {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows
            .lock()
            .iter()
            .filter_map(|row| row["_id"].as_str().map(str::to_string))
            .collect()
    }

    pub fn status_of(&self, id: &str) -> Option<String> {
        self.rows
            .lock()
            .iter()
            .find(|row| row["_id"] == id)
            .and_then(|row| row["status"].as_str().map(str::to_string))
    }
}

type ErrorFactory = Box<dyn Fn() -> BackofficeError + Send + Sync>;

#[derive(Default)]
struct SourceState {
    requests: Mutex<Vec<(usize, usize)>>,
    failure: Mutex<Option<ErrorFactory>>,
    raw: Mutex<Option<Value>>,
}

/// Serves the store's rows
#[derive(Clone)]
pub struct MockSource {
    store: MockStore,
    server_paged: bool,
    state: Arc<SourceState>,
}

impl MockSource {
    /// Every request returns the whole store as a bare array.
    pub fn full(store: MockStore) -> Self {
        Self {
            store,
            server_paged: false,
            state: Arc::default(),
        }
    }

    /// Requests return one page with a pagination block.
    pub fn paged(store: MockStore) -> Self {
        Self {
            server_paged: true,
            ..Self::full(store)
        }
    }

    /// Make every following request fail with the error `make` builds.
    pub fn fail_with(&self, make: impl Fn() -> BackofficeError + Send + Sync + 'static) {
        *self.state.failure.lock() = Some(Box::new(make));
    }

    pub fn recover(&self) {
        *self.state.failure.lock() = None;
    }

    /// Return `value` verbatim instead of the store's rows.
    pub fn respond_with(&self, value: Value) {
        *self.state.raw.lock() = Some(value);
    }

    /// `(page, limit)` of every request so far.
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    fn respond(&self, page: usize, limit: usize) -> Result<Value> {
        self.state.requests.lock().push((page, limit));
        if let Some(make) = self.state.failure.lock().as_ref() {
            return Err(make());
        }
        if let Some(raw) = self.state.raw.lock().clone() {
            return Ok(raw);
        }

        let rows = self.store.rows.lock().clone();
        if !self.server_paged {
            return Ok(Value::Array(rows));
        }
        let total = rows.len();
        let page_rows: Vec<Value> = rows
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();
        Ok(json!({
            "data": page_rows,
            "pagination": {"page": page, "limit": limit, "total": total},
        }))
    }
}

impl PageSource for MockSource {
    async fn fetch_page(&self, _screen: &Screen, page: usize, limit: usize) -> Result<Value> {
        self.respond(page, limit)
    }
}

type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Applies actions to the store, rejecting a configurable set of ids
#[derive(Clone)]
pub struct MockMutator {
    store: MockStore,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<(BulkAction, String)>>>,
    on_call: Arc<Mutex<Option<CallHook>>>,
}

impl MockMutator {
    pub fn new(store: MockStore) -> Self {
        Self {
            store,
            failing: Arc::default(),
            calls: Arc::default(),
            on_call: Arc::default(),
        }
    }

    /// Run `hook` after every mutation with the number of calls so far.
    pub fn after_call(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.on_call.lock() = Some(Box::new(hook));
    }

    pub fn reject(&self, ids: &[&str]) {
        self.failing
            .lock()
            .extend(ids.iter().map(|id| id.to_string()));
    }

    pub fn calls(&self) -> Vec<(BulkAction, String)> {
        self.calls.lock().clone()
    }

    pub fn called_ids(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, id)| id.clone()).collect()
    }
}

impl ItemMutator for MockMutator {
    async fn mutate_item(&self, action: BulkAction, identifier: &str) -> Result<()> {
        let count = {
            let mut calls = self.calls.lock();
            calls.push((action, identifier.to_string()));
            calls.len()
        };
        let result = self.apply(action, identifier);
        if let Some(hook) = self.on_call.lock().as_ref() {
            hook(count);
        }
        result
    }
}

impl MockMutator {
    fn apply(&self, action: BulkAction, identifier: &str) -> Result<()> {
        if self.failing.lock().contains(identifier) {
            return Err(BackofficeError::Network {
                message: format!("{identifier} could not be changed"),
                status: Some(409),
            });
        }

        let mut rows = self.store.rows.lock();
        let position = rows.iter().position(|row| row["_id"] == identifier);
        match (action, position) {
            (_, None) => Err(BackofficeError::Network {
                message: format!("{identifier} not found"),
                status: Some(404),
            }),
            (BulkAction::Delete, Some(index)) => {
                rows.remove(index);
                Ok(())
            }
            (action, Some(index)) => {
                let status = match action {
                    BulkAction::Block => "blocked",
                    BulkAction::Unblock | BulkAction::Activate => "active",
                    _ => "inactive",
                };
                rows[index]["status"] = json!(status);
                Ok(())
            }
        }
    }
}

/// `n` vendors `v1..vn`. Odd-numbered ones are named "Shop N", even ones
/// "Market N"; every third is of type "Digital".
pub fn vendors(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "_id": format!("v{i}"),
                "name": if i % 2 == 1 { format!("Shop {i}") } else { format!("Market {i}") },
                "email": format!("vendor{i}@example.com"),
                "type": if i % 3 == 0 { "Digital" } else { "Physical" },
                "status": "active",
            })
        })
        .collect()
}

/// Four categories with accented and mixed-case labels.
pub fn categories() -> Vec<Value> {
    ["Don", "Donation", "Échange", "Produit"]
        .iter()
        .enumerate()
        .map(|(i, label)| json!({"_id": format!("c{}", i + 1), "label": label, "type": "goods"}))
        .collect()
}

pub fn options(page_size: usize) -> ControllerOptions {
    ControllerOptions {
        page_size,
        ..ControllerOptions::default()
    }
}

/// Controller plus handles on its collaborators
pub struct Harness {
    pub controller: TestController,
    pub source: MockSource,
    pub mutator: MockMutator,
    pub store: MockStore,
}

impl Harness {
    pub fn client(screen: Screen, rows: Vec<Value>, page_size: usize) -> Self {
        let store = MockStore::new(rows);
        Self::build(screen, MockSource::full(store.clone()), store, page_size)
    }

    pub fn server(screen: Screen, rows: Vec<Value>, page_size: usize) -> Self {
        let store = MockStore::new(rows);
        Self::build(screen, MockSource::paged(store.clone()), store, page_size)
    }

    fn build(screen: Screen, source: MockSource, store: MockStore, page_size: usize) -> Self {
        let mutator = MockMutator::new(store.clone());
        let controller = CollectionController::new(
            screen,
            source.clone(),
            mutator.clone(),
            options(page_size),
        );
        Self {
            controller,
            source,
            mutator,
            store,
        }
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.controller
            .snapshot()
            .visible_ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
