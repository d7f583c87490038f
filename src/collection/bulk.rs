//! Bulk actions over a selection
//!
//! Every identifier is mutated independently: a failure is recorded and the
//! loop moves on. The default is one request at a time; a bounded window of
//! concurrent requests is available through [`BulkOptions::concurrency`].
//! Either way a [`CancellationToken`] is checked before each item starts.

use std::fmt;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::BackofficeError;
use crate::remote::ItemMutator;

/// Mutations a list screen can apply to selected rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Block,
    Unblock,
    Activate,
    Deactivate,
    Delete,
}

crate::enum_display_fromstr!(
    BulkAction,
    BackofficeError::InvalidAction,
    {
        Block => "block",
        Unblock => "unblock",
        Activate => "activate",
        Deactivate => "deactivate",
        Delete => "delete",
    }
);

impl BulkAction {
    pub const ALL: [BulkAction; 5] = [
        BulkAction::Block,
        BulkAction::Unblock,
        BulkAction::Activate,
        BulkAction::Deactivate,
        BulkAction::Delete,
    ];

    /// Delete is the only action that needs an explicit confirmation step.
    pub fn requires_confirmation(self) -> bool {
        matches!(self, BulkAction::Delete)
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            BulkAction::Block => "blocked",
            BulkAction::Unblock => "unblocked",
            BulkAction::Activate => "activated",
            BulkAction::Deactivate => "deactivated",
            BulkAction::Delete => "deleted",
        }
    }
}

/// One identifier the mutator rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub identifier: String,
    pub error_message: String,
}

/// Outcome of one bulk invocation. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResult {
    action: BulkAction,
    success_count: usize,
    failure_count: usize,
    failures: Vec<BulkFailure>,
    skipped: Vec<String>,
    cancelled: bool,
}

impl BulkOperationResult {
    pub fn action(&self) -> BulkAction {
        self.action
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn failures(&self) -> &[BulkFailure] {
        &self.failures
    }

    /// Identifiers never attempted because the run was cancelled.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }

    /// Aggregate message shown once the batch is done.
    pub fn summary(&self) -> String {
        let mut message = format!(
            "{} succeeded, {} failed",
            self.success_count, self.failure_count
        );
        if !self.skipped.is_empty() {
            message.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        message
    }
}

/// Execution knobs for a bulk run
#[derive(Debug, Clone)]
pub struct BulkOptions {
    /// Requests in flight at once. 1 runs strictly in order.
    pub concurrency: usize,
    /// Checked before each item starts.
    pub cancel: CancellationToken,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            cancel: CancellationToken::new(),
        }
    }
}

impl BulkOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

enum ItemOutcome {
    Succeeded,
    Failed(String),
    Skipped,
}

/// Apply `action` to every identifier through `mutator`.
///
/// Never fails as a whole: per-item errors land in the result's failure
/// list, in input order.
pub async fn run_bulk_action<M: ItemMutator>(
    action: BulkAction,
    identifiers: &[String],
    mutator: &M,
    options: &BulkOptions,
) -> BulkOperationResult {
    let outcomes = if options.concurrency <= 1 {
        run_sequential(action, identifiers, mutator, &options.cancel).await
    } else {
        run_windowed(action, identifiers, mutator, options).await
    };

    let mut result = BulkOperationResult {
        action,
        success_count: 0,
        failure_count: 0,
        failures: Vec::new(),
        skipped: Vec::new(),
        cancelled: false,
    };

    for (identifier, outcome) in identifiers.iter().zip(outcomes) {
        match outcome {
            ItemOutcome::Succeeded => result.success_count += 1,
            ItemOutcome::Failed(error_message) => {
                result.failure_count += 1;
                result.failures.push(BulkFailure {
                    identifier: identifier.clone(),
                    error_message,
                });
            }
            ItemOutcome::Skipped => {
                result.cancelled = true;
                result.skipped.push(identifier.clone());
            }
        }
    }

    tracing::info!(
        "bulk {} finished: {}",
        action,
        result.summary()
    );

    result
}

async fn run_sequential<M: ItemMutator>(
    action: BulkAction,
    identifiers: &[String],
    mutator: &M,
    cancel: &CancellationToken,
) -> Vec<ItemOutcome> {
    let mut outcomes = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        if cancel.is_cancelled() {
            outcomes.push(ItemOutcome::Skipped);
            continue;
        }
        outcomes.push(mutate_one(action, identifier, mutator).await);
    }
    outcomes
}

async fn run_windowed<M: ItemMutator>(
    action: BulkAction,
    identifiers: &[String],
    mutator: &M,
    options: &BulkOptions,
) -> Vec<ItemOutcome> {
    let cancel = &options.cancel;

    let mut indexed: Vec<(usize, ItemOutcome)> = stream::iter(identifiers.iter().enumerate())
        .map(|(index, identifier)| async move {
            if cancel.is_cancelled() {
                return (index, ItemOutcome::Skipped);
            }
            (index, mutate_one(action, identifier, mutator).await)
        })
        .buffer_unordered(options.concurrency)
        .collect()
        .await;

    // Completion order is arbitrary; report in input order
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

async fn mutate_one<M: ItemMutator>(
    action: BulkAction,
    identifier: &str,
    mutator: &M,
) -> ItemOutcome {
    match mutator.mutate_item(action, identifier).await {
        Ok(()) => {
            tracing::debug!("{action} {identifier}: ok");
            ItemOutcome::Succeeded
        }
        Err(e) => {
            tracing::warn!("{action} {identifier} failed: {e}");
            ItemOutcome::Failed(e.user_message())
        }
    }
}

/// Handle for a delete waiting on confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeleteToken(Uuid);

impl DeleteToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeleteToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeleteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A requested delete and the identifiers it will remove once confirmed
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub token: DeleteToken,
    pub identifiers: Vec<String>,
}

impl PendingDelete {
    pub fn new(identifiers: Vec<String>) -> Self {
        Self {
            token: DeleteToken::new(),
            identifiers,
        }
    }

    /// Confirmation prompt text.
    pub fn prompt(&self) -> String {
        if self.identifiers.len() == 1 {
            format!("Delete '{}'? This cannot be undone.", self.identifiers[0])
        } else {
            format!(
                "Delete {} items? This cannot be undone.",
                self.identifiers.len()
            )
        }
    }
}
