//! Client-side collection handling for list screens.
//!
//! Data flows loader → filter/sort → pagination → visible rows. The
//! selection is keyed by identifier and sits beside that pipeline; bulk
//! actions read it, call the mutator per item, then reload.

pub mod bulk;
pub mod config;
pub mod controller;
pub mod filter;
pub mod loader;
pub mod notice;
pub mod pagination;
pub mod selection;

pub use bulk::{
    BulkAction, BulkFailure, BulkOperationResult, BulkOptions, DeleteToken, PendingDelete,
    run_bulk_action,
};
pub use config::{CollectionConfig, DEFAULT_STATUS};
pub use controller::{CollectionController, ControllerOptions, PagingMode, RowView, ViewSnapshot};
pub use filter::{FilterState, SortDirection, SortSpec, ValueFilter, apply};
pub use loader::{LoadedPage, ResponseShape, classify, load, normalize};
pub use notice::{Notice, NoticeLevel};
pub use pagination::{
    DEFAULT_PAGE_SIZE, PaginationState, ServerPagination, reconcile, visible_slice,
};
pub use selection::{PageSelection, Selection};
