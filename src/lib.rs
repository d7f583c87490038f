pub mod cli;
pub mod collection;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod macros;
pub mod models;
pub mod record;
pub mod remote;
pub mod screen;

#[cfg(test)]
mod test_guards;

pub use collection::{
    BulkAction, BulkOperationResult, CollectionConfig, CollectionController, ControllerOptions,
    DeleteToken, FilterState, PageSelection, PaginationState, PagingMode, ValueFilter,
    ViewSnapshot,
};
pub use config::Config;
pub use error::{BackofficeError, Result};
pub use models::{Category, SubCategory, Vendor};
pub use record::{FieldValue, JsonItem, Record};
pub use remote::{HttpBackend, HttpMutator, ItemMutator, PageSource};
pub use screen::{Screen, ScreenKind};
