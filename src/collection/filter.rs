//! Client-side filtering and sorting for list screens
//!
//! Filters run in a fixed order (text, status, type) followed by a single-key
//! stable sort. [`apply`] is pure: the same items and filter always give the
//! same output, and applying a filter twice changes nothing.

use std::cmp::Ordering;

use serde::Serialize;
use unicase::UniCase;

use super::config::CollectionConfig;
use crate::error::BackofficeError;
use crate::record::{FieldValue, Record};

/// Sort direction for the single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

crate::enum_display_fromstr!(
    SortDirection,
    BackofficeError::InvalidSortDirection,
    {
        Ascending => "asc",
        Descending => "desc",
    }
);

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

/// Status or type filter: everything, or one exact value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "value")]
pub enum ValueFilter {
    #[default]
    All,
    Only(String),
}

impl ValueFilter {
    /// "all" (any case) and blank input mean no filtering.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            ValueFilter::All
        } else {
            ValueFilter::Only(value.to_string())
        }
    }
}

/// Complete filter state for one list screen
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterState {
    pub search_text: String,
    pub status_filter: ValueFilter,
    pub type_filter: ValueFilter,
    pub sort: Option<SortSpec>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_status(mut self, status: ValueFilter) -> Self {
        self.status_filter = status;
        self
    }

    pub fn with_type(mut self, type_filter: ValueFilter) -> Self {
        self.type_filter = type_filter;
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            key: key.into(),
            direction,
        });
        self
    }

    /// Sort by `key`. Repeating the current key flips the direction; a new
    /// key starts ascending.
    pub fn request_sort(&mut self, key: &str) {
        self.sort = match self.sort.take() {
            Some(spec) if spec.key == key => Some(SortSpec {
                key: spec.key,
                direction: spec.direction.toggle(),
            }),
            _ => Some(SortSpec {
                key: key.to_string(),
                direction: SortDirection::Ascending,
            }),
        };
    }
}

/// Filter then sort `items`. Returns a new list; the input is untouched.
pub fn apply<T: Record + Clone>(
    items: &[T],
    filter: &FilterState,
    config: &CollectionConfig,
) -> Vec<T> {
    let needle = filter.search_text.trim().to_lowercase();

    let mut filtered: Vec<T> = items
        .iter()
        .filter(|item| matches_text(*item, &needle, config))
        .filter(|item| matches_status(*item, &filter.status_filter, config))
        .filter(|item| matches_type(*item, &filter.type_filter, config))
        .cloned()
        .collect();

    if let Some(spec) = &filter.sort {
        sort_items(&mut filtered, spec);
    }

    filtered
}

fn matches_text<T: Record>(item: &T, needle: &str, config: &CollectionConfig) -> bool {
    if needle.is_empty() {
        return true;
    }
    config.searchable_fields.iter().any(|field| {
        item.field(field)
            .is_some_and(|value| value.as_text().to_lowercase().contains(needle))
    })
}

fn matches_status<T: Record>(item: &T, filter: &ValueFilter, config: &CollectionConfig) -> bool {
    let ValueFilter::Only(wanted) = filter else {
        return true;
    };
    match item.field(&config.status_field) {
        Some(value) => value.as_text() == wanted.as_str(),
        None => config.default_status == *wanted,
    }
}

fn matches_type<T: Record>(item: &T, filter: &ValueFilter, config: &CollectionConfig) -> bool {
    let ValueFilter::Only(wanted) = filter else {
        return true;
    };
    item.field(&config.type_field)
        .is_some_and(|value| UniCase::new(&*value.as_text()) == UniCase::new(wanted.as_str()))
}

/// Order two optional sort keys. Missing values go last in both directions.
pub fn compare_keys(
    a: Option<&FieldValue>,
    b: Option<&FieldValue>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.compare(b),
            SortDirection::Descending => b.compare(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable single-key sort in place.
pub fn sort_items<T: Record>(items: &mut Vec<T>, spec: &SortSpec) {
    // Extract each key once instead of on every comparison
    let mut keyed: Vec<(Option<FieldValue>, T)> = items
        .drain(..)
        .map(|item| (item.field(&spec.key), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), spec.direction));

    items.extend(keyed.into_iter().map(|(_, item)| item));
}
