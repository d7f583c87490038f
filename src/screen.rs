//! The list screens the back-office exposes.
//!
//! Each screen knows its list field in the backend response, which record
//! fields its filters read, and which bulk actions it offers.

use serde::Serialize;

use crate::collection::{BulkAction, CollectionConfig};
use crate::error::{BackofficeError, Result};

/// Longest parent identifier accepted in a navigation context.
const MAX_PARENT_ID_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenKind {
    Categories,
    SubCategories,
    VendorsActive,
    VendorsBlocked,
}

crate::enum_display_fromstr!(
    ScreenKind,
    BackofficeError::InvalidScreen,
    {
        Categories => "categories",
        SubCategories => "sub-categories",
        VendorsActive => "vendors-active",
        VendorsBlocked => "vendors-blocked",
    }
);

impl ScreenKind {
    pub const ALL: [ScreenKind; 4] = [
        ScreenKind::Categories,
        ScreenKind::SubCategories,
        ScreenKind::VendorsActive,
        ScreenKind::VendorsBlocked,
    ];

    /// Screens whose list is scoped to a parent record.
    pub fn needs_parent(self) -> bool {
        matches!(self, ScreenKind::SubCategories)
    }
}

/// A list screen plus its navigation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screen {
    pub kind: ScreenKind,
    /// Parent identifier for parent-scoped screens (the category of a
    /// sub-category list).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Screen {
    pub fn new(kind: ScreenKind) -> Self {
        Self { kind, parent: None }
    }

    pub fn categories() -> Self {
        Self::new(ScreenKind::Categories)
    }

    pub fn sub_categories(category_id: impl Into<String>) -> Self {
        Self {
            kind: ScreenKind::SubCategories,
            parent: Some(category_id.into()),
        }
    }

    pub fn vendors_active() -> Self {
        Self::new(ScreenKind::VendorsActive)
    }

    pub fn vendors_blocked() -> Self {
        Self::new(ScreenKind::VendorsBlocked)
    }

    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }

    /// Check the navigation context before any request goes out.
    ///
    /// Returns the parent identifier for parent-scoped screens.
    pub fn validate_context(&self) -> Result<Option<&str>> {
        if !self.kind.needs_parent() {
            return Ok(None);
        }

        let parent = self.parent.as_deref().map(str::trim).unwrap_or_default();
        if parent.is_empty() {
            return Err(BackofficeError::NavigationContext(format!(
                "the {} screen needs a parent category",
                self.kind
            )));
        }
        if parent.len() > MAX_PARENT_ID_LEN
            || !parent
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BackofficeError::NavigationContext(format!(
                "'{parent}' is not a valid category identifier"
            )));
        }
        Ok(Some(parent))
    }

    /// Key holding the item array in the backend's named-list responses.
    pub fn list_field(&self) -> &'static str {
        match self.kind {
            ScreenKind::Categories => "categories",
            ScreenKind::SubCategories => "subCategories",
            ScreenKind::VendorsActive | ScreenKind::VendorsBlocked => "vendors",
        }
    }

    pub fn collection_config(&self) -> CollectionConfig {
        match self.kind {
            ScreenKind::Categories | ScreenKind::SubCategories => CollectionConfig::default(),
            ScreenKind::VendorsActive | ScreenKind::VendorsBlocked => CollectionConfig::new()
                .searchable_fields(["name", "businessName", "email", "phone", "type"]),
        }
    }

    pub fn allowed_actions(&self) -> &'static [BulkAction] {
        match self.kind {
            ScreenKind::Categories | ScreenKind::SubCategories => &[
                BulkAction::Activate,
                BulkAction::Deactivate,
                BulkAction::Delete,
            ],
            ScreenKind::VendorsActive => &[BulkAction::Block, BulkAction::Delete],
            ScreenKind::VendorsBlocked => &[BulkAction::Unblock, BulkAction::Delete],
        }
    }

    pub fn allows(&self, action: BulkAction) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Fail with `ActionNotAllowed` unless the screen offers `action`.
    pub fn ensure_allows(&self, action: BulkAction) -> Result<()> {
        if self.allows(action) {
            Ok(())
        } else {
            Err(BackofficeError::ActionNotAllowed {
                action: action.to_string(),
                screen: self.kind.to_string(),
            })
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.parent {
            Some(parent) if self.kind.needs_parent() => write!(f, "{} ({parent})", self.kind),
            _ => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_kind_parse() {
        assert_eq!(
            "Vendors-Blocked".parse::<ScreenKind>().unwrap(),
            ScreenKind::VendorsBlocked
        );
        assert!(matches!(
            "orders".parse::<ScreenKind>(),
            Err(BackofficeError::InvalidScreen(_))
        ));
    }

    #[test]
    fn test_sub_categories_need_a_parent() {
        let screen = Screen::new(ScreenKind::SubCategories);
        let err = screen.validate_context().unwrap_err();
        assert!(err.is_blocking());

        let screen = Screen::sub_categories("   ");
        assert!(screen.validate_context().is_err());

        let screen = Screen::sub_categories("64b7f0c2e1");
        assert_eq!(screen.validate_context().unwrap(), Some("64b7f0c2e1"));
    }

    #[test]
    fn test_malformed_parent_is_rejected() {
        let too_long = "x".repeat(65);
        for bad in ["../etc", "a b", "cat/1", too_long.as_str()] {
            let screen = Screen::sub_categories(bad);
            assert!(
                matches!(
                    screen.validate_context(),
                    Err(BackofficeError::NavigationContext(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_unscoped_screens_ignore_parent() {
        let screen = Screen::vendors_active().with_parent(Some("ignored".into()));
        assert_eq!(screen.validate_context().unwrap(), None);
        assert_eq!(screen.to_string(), "vendors-active");
    }

    #[test]
    fn test_allowed_actions() {
        assert!(Screen::vendors_active().allows(BulkAction::Block));
        assert!(!Screen::vendors_active().allows(BulkAction::Unblock));
        assert!(Screen::vendors_blocked().allows(BulkAction::Unblock));
        assert!(Screen::categories().allows(BulkAction::Deactivate));

        let err = Screen::categories()
            .ensure_allows(BulkAction::Block)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "action 'block' is not available on the categories screen"
        );
    }

    #[test]
    fn test_vendor_search_fields() {
        let config = Screen::vendors_blocked().collection_config();
        assert!(config.searchable_fields.contains(&"businessName".to_string()));
        assert_eq!(Screen::sub_categories("c1").list_field(), "subCategories");
    }
}
