//! Per-screen field configuration for the filter engine.

/// Status assumed for records that carry none.
pub const DEFAULT_STATUS: &str = "active";

/// Which record fields the filter and sort engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Fields searched by the free-text filter
    pub searchable_fields: Vec<String>,
    /// Field holding the record status
    pub status_field: String,
    /// Field holding the record type
    pub type_field: String,
    /// Status a record without one is treated as having
    pub default_status: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            searchable_fields: ["label", "description", "type", "slug"]
                .into_iter()
                .map(String::from)
                .collect(),
            status_field: "status".to_string(),
            type_field: "type".to_string(),
            default_status: DEFAULT_STATUS.to_string(),
        }
    }
}

impl CollectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn searchable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn status_field(mut self, field: impl Into<String>) -> Self {
        self.status_field = field.into();
        self
    }

    pub fn type_field(mut self, field: impl Into<String>) -> Self {
        self.type_field = field.into();
        self
    }

    pub fn default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = status.into();
        self
    }
}
