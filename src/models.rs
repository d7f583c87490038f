//! Typed records for the marketplace list screens.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Record};

/// Top-level marketplace category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Category type, e.g. "Donation" or "Échange"
    #[serde(rename = "type", default)]
    pub category_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Sub-category scoped to a parent category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    #[serde(alias = "_id")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub sub_category_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "category")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Vendor account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "type", default)]
    pub vendor_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

fn text(value: &Option<String>) -> Option<FieldValue> {
    value.as_ref().map(|s| FieldValue::Text(s.clone()))
}

fn timestamp(value: &Option<Timestamp>) -> Option<FieldValue> {
    value.map(FieldValue::Timestamp)
}

impl Record for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" | "_id" => Some(FieldValue::Text(self.id.clone())),
            "label" => Some(FieldValue::Text(self.label.clone())),
            "slug" => text(&self.slug),
            "description" => text(&self.description),
            "type" => text(&self.category_type),
            "status" => text(&self.status),
            "createdAt" => timestamp(&self.created_at),
            "updatedAt" => timestamp(&self.updated_at),
            _ => None,
        }
    }
}

impl Record for SubCategory {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" | "_id" => Some(FieldValue::Text(self.id.clone())),
            "label" => Some(FieldValue::Text(self.label.clone())),
            "slug" => text(&self.slug),
            "description" => text(&self.description),
            "type" => text(&self.sub_category_type),
            "status" => text(&self.status),
            "categoryId" => text(&self.category_id),
            "createdAt" => timestamp(&self.created_at),
            "updatedAt" => timestamp(&self.updated_at),
            _ => None,
        }
    }
}

impl Record for Vendor {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" | "_id" => Some(FieldValue::Text(self.id.clone())),
            "name" => Some(FieldValue::Text(self.name.clone())),
            "businessName" => text(&self.business_name),
            "email" => text(&self.email),
            "phone" => text(&self.phone),
            "type" => text(&self.vendor_type),
            "status" => text(&self.status),
            "createdAt" => timestamp(&self.created_at),
            "updatedAt" => timestamp(&self.updated_at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_from_mongo_payload() {
        let category: Category = serde_json::from_value(json!({
            "_id": "65f0c2",
            "label": "Donation",
            "slug": "donation",
            "type": "Donation",
            "createdAt": "2024-03-12T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(category.id(), "65f0c2");
        assert_eq!(category.field("type"), Some(FieldValue::Text("Donation".into())));
        assert_eq!(category.field("status"), None);
        assert!(matches!(
            category.field("createdAt"),
            Some(FieldValue::Timestamp(_))
        ));
    }

    #[test]
    fn test_sub_category_parent_alias() {
        let sub: SubCategory = serde_json::from_value(json!({
            "id": "s1",
            "label": "Vêtements",
            "category": "c1",
            "status": "inactive"
        }))
        .unwrap();

        assert_eq!(sub.category_id.as_deref(), Some("c1"));
        assert_eq!(sub.field("status"), Some(FieldValue::Text("inactive".into())));
    }

    #[test]
    fn test_vendor_fields() {
        let vendor: Vendor = serde_json::from_value(json!({
            "_id": "v1",
            "name": "Awa",
            "businessName": "Awa Couture",
            "email": "awa@example.com"
        }))
        .unwrap();

        assert_eq!(
            vendor.field("businessName"),
            Some(FieldValue::Text("Awa Couture".into()))
        );
        assert_eq!(vendor.field("phone"), None);
        assert_eq!(vendor.field("unknown"), None);
    }
}
