//! Listing domain model.
//!
//! A listing is one marketplace template record. Records live in the document
//! store as camelCase JSON objects keyed by a store-generated id; the id is
//! not part of the stored object.

use super::price::Price;
use crate::error::{Result, TemplrError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Moderation status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    /// Records written before moderation existed carry no status and are
    /// treated as approved.
    #[default]
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
        }
    }

    /// Whether moderation may move a listing from `self` to `next`.
    ///
    /// `pending -> approved` and `pending -> rejected` are the only moves.
    /// Re-applying the current status is allowed and changes nothing.
    pub fn can_transition_to(&self, next: ListingStatus) -> bool {
        *self == next || matches!(self, ListingStatus::Pending)
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed set of listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "SaaS")]
    Saas,
    #[serde(rename = "E-commerce")]
    ECommerce,
    Portfolio,
    #[serde(rename = "UI Kit")]
    UiKit,
    Dashboard,
    Community,
    Blog,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Saas,
        Category::ECommerce,
        Category::Portfolio,
        Category::UiKit,
        Category::Dashboard,
        Category::Community,
        Category::Blog,
    ];

    /// Label as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Saas => "SaaS",
            Category::ECommerce => "E-commerce",
            Category::Portfolio => "Portfolio",
            Category::UiKit => "UI Kit",
            Category::Dashboard => "Dashboard",
            Category::Community => "Community",
            Category::Blog => "Blog",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TemplrError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TemplrError::validation(format!("Unknown category '{}'", s)))
    }
}

/// Counters are stored as JSON numbers that other clients may have written as
/// floats, negatives or nulls. All of them read back as a non-negative count.
fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 }))
            .unwrap_or(0),
        _ => 0,
    })
}

fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0))
}

/// One marketplace template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Store-assigned key. Not part of the stored record.
    #[serde(skip)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub image_url: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub likes: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub views: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub sales: u64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub earnings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Creation time in milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Listing {
    /// Decodes a stored record and attaches its key.
    pub fn from_record(id: impl Into<String>, record: &Value) -> Result<Self> {
        let mut listing: Listing = serde_json::from_value(record.clone())?;
        listing.id = id.into();
        Ok(listing)
    }

    /// Encodes the listing as a stored record (without the id).
    pub fn to_record(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Input for creating a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub category: Option<Category>,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    /// Uploaded asset URL or external link
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

impl NewListing {
    /// Rejects input without a title or category.
    pub fn validate(&self) -> Result<Category> {
        if self.title.trim().is_empty() {
            return Err(TemplrError::validation("Listing title is required"));
        }
        self.category
            .ok_or_else(|| TemplrError::validation("Listing category is required"))
    }
}

/// Partial update merged onto an existing record. Unset fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings: Option<f64>,
}

impl ListingPatch {
    pub fn likes(count: u64) -> Self {
        Self {
            likes: Some(count),
            ..Default::default()
        }
    }

    pub fn views(count: u64) -> Self {
        Self {
            views: Some(count),
            ..Default::default()
        }
    }

    pub fn status(status: ListingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// The set fields as a JSON object ready for a shallow merge.
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(TemplrError::Serialization {
                format: "JSON".to_string(),
                message: format!("patch serialized to non-object: {}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "title": "SaaS Landing Page",
            "author": "PixelPerfect",
            "imageUrl": "https://picsum.photos/seed/template2/600/400",
            "category": "SaaS",
            "description": "Clean and modern landing page.",
            "price": "Free",
            "status": "approved",
            "likes": 2100,
            "views": 42000,
            "sales": 0,
            "earnings": 0,
            "fileUrl": "https://ui.shadcn.com/"
        })
    }

    #[test]
    fn test_from_record_attaches_id() {
        let listing = Listing::from_record("-Nabc", &record()).unwrap();
        assert_eq!(listing.id, "-Nabc");
        assert_eq!(listing.category, Category::Saas);
        assert_eq!(listing.likes, 2100);
        assert!(listing.price.is_free());
        assert_eq!(listing.file_url.as_deref(), Some("https://ui.shadcn.com/"));
    }

    #[test]
    fn test_record_omits_id() {
        let listing = Listing::from_record("-Nabc", &record()).unwrap();
        let value = listing.to_record().unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["imageUrl"], "https://picsum.photos/seed/template2/600/400");
    }

    #[test]
    fn test_counters_never_negative() {
        let mut raw = record();
        raw["likes"] = json!(-3);
        raw["views"] = json!(12.7);
        raw["sales"] = Value::Null;
        let listing = Listing::from_record("k", &raw).unwrap();
        assert_eq!(listing.likes, 0);
        assert_eq!(listing.views, 12);
        assert_eq!(listing.sales, 0);
    }

    #[test]
    fn test_missing_status_reads_as_approved() {
        let mut raw = record();
        raw.as_object_mut().unwrap().remove("status");
        let listing = Listing::from_record("k", &raw).unwrap();
        assert_eq!(listing.status, ListingStatus::Approved);
    }

    #[test]
    fn test_status_transitions() {
        use ListingStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("ui kit".parse::<Category>().unwrap(), Category::UiKit);
        assert_eq!("E-commerce".parse::<Category>().unwrap(), Category::ECommerce);
        assert!("Games".parse::<Category>().unwrap_err().is_validation());
    }

    #[test]
    fn test_new_listing_validation() {
        let mut input = NewListing {
            title: "Landing".into(),
            category: Some(Category::Saas),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap(), Category::Saas);

        input.category = None;
        assert!(input.validate().unwrap_err().is_validation());

        input.category = Some(Category::Blog);
        input.title = "  ".into();
        assert!(input.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let fields = ListingPatch::likes(4).to_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["likes"], 4);

        let fields = ListingPatch::status(ListingStatus::Approved)
            .to_fields()
            .unwrap();
        assert_eq!(fields["status"], "approved");
        assert!(ListingPatch::default().to_fields().unwrap().is_empty());
    }
}
