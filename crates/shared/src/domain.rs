use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Products at or below this quantity are rendered as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Stored and compared verbatim.
    pub password: String,
}

/// A product record as persisted and exported.
///
/// Every field falls back to its default when absent, null or of the wrong
/// type, so hand-edited import files and lists written by older builds still
/// load record by record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "lenient::id")]
    pub id: ProductId,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub qty: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub sku: String,
    /// Milliseconds since the Unix epoch.
    #[serde(deserialize_with = "lenient::whole_number")]
    pub created_at: i64,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.qty <= LOW_STOCK_THRESHOLD
    }

    /// Stock value of this line: price times quantity.
    pub fn value(&self) -> f64 {
        self.price * self.qty as f64
    }
}

/// Field decoders for [`Product`] that never fail on a field value.
mod lenient {
    use serde::{de::IgnoredAny, Deserialize, Deserializer};

    use super::ProductId;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
        Flag(bool),
        Other(IgnoredAny),
    }

    /// Numbers as-is, numeric text parsed, anything else zero. Non-finite
    /// results become zero.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = match Loose::deserialize(deserializer)? {
            Loose::Number(n) => n,
            Loose::Text(text) => text.trim().parse().unwrap_or_default(),
            Loose::Flag(_) | Loose::Other(_) => 0.0,
        };
        Ok(if value.is_finite() { value } else { 0.0 })
    }

    /// Like [`number`], truncated toward zero.
    pub fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        number(deserializer).map(|n| n.trunc() as i64)
    }

    /// Text as-is, numbers and booleans in their plain form, anything else empty.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Loose::deserialize(deserializer)? {
            Loose::Text(text) => text,
            Loose::Number(n) => n.to_string(),
            Loose::Flag(flag) => flag.to_string(),
            Loose::Other(_) => String::new(),
        })
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProductId, D::Error> {
        text(deserializer).map(ProductId)
    }
}

/// Replacement values for the editable fields of a product. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.price.is_none() && self.qty.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAsc,
    CreatedDesc,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    QtyAsc,
    QtyDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::CreatedAsc,
        SortKey::CreatedDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::QtyAsc,
        SortKey::QtyDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAsc => "created_asc",
            Self::CreatedDesc => "created_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::QtyAsc => "qty_asc",
            Self::QtyDesc => "qty_desc",
        }
    }

    /// Parses a sort selector, treating anything unrecognised as "keep order".
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}'")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Anonymous,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    AnonymousLanding,
    Dashboard,
}

/// Aggregates over the whole store, independent of any active filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub count: usize,
    pub total_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_round_trip_through_their_names() {
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>(), Ok(key));
        }
        assert_eq!(SortKey::parse_lenient("bogus"), None);
        assert_eq!(SortKey::parse_lenient(" qty_desc "), Some(SortKey::QtyDesc));
    }

    #[test]
    fn low_stock_threshold_is_inclusive() {
        let mut product = Product {
            qty: 5,
            ..Product::default()
        };
        assert!(product.is_low_stock());
        product.qty = 6;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn product_uses_camel_case_created_at() {
        let product = Product {
            id: ProductId::from("p_1"),
            name: "Widget".into(),
            created_at: 42,
            ..Product::default()
        };
        let json = serde_json::to_value(&product).expect("serialize");
        assert_eq!(json["createdAt"], 42);
        assert_eq!(json["id"], "p_1");
    }

    #[test]
    fn product_fields_of_the_wrong_type_fall_back() {
        let product: Product = serde_json::from_str(
            r#"{"id":7,"name":null,"category":["x"],"price":null,"qty":2.9,"sku":true,"createdAt":"12"}"#,
        )
        .expect("deserialize");
        assert_eq!(product.id.as_str(), "7");
        assert_eq!(product.name, "");
        assert_eq!(product.category, "");
        assert_eq!(product.price, 0.0);
        assert_eq!(product.qty, 2);
        assert_eq!(product.sku, "true");
        assert_eq!(product.created_at, 12);
    }

    #[test]
    fn product_price_accepts_numeric_text() {
        let product: Product =
            serde_json::from_str(r#"{"price":"12.5","qty":-3}"#).expect("deserialize");
        assert_eq!(product.price, 12.5);
        assert_eq!(product.qty, -3);
    }

    #[test]
    fn product_fills_missing_fields_with_defaults() {
        let product: Product =
            serde_json::from_str(r#"{"id":"p_x","name":"Bolt"}"#).expect("deserialize");
        assert_eq!(product.name, "Bolt");
        assert_eq!(product.qty, 0);
        assert_eq!(product.category, "");
    }
}
