use std::cmp::Ordering;

use serde_json::Value;
use shared::{
    domain::{Product, ProductId, ProductPatch, SortKey, Totals},
    error::{InventoryError, InventoryResult},
};
use storage::KvStore;
use tracing::{debug, info, warn};

use crate::{ids::IdGenerator, now_millis};

/// The product list, kept in memory in insertion order and mirrored in full
/// to one key of the backing store after every mutation.
///
/// A mutation builds the next list, writes it, and only then swaps it in, so
/// a failed write leaves memory matching what was last persisted.
pub struct ProductStore<S> {
    store: S,
    key: String,
    products: Vec<Product>,
    ids: IdGenerator,
}

impl<S: KvStore> ProductStore<S> {
    /// Reads the persisted list. Absent or unreadable data yields an empty
    /// store; unreadable data is discarded on the next mutation.
    pub async fn load(store: S, key: impl Into<String>) -> InventoryResult<Self> {
        Self::load_with_ids(store, key, IdGenerator::new()).await
    }

    pub async fn load_with_ids(
        store: S,
        key: impl Into<String>,
        ids: IdGenerator,
    ) -> InventoryResult<Self> {
        let mut this = Self {
            store,
            key: key.into(),
            products: Vec::new(),
            ids,
        };
        this.reload().await?;
        Ok(this)
    }

    pub async fn reload(&mut self) -> InventoryResult<()> {
        self.products = match self.store.get(&self.key).await? {
            None => Vec::new(),
            Some(raw) => match parse_product_list(raw.as_bytes()) {
                Ok(products) => products,
                Err(reason) => {
                    warn!(key = %self.key, %reason, "discarding unreadable product list");
                    Vec::new()
                }
            },
        };
        debug!(count = self.products.len(), "loaded products");
        Ok(())
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub async fn create(
        &mut self,
        name: &str,
        category: &str,
        price: f64,
        qty: i64,
    ) -> InventoryResult<Product> {
        let name = required_name(name)?;
        let price = finite_price(price)?;
        let created_at = now_millis();
        let product = Product {
            id: self.ids.product_id(created_at, &self.products),
            name: name.to_string(),
            category: category.trim().to_string(),
            price,
            qty,
            sku: self.ids.sku(name),
            created_at,
        };

        let mut next = self.products.clone();
        next.push(product.clone());
        self.commit(next).await?;
        info!(product_id = %product.id, sku = %product.sku, "created product");
        Ok(product)
    }

    /// Replaces the supplied fields. `id`, `sku` and `created_at` never change.
    pub async fn update(&mut self, id: &ProductId, patch: ProductPatch) -> InventoryResult<Product> {
        let Some(index) = self.products.iter().position(|p| &p.id == id) else {
            return Err(not_found(id));
        };
        let name = patch.name.as_deref().map(required_name).transpose()?;
        let price = patch.price.map(finite_price).transpose()?;

        let mut next = self.products.clone();
        let product = &mut next[index];
        if let Some(name) = name {
            product.name = name.to_string();
        }
        if let Some(category) = patch.category {
            product.category = category.trim().to_string();
        }
        if let Some(price) = price {
            product.price = price;
        }
        if let Some(qty) = patch.qty {
            product.qty = qty;
        }
        let updated = product.clone();

        self.commit(next).await?;
        info!(product_id = %id, "updated product");
        Ok(updated)
    }

    pub async fn remove(&mut self, id: &ProductId) -> InventoryResult<()> {
        if self.get(id).is_none() {
            return Err(not_found(id));
        }
        let next = self
            .products
            .iter()
            .filter(|p| &p.id != id)
            .cloned()
            .collect();
        self.commit(next).await?;
        info!(product_id = %id, "removed product");
        Ok(())
    }

    pub async fn clear_all(&mut self) -> InventoryResult<()> {
        let removed = self.products.len();
        self.commit(Vec::new()).await?;
        info!(removed, "cleared all products");
        Ok(())
    }

    /// Filtered and sorted projection of the list. An empty query keeps every
    /// product; `None` keeps the filtered order.
    pub fn list_view(&self, query: &str, sort: Option<SortKey>) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        let mut view: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .collect();

        if let Some(key) = sort {
            view.sort_by(|a, b| compare(key, a, b));
        }
        debug!(query = %needle, sort = ?sort, rows = view.len(), "projected product view");
        view
    }

    /// Count and stock value over every product, ignoring any filter.
    pub fn aggregate(&self) -> Totals {
        Totals {
            count: self.products.len(),
            total_value: self.products.iter().map(Product::value).sum(),
        }
    }

    /// Replaces the whole list with the products in `raw`, a JSON array.
    /// Returns the number of imported products.
    pub async fn import_replace_all(&mut self, raw: &[u8]) -> InventoryResult<usize> {
        let products = parse_product_list(raw).map_err(|reason| {
            warn!(%reason, "rejected product import");
            InventoryError::Import { reason }
        })?;
        let count = products.len();
        self.commit(products).await?;
        info!(count, "imported products");
        Ok(count)
    }

    /// Pretty-printed JSON array of every product.
    pub fn export_snapshot(&self) -> InventoryResult<Vec<u8>> {
        if self.products.is_empty() {
            return Err(InventoryError::EmptyStore);
        }
        serde_json::to_vec_pretty(&self.products)
            .map_err(|err| InventoryError::Storage(anyhow::Error::new(err)))
    }

    async fn commit(&mut self, next: Vec<Product>) -> InventoryResult<()> {
        let raw = serde_json::to_string(&next)
            .map_err(|err| InventoryError::Storage(anyhow::Error::new(err)))?;
        self.store.set(&self.key, &raw).await?;
        self.products = next;
        Ok(())
    }
}

/// Parses a JSON array of product records. Fields that are missing or of the
/// wrong type take defaults and entries that are not objects are skipped;
/// only a payload that is not an array is refused.
pub fn parse_product_list(raw: &[u8]) -> Result<Vec<Product>, String> {
    let value: Value = serde_json::from_slice(raw).map_err(|err| err.to_string())?;
    let Value::Array(items) = value else {
        return Err(format!("expected a JSON array, found {}", json_kind(&value)));
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let kind = json_kind(&item);
            match serde_json::from_value::<Product>(item) {
                Ok(product) => Some(product),
                Err(err) => {
                    warn!(index, kind, error = %err, "skipping product record");
                    None
                }
            }
        })
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn required_name(name: &str) -> InventoryResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InventoryError::Validation("Product name required".into()));
    }
    Ok(name)
}

fn finite_price(price: f64) -> InventoryResult<f64> {
    if !price.is_finite() {
        return Err(InventoryError::Validation("Price must be a number".into()));
    }
    Ok(price)
}

fn not_found(id: &ProductId) -> InventoryError {
    InventoryError::NotFound { id: id.0.clone() }
}

fn compare(key: SortKey, a: &Product, b: &Product) -> Ordering {
    match key {
        SortKey::CreatedAsc => a.created_at.cmp(&b.created_at),
        SortKey::CreatedDesc => b.created_at.cmp(&a.created_at),
        SortKey::NameAsc => compare_names(&a.name, &b.name),
        SortKey::NameDesc => compare_names(&b.name, &a.name),
        SortKey::PriceAsc => a.price.total_cmp(&b.price),
        SortKey::PriceDesc => b.price.total_cmp(&a.price),
        SortKey::QtyAsc => a.qty.cmp(&b.qty),
        SortKey::QtyDesc => b.qty.cmp(&a.qty),
    }
}

/// Orders names ignoring case and common Latin diacritics first, then accents,
/// then case with the lowercase form first.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .cmp(b.chars().flat_map(char::to_lowercase).map(strip_accent));
    folded
        .then_with(|| {
            a.chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
        })
        .then_with(|| b.cmp(a))
}

fn strip_accent(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ì'..='ï' | 'ī' | 'į' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' => 's',
        'ť' => 't',
        'ù'..='ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
#[path = "tests/products_tests.rs"]
mod tests;
