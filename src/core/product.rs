//! Product catalog.
//!
//! The marketplace catalog is a plain in-memory list that ships with the
//! market store snapshot. Cart, comparison and wishlist operations reference
//! products from here by id.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A marketplace product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Seller identifier, used by the single-vendor cart rule
    pub vendor_id: String,
    /// Category identifier, used by the comparison rule
    pub category_id: String,
    /// Units available
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Builds a product after checking the name, vendor, category and price.
    ///
    /// # Errors
    /// Returns an error if any identifier is empty or the price is not positive.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        vendor_id: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Result<Self> {
        let product = Self {
            id: id.into(),
            name: name.into(),
            price,
            vendor_id: vendor_id.into(),
            category_id: category_id.into(),
            stock: 0,
        };

        if product.id.trim().is_empty() {
            return Err(Error::MissingField { field: "id" });
        }
        if product.name.trim().is_empty() {
            return Err(Error::MissingField { field: "name" });
        }
        if product.vendor_id.trim().is_empty() {
            return Err(Error::MissingField { field: "vendor_id" });
        }
        if product.category_id.trim().is_empty() {
            return Err(Error::MissingField {
                field: "category_id",
            });
        }
        if price <= Decimal::ZERO {
            return Err(Error::InvalidAmount { amount: price });
        }

        Ok(product)
    }

    /// Sets the stock level.
    #[must_use]
    pub const fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }
}

/// The set of products offered in the marketplace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a catalog from a list of products.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The catalog a fresh session starts with.
    #[must_use]
    pub fn demo() -> Self {
        let entries = [
            ("phone-a", "Tecno Spark 20", 11_500, "v1", "phones", 12),
            ("phone-b", "Samsung Galaxy A15", 16_900, "v1", "phones", 8),
            ("phone-c", "Infinix Hot 40", 13_200, "v2", "phones", 5),
            ("phone-d", "Xiaomi Redmi 13C", 12_800, "v2", "phones", 0),
            ("case-a", "Silicone phone case", 350, "v1", "accessories", 40),
            ("sneaker-a", "Running sneakers", 2_400, "v3", "shoes", 15),
            ("sneaker-b", "Canvas sneakers", 1_650, "v3", "shoes", 22),
        ];
        let products = entries
            .into_iter()
            .map(|(id, name, price, vendor_id, category_id, stock)| Product {
                id: id.to_string(),
                name: name.to_string(),
                price: Decimal::from(price),
                vendor_id: vendor_id.to_string(),
                category_id: category_id.to_string(),
                stock,
            })
            .collect();
        Self { products }
    }

    /// All products, in insertion order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Adds a product or replaces the one with the same id.
    pub fn upsert(&mut self, product: Product) {
        if let Some(existing) = self.products.iter_mut().find(|p| p.id == product.id) {
            debug!(id = %product.id, "Replacing catalog product");
            *existing = product;
        } else {
            debug!(id = %product.id, "Adding catalog product");
            self.products.push(product);
        }
    }

    /// Finds a product by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Finds a product by id, failing with [`Error::NotFound`] if absent.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if no product has this id.
    pub fn require(&self, id: &str) -> Result<&Product> {
        self.get(id).ok_or_else(|| Error::NotFound {
            entity: "product",
            id: id.to_string(),
        })
    }

    /// Products sold by one vendor.
    pub fn by_vendor<'a>(&'a self, vendor_id: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| p.vendor_id == vendor_id)
    }

    /// Products in one category.
    pub fn by_category<'a>(&'a self, category_id: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |p| p.category_id == category_id)
    }

    /// Case-insensitive substring search on product names.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }
}
