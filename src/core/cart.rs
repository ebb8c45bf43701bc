//! Shopping cart, comparison list and wishlist rules.
//!
//! A cart only ever holds products from one vendor; adding a product from a
//! different vendor is rejected and the cart is left as it was. The caller can
//! resolve the conflict with [`Cart::replace`], which swaps the whole cart for
//! the new item in one step.
//!
//! A comparison list holds at most [`COMPARE_LIMIT`] products, all from the
//! same category.

use crate::core::product::Product;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Maximum number of products in a comparison.
pub const COMPARE_LIMIT: usize = 3;

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product snapshot taken when it was added
    pub product: Product,
    /// Units ordered, always at least one
    pub quantity: u32,
}

impl CartItem {
    /// Price of the line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .price
            .saturating_mul(Decimal::from(self.quantity))
    }
}

/// Single-vendor shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Lines in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// True when the cart holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Vendor of the current items, if any.
    #[must_use]
    pub fn vendor(&self) -> Option<&str> {
        self.items.first().map(|item| item.product.vendor_id.as_str())
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Total number of units.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Adds `quantity` units of a product.
    ///
    /// Quantities merge into an existing line for the same product id.
    ///
    /// # Errors
    /// * `Error::InvalidAmount` if `quantity` is zero
    /// * `Error::VendorConflict` if the cart holds another vendor's products
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidAmount {
                amount: Decimal::ZERO,
            });
        }

        if let Some(cart_vendor) = self.vendor()
            && cart_vendor != product.vendor_id
        {
            warn!(
                cart_vendor,
                product_vendor = %product.vendor_id,
                "Add to cart rejected: vendor conflict"
            );
            return Err(Error::VendorConflict {
                cart_vendor: cart_vendor.to_string(),
                product_vendor: product.vendor_id.clone(),
            });
        }

        if let Some(line) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            debug!(product = %product.id, quantity = line.quantity, "Cart line merged");
        } else {
            self.items.push(CartItem {
                product: product.clone(),
                quantity,
            });
            debug!(product = %product.id, quantity, "Cart line added");
        }
        Ok(())
    }

    /// Empties the cart and inserts the given product, used to resolve a vendor conflict.
    ///
    /// # Errors
    /// Returns `Error::InvalidAmount` if `quantity` is zero; the cart is not changed.
    pub fn replace(&mut self, product: &Product, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidAmount {
                amount: Decimal::ZERO,
            });
        }
        self.items = vec![CartItem {
            product: product.clone(),
            quantity,
        }];
        info!(product = %product.id, vendor = %product.vendor_id, "Cart replaced");
        Ok(())
    }

    /// Removes a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != product_id);
        before != self.items.len()
    }

    /// Sets the quantity of a line; zero removes it.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            if self.remove(product_id) {
                return Ok(());
            }
        } else if let Some(line) = self.items.iter_mut().find(|i| i.product.id == product_id) {
            line.quantity = quantity;
            return Ok(());
        }
        Err(Error::NotFound {
            entity: "cart item",
            id: product_id.to_string(),
        })
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Products being compared side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareList {
    items: Vec<Product>,
}

impl CompareList {
    /// Products in the comparison.
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Category shared by the current items, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.items.first().map(|p| p.category_id.as_str())
    }

    /// Adds a product. Adding a product that is already present is a no-op.
    ///
    /// # Errors
    /// * `Error::CompareFull` when the list already holds [`COMPARE_LIMIT`] items
    /// * `Error::CategoryMismatch` when the category differs from the current items
    pub fn add(&mut self, product: &Product) -> Result<()> {
        if self.items.len() >= COMPARE_LIMIT {
            return Err(Error::CompareFull {
                limit: COMPARE_LIMIT,
            });
        }
        if let Some(category) = self.category()
            && category != product.category_id
        {
            return Err(Error::CategoryMismatch {
                expected: category.to_string(),
                found: product.category_id.clone(),
            });
        }
        if !self.items.iter().any(|p| p.id == product.id) {
            self.items.push(product.clone());
        }
        Ok(())
    }

    /// Removes a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id != product_id);
        before != self.items.len()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Saved product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    product_ids: Vec<String>,
}

impl Wishlist {
    /// Adds the product if absent, removes it if present. Returns whether it is now saved.
    pub fn toggle(&mut self, product_id: &str) -> bool {
        if let Some(pos) = self.product_ids.iter().position(|id| id == product_id) {
            self.product_ids.remove(pos);
            false
        } else {
            self.product_ids.push(product_id.to_string());
            true
        }
    }

    /// Whether the product is saved.
    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|id| id == product_id)
    }

    /// Saved ids in the order they were added.
    #[must_use]
    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }
}
