//! Cart and line item types.

use crate::cart::{CartPricing, LineItemPricing};
use crate::error::CommerceError;
use crate::ids::{CartId, ItemId};
use serde::{Deserialize, Serialize};

/// A shopping cart.
///
/// Serialized as `{"id", "items", "overallDiscount"}`; `overall_discount` is
/// accepted as an alias when reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Cart identifier, also the cache key.
    pub id: CartId,
    /// Items in insertion order. Item IDs are unique.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Discount applied to the whole cart, as a fraction.
    #[serde(
        default,
        rename = "overallDiscount",
        alias = "overall_discount"
    )]
    pub overall_discount: f64,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(id: impl Into<CartId>) -> Self {
        Self {
            id: id.into(),
            items: Vec::new(),
            overall_discount: 0.0,
        }
    }

    /// Add an item to the cart.
    ///
    /// If an item with the same ID is already present its quantity grows by
    /// the incoming quantity; otherwise the item is appended. Returns an
    /// error if the item is invalid or the merged quantity would overflow.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CommerceError> {
        item.validate()?;

        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| CommerceError::Overflow(item.id.to_string()))?;
            return Ok(());
        }

        self.items.push(item);
        Ok(())
    }

    /// Remove an item from the cart.
    ///
    /// Returns whether an item was removed.
    pub fn remove_item(&mut self, item_id: &ItemId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.id != item_id);
        self.items.len() < len_before
    }

    /// Increase an item's quantity by one.
    ///
    /// Returns `Ok(false)` if the item isn't in the cart.
    pub fn increment_quantity(&mut self, item_id: &ItemId) -> Result<bool, CommerceError> {
        match self.items.iter_mut().find(|i| &i.id == item_id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(1)
                    .ok_or_else(|| CommerceError::Overflow(item_id.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Decrease an item's quantity by one, removing it when it reaches zero.
    ///
    /// Returns `false` if the item isn't in the cart.
    pub fn decrement_quantity(&mut self, item_id: &ItemId) -> bool {
        let Some(pos) = self.items.iter().position(|i| &i.id == item_id) else {
            return false;
        };
        let item = &mut self.items[pos];
        item.quantity = item.quantity.saturating_sub(1);
        if item.quantity == 0 {
            self.items.remove(pos);
        }
        true
    }

    /// Set the discount applied to the whole cart.
    pub fn set_overall_discount(&mut self, discount: f64) -> Result<(), CommerceError> {
        validate_discount(discount)?;
        self.overall_discount = discount;
        Ok(())
    }

    /// Clear all items and the overall discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.overall_discount = 0.0;
    }

    /// Restore item invariants on a cart read from storage.
    ///
    /// Drops zero-quantity items and folds duplicate IDs into the first
    /// occurrence, keeping insertion order. Quantities saturate at
    /// `u32::MAX`. Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.items.len();
        let mut merged: Vec<CartItem> = Vec::with_capacity(before);
        let mut changed = false;

        for item in self.items.drain(..) {
            if item.quantity == 0 {
                changed = true;
                continue;
            }
            match merged.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    changed = true;
                }
                None => merged.push(item),
            }
        }

        self.items = merged;
        changed
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Get number of unique items.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by ID.
    pub fn get_item(&self, item_id: &ItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }

    /// Sum of line totals after the overall discount.
    pub fn grand_total(&self) -> f64 {
        let lines = sum(self.items.iter().map(CartItem::line_total));
        lines * (1.0 - self.overall_discount)
    }

    /// Calculate the pricing breakdown.
    pub fn calculate_pricing(&self) -> CartPricing {
        let line_items: Vec<LineItemPricing> = self
            .items
            .iter()
            .map(|item| {
                let subtotal = item.subtotal();
                let total = item.line_total();
                LineItemPricing {
                    item_id: item.id.clone(),
                    unit_price: item.price,
                    quantity: item.quantity,
                    subtotal,
                    discount_amount: subtotal - total,
                    total,
                }
            })
            .collect();

        let subtotal = sum(line_items.iter().map(|l| l.subtotal));
        let item_discount_total = sum(line_items.iter().map(|l| l.discount_amount));
        let grand_total = self.grand_total();

        CartPricing {
            subtotal,
            item_discount_total,
            overall_discount: self.overall_discount,
            discount_total: subtotal - grand_total,
            grand_total,
            line_items,
        }
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Identifier, unique within a cart.
    pub id: ItemId,
    /// Product title (denormalized for display).
    pub title: String,
    /// Unit price.
    pub price: f64,
    /// Quantity, at least 1 while in a cart.
    pub quantity: u32,
    /// Per-item discount, as a fraction.
    #[serde(default)]
    pub discount: f64,
}

impl CartItem {
    /// Create a new line item without a discount.
    pub fn new(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Result<Self, CommerceError> {
        let item = Self {
            id: id.into(),
            title: title.into(),
            price,
            quantity,
            discount: 0.0,
        };
        item.validate()?;
        Ok(item)
    }

    /// Set the per-item discount.
    pub fn with_discount(mut self, discount: f64) -> Result<Self, CommerceError> {
        validate_discount(discount)?;
        self.discount = discount;
        Ok(self)
    }

    /// Check quantity, price and discount.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.quantity == 0 {
            return Err(CommerceError::InvalidQuantity(self.quantity));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CommerceError::InvalidPrice(self.price));
        }
        validate_discount(self.discount)
    }

    /// Price times quantity, before discount.
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// Price times quantity, after the item discount.
    pub fn line_total(&self) -> f64 {
        self.subtotal() * (1.0 - self.discount)
    }
}

/// Sum starting from `+0.0`; `Iterator::sum` yields `-0.0` when empty.
fn sum(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, x| acc + x)
}

fn validate_discount(discount: f64) -> Result<(), CommerceError> {
    if (0.0..=1.0).contains(&discount) {
        Ok(())
    } else {
        Err(CommerceError::InvalidDiscount(discount))
    }
}
