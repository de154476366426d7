//! Cart pricing calculations.

use crate::ids::ItemId;
use serde::{Deserialize, Serialize};

/// Complete pricing breakdown for a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartPricing {
    /// Sum of price times quantity, before any discount.
    pub subtotal: f64,
    /// Amount taken off by per-item discounts.
    pub item_discount_total: f64,
    /// Overall discount fraction applied after item discounts.
    pub overall_discount: f64,
    /// Total amount taken off (subtotal - grand_total).
    pub discount_total: f64,
    /// Final total.
    pub grand_total: f64,
    /// Per-line-item pricing breakdown.
    pub line_items: Vec<LineItemPricing>,
}

impl CartPricing {
    /// Check if any discounts are applied.
    pub fn has_discounts(&self) -> bool {
        self.discount_total > 0.0
    }

    /// Get discount percentage of subtotal.
    pub fn discount_percentage(&self) -> f64 {
        if self.subtotal == 0.0 {
            return 0.0;
        }
        (self.discount_total / self.subtotal) * 100.0
    }
}

/// Pricing breakdown for a single line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemPricing {
    /// Line item ID.
    pub item_id: ItemId,
    /// Unit price.
    pub unit_price: f64,
    /// Quantity.
    pub quantity: u32,
    /// Subtotal (unit_price * quantity).
    pub subtotal: f64,
    /// Discount applied to this item.
    pub discount_amount: f64,
    /// Final total for this item.
    pub total: f64,
}
