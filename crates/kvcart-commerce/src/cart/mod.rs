//! Shopping cart module.
//!
//! Contains types for cart, line items and pricing.

mod cart;
mod pricing;

pub use cart::{Cart, CartItem};
pub use pricing::{CartPricing, LineItemPricing};
