//! Shopping cart domain types and a cache-backed cart service.
//!
//! - **Cart**: cart, line items, merge-on-add, quantity adjustment, discounts
//! - **Pricing**: line totals and grand total after discounts
//! - **Service**: load-mutate-save cycle over a [`kvcart_cache::CacheManager`]
//!
//! # Example
//!
//! ```rust,ignore
//! use kvcart_commerce::prelude::*;
//!
//! let mut cart = Cart::new("user123-cart");
//! cart.add_item(CartItem::new("item1", "Widget", 10.0, 2)?)?;
//! cart.set_overall_discount(0.1)?;
//!
//! println!("Total: {:.2}", cart.grand_total());
//! ```

pub mod error;
pub mod ids;

pub mod cart;
pub mod service;

pub use cart::{Cart, CartItem, CartPricing, LineItemPricing};
pub use error::CommerceError;
pub use ids::*;
pub use service::CartService;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::service::CartService;

    // Cart
    pub use crate::cart::{Cart, CartItem, CartPricing, LineItemPricing};
}
