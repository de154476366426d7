//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in cart operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Discount outside `0.0..=1.0`.
    #[error("Invalid discount: {0} (expected a fraction between 0 and 1)")]
    InvalidDiscount(f64),

    /// Negative or non-finite price.
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    /// Arithmetic overflow.
    #[error("Quantity overflow for item {0}")]
    Overflow(String),

    /// Cache error.
    #[error("Cache error: {0}")]
    Cache(#[from] kvcart_cache::CacheError),
}

impl CommerceError {
    /// Whether the error was caused by caller input rather than the backend.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Cache(_))
    }
}
