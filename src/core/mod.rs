//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod quote;
pub mod source;

// Re-export main types for cleaner imports
pub use quote::{FiatQuoteSet, MarketSnapshot, PriceQuote, Quote};
pub use source::{FetchError, FiatSource, QuoteSource};
