//! Lookup primitives over dictionary entries.

/// Filter clause evaluation against a single entry.
pub mod filter;

pub use filter::matches_filter;
