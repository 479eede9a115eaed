//! Core types for sift.

mod filter;

pub use filter::{split_terms, Filter, FilterRecord, FilterRule};
