//! # Footage Index
//!
//! Loads per-file duration metadata and concatenates it into a virtual
//! timeline: entry `i` starts where entry `i-1` ends. The timeline is a
//! sampling space only; it is never materialized as media.

pub mod index;
pub mod types;

pub use index::FootageIndex;
pub use types::FootageEntry;
