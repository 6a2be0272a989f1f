//! # Clip Scheduling Module
//!
//! Turns a footage index and a sampling policy into a reproducible set of
//! non-overlapping clip placements covering a target duration.
//!
//! Two samplers interleave: a shrinking bag guarantees every source file
//! is hit at least once before any repeats, then uniform draws on the
//! virtual timeline take over, which naturally favors longer files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clip_collage::footage::FootageIndex;
//! use clip_collage::schedule::{ClipScheduler, Policy};
//!
//! # fn main() -> anyhow::Result<()> {
//! let index = FootageIndex::from_files(&["a.mp4".into(), "b.mp4".into()])?;
//! let placements = ClipScheduler::new(Policy::new(2.0, 15.0)).schedule(&index)?;
//!
//! println!("Scheduled {} clips", placements.len());
//! # Ok(())
//! # }
//! ```

pub mod scheduler;
pub mod types;

pub use scheduler::ClipScheduler;
pub use types::{ClipPlacement, Policy, Spacing};
