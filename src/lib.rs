//! # Clip-Collage
//!
//! Assemble randomized highlight collages from raw footage, synchronized
//! to a soundtrack, as either a rendered video or a Shotcut project file.
//!
//! Given a pile of source files and a cut period (typically derived from
//! the soundtrack's tempo by an external tool), the scheduler picks
//! reproducible, non-overlapping clips across all the footage and hands
//! them to one of two backends: a batched ffmpeg render pipeline, or an
//! MLT project writer for further non-destructive editing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clip_collage::{
//!     backend::ProjectBackend,
//!     config::Config,
//!     pipeline::CollageEngine,
//!     schedule::Policy,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = CollageEngine::new(Config::default());
//! let policy = Policy::new(2.0, 30.0).with_seed("amaze me");
//! let mut backend = ProjectBackend::new();
//!
//! engine
//!     .assemble(
//!         &["beach.mp4".into(), "surf.mp4".into()],
//!         &policy,
//!         &mut backend,
//!         "collage.mlt".as_ref(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`footage`] - duration probing and the virtual timeline
//! - [`schedule`] - the reproducible clip-selection scheduler
//! - [`backend`] - render and project-file serialization backends
//! - [`media`] - ffmpeg/ffprobe collaborators
//! - [`pipeline`] - the engine wiring one run together
//! - [`config`] - configuration management

pub mod backend;
pub mod config;
pub mod error;
pub mod footage;
pub mod media;
pub mod pipeline;
pub mod schedule;

// Re-export commonly used types for convenience
pub use crate::{
    backend::{Backend, ProjectBackend, RenderBackend},
    config::Config,
    error::{CollageError, Result},
    footage::FootageIndex,
    pipeline::CollageEngine,
    schedule::{ClipPlacement, ClipScheduler, Policy},
};
