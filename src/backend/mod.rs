//! # Serialization Backends
//!
//! Exactly one backend consumes the scheduler's placement list per run:
//! [`RenderBackend`] realizes it as an encoded video through batched
//! ffmpeg work, [`ProjectBackend`] as a Shotcut-compatible MLT project
//! for further non-destructive editing.

pub mod project;
pub mod render;
pub mod traits;

pub use project::ProjectBackend;
pub use render::RenderBackend;
pub use traits::Backend;
