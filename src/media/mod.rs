//! # Media Collaborators
//!
//! Thin wrappers around the external FFmpeg tool suite. All pixel and
//! sample work happens out-of-process: `probe` drives `ffprobe` to read
//! technical metadata, `ffmpeg` builds and runs encode/cut/concat commands.

pub mod ffmpeg;
pub mod probe;

pub use probe::{Ffprobe, Prober, SourceMetadata};
