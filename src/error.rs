use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the clip-collage library
#[derive(Error, Debug)]
pub enum CollageError {
    #[error("Footage indexing error: {0}")]
    Footage(#[from] FootageError),

    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Media tool error: {0}")]
    Media(#[from] MediaError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Project file error: {0}")]
    Project(#[from] ProjectError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building the footage index.
///
/// All of these are fatal: the run aborts before any artifact is written,
/// so a broken source file never produces a partial index.
#[derive(Error, Debug)]
pub enum FootageError {
    #[error("cannot read media duration from {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("{path} reports a non-positive duration ({duration}s)")]
    EmptyDuration { path: PathBuf, duration: f64 },
}

/// Errors raised by the clip scheduler.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("scheduling infeasible: {reason}")]
    Infeasible { reason: String },
}

/// Errors raised by the probing collaborator (ffprobe).
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("ffprobe binary not found on PATH")]
    ToolMissing,

    #[error("ffprobe failed for {path}: {reason}")]
    Failed { path: PathBuf, reason: String },

    #[error("could not parse ffprobe output for {path}")]
    Malformed { path: PathBuf },
}

/// Errors raised while driving the ffmpeg binary.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("ffmpeg binary not found on PATH")]
    ToolMissing,

    #[error("failed to launch ffmpeg: {0}")]
    Spawn(std::io::Error),

    #[error("ffmpeg exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },
}

/// Errors raised by the render backend.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to cut {path}: {reason}")]
    CutFailed { path: PathBuf, reason: String },

    #[error("failed to assemble batch {index}: {reason}")]
    BatchFailed { index: usize, reason: String },

    #[error("failed to write final output: {reason}")]
    OutputFailed { reason: String },
}

/// Errors raised by the project-file backend.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("failed to write project file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CollageError
pub type Result<T> = std::result::Result<T, CollageError>;

impl CollageError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Footage(FootageError::Unreadable { path, .. }) => {
                format!(
                    "Could not read '{}'. Please check the file exists and is a supported format.",
                    path.display()
                )
            }
            Self::Schedule(ScheduleError::Infeasible { reason }) => {
                format!(
                    "The requested clip layout cannot be satisfied by the given footage: {}. \
                     Try a shorter period or a smaller target length.",
                    reason
                )
            }
            Self::Media(MediaError::ToolMissing) => {
                "ffmpeg was not found on PATH. Please install FFmpeg.".to_string()
            }
            Self::Probe(ProbeError::ToolMissing) => {
                "ffprobe was not found on PATH. Please install FFmpeg.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl ScheduleError {
    pub fn infeasible<S: Into<String>>(reason: S) -> Self {
        Self::Infeasible { reason: reason.into() }
    }
}
