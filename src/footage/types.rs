use std::path::PathBuf;

/// One source file on the virtual timeline.
///
/// Immutable once the index is built: `start` is the running sum of the
/// durations of all preceding entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FootageEntry {
    /// Offset of this file on the virtual timeline, in seconds
    pub start: f64,

    /// Path to the source file
    pub path: PathBuf,

    /// Duration of the source file, in seconds
    pub duration: f64,
}

impl FootageEntry {
    /// Virtual-timeline position one past this entry's last second
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether a virtual-timeline point falls inside this entry
    pub fn covers(&self, point: f64) -> bool {
        point >= self.start && point < self.end()
    }
}
