use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FootageError, ProbeError, Result};
use crate::footage::types::FootageEntry;
use crate::media::probe;

/// Ordered footage entries plus the derived virtual-timeline length.
///
/// Building the index opens each file only long enough to read its
/// duration (one ffprobe process at a time), so an arbitrarily large
/// footage list never exhausts file handles or decoder slots.
#[derive(Debug, Clone, Default)]
pub struct FootageIndex {
    entries: Vec<FootageEntry>,
}

impl FootageIndex {
    /// Build the index by probing each file with ffprobe.
    ///
    /// Any unreadable file or non-positive duration aborts the build;
    /// there is no such thing as a partial index.
    pub fn from_files(paths: &[PathBuf]) -> Result<Self> {
        Self::build(paths, |path| probe::probe_duration(path))
    }

    /// Build the index with a caller-supplied duration reader.
    pub fn build<F>(paths: &[PathBuf], mut read_duration: F) -> Result<Self>
    where
        F: FnMut(&Path) -> std::result::Result<f64, ProbeError>,
    {
        let mut entries = Vec::with_capacity(paths.len());
        let mut offset = 0.0;

        for path in paths {
            let duration = read_duration(path).map_err(|e| FootageError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?;

            if duration <= 0.0 {
                return Err(FootageError::EmptyDuration { path: path.clone(), duration }.into());
            }

            debug!("indexed {} at +{:.2}s ({:.2}s long)", path.display(), offset, duration);

            entries.push(FootageEntry { start: offset, path: path.clone(), duration });
            offset += duration;
        }

        Ok(Self { entries })
    }

    /// All entries in input order
    pub fn entries(&self) -> &[FootageEntry] {
        &self.entries
    }

    /// Total virtual-timeline length in seconds
    pub fn total_duration(&self) -> f64 {
        self.entries.last().map(|e| e.end()).unwrap_or(0.0)
    }

    /// Shortest entry duration, if any entries exist
    pub fn min_duration(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|e| e.duration)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Resolve a virtual-timeline point to the entry covering it: the
    /// entry with the greatest `start <= point`.
    pub fn entry_at(&self, point: f64) -> Option<&FootageEntry> {
        if point < 0.0 {
            return None;
        }
        let idx = self.entries.partition_point(|e| e.start <= point);
        self.entries.get(idx.wrapping_sub(1))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollageError;

    fn index_of(durations: &[f64]) -> FootageIndex {
        let paths: Vec<PathBuf> =
            (0..durations.len()).map(|i| PathBuf::from(format!("clip{i}.mp4"))).collect();
        let mut remaining = durations.to_vec();
        FootageIndex::build(&paths, |_| Ok(remaining.remove(0))).unwrap()
    }

    #[test]
    fn test_offsets_are_running_sums() {
        let index = index_of(&[10.0, 5.0, 2.5]);

        let starts: Vec<f64> = index.entries().iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![0.0, 10.0, 15.0]);
        assert_eq!(index.total_duration(), 17.5);
    }

    #[test]
    fn test_zero_duration_is_fatal() {
        let paths = vec![PathBuf::from("good.mp4"), PathBuf::from("bad.mp4")];
        let mut durations = vec![10.0, 0.0];

        let result = FootageIndex::build(&paths, |_| Ok(durations.remove(0)));
        assert!(matches!(
            result,
            Err(CollageError::Footage(FootageError::EmptyDuration { .. }))
        ));
    }

    #[test]
    fn test_probe_failure_is_fatal() {
        let paths = vec![PathBuf::from("missing.mp4")];

        let result = FootageIndex::build(&paths, |path| {
            Err(ProbeError::Failed { path: path.to_path_buf(), reason: "no such file".into() })
        });
        assert!(matches!(
            result,
            Err(CollageError::Footage(FootageError::Unreadable { .. }))
        ));
    }

    #[test]
    fn test_entry_at_resolves_covering_entry() {
        let index = index_of(&[10.0, 5.0]);

        assert_eq!(index.entry_at(0.0).unwrap().path, PathBuf::from("clip0.mp4"));
        assert_eq!(index.entry_at(9.99).unwrap().path, PathBuf::from("clip0.mp4"));
        assert_eq!(index.entry_at(10.0).unwrap().path, PathBuf::from("clip1.mp4"));
        assert_eq!(index.entry_at(14.9).unwrap().path, PathBuf::from("clip1.mp4"));
        assert!(index.entry_at(-1.0).is_none());
    }

    #[test]
    fn test_empty_index() {
        let index = FootageIndex::build(&[], |_| Ok(1.0)).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.total_duration(), 0.0);
        assert!(index.min_duration().is_none());
        assert!(index.entry_at(0.0).is_none());
    }
}
