//! # Project-File Backend
//!
//! Serializes a placement list as a Shotcut-compatible MLT project:
//! a reference bin with one producer per source file, a background track
//! sized to the timeline, a main track holding the scheduled clips, and
//! the two compositing transitions the editor expects. The result opens
//! in the editor for further non-destructive work instead of rendering.

pub mod document;
pub mod timecode;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::backend::traits::Backend;
use crate::error::{ProjectError, Result};
use crate::footage::FootageIndex;
use crate::media::{Ffprobe, Prober, SourceMetadata};
use crate::schedule::ClipPlacement;

use self::document::SourceRef;

/// Run-scoped, per-path metadata memo.
///
/// Files referenced by many placements are probed exactly once; failed
/// probes are memoized too, so a broken file costs one external process
/// per run, not one per reference.
struct MetadataCache {
    prober: Box<dyn Prober + Send>,
    entries: HashMap<PathBuf, SourceMetadata>,
}

impl MetadataCache {
    fn new(prober: Box<dyn Prober + Send>) -> Self {
        Self { prober, entries: HashMap::new() }
    }

    /// Metadata for a path, probing on first sight and substituting
    /// placeholder values when the probe fails. Probe failure is not
    /// fatal here: the project file is still useful with defaults.
    fn get(&mut self, path: &Path) -> SourceMetadata {
        if let Some(meta) = self.entries.get(path) {
            return meta.clone();
        }

        let meta = match self.prober.probe(path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(
                    "could not probe {}: {}; substituting default metadata",
                    path.display(),
                    e
                );
                SourceMetadata::fallback()
            }
        };

        self.entries.insert(path.to_path_buf(), meta.clone());
        meta
    }
}

/// Realizes placements as an MLT project document.
pub struct ProjectBackend {
    cache: MetadataCache,
}

impl ProjectBackend {
    /// Backend probing through ffprobe
    pub fn new() -> Self {
        Self::with_prober(Box::new(Ffprobe::new()))
    }

    /// Backend with a caller-supplied prober
    pub fn with_prober(prober: Box<dyn Prober + Send>) -> Self {
        Self { cache: MetadataCache::new(prober) }
    }

    /// Resolve each unique source file, in footage order, to a producer
    /// entry with its metadata.
    fn resolve_sources(&mut self, footage: &FootageIndex) -> Vec<SourceRef> {
        let mut seen: Vec<PathBuf> = Vec::new();
        let mut sources = Vec::new();

        for entry in footage.entries() {
            if seen.contains(&entry.path) {
                continue;
            }
            seen.push(entry.path.clone());

            let mut meta = self.cache.get(&entry.path);
            if meta.duration <= 0.0 {
                // The index already measured this file; prefer its value
                // over a placeholder zero.
                meta.duration = entry.duration;
            }
            sources.push(SourceRef { path: entry.path.clone(), meta });
        }

        sources
    }
}

impl Default for ProjectBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for ProjectBackend {
    fn name(&self) -> &str {
        "project"
    }

    async fn realize(
        &mut self,
        placements: &[ClipPlacement],
        footage: &FootageIndex,
        output: &Path,
    ) -> Result<()> {
        let sources = self.resolve_sources(footage);
        let doc = document::render_document(placements, &sources);

        tokio::fs::write(output, doc).await.map_err(|e| ProjectError::WriteFailed {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!(
            "wrote {} ({} producers, {} clips)",
            output.display(),
            sources.len(),
            placements.len()
        );
        Ok(())
    }
}
