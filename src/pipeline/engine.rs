use std::path::{Path, PathBuf};

use tracing::info;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::footage::FootageIndex;
use crate::schedule::{ClipScheduler, Policy};

/// Orchestrates one collage run.
///
/// The pipeline has three steps:
/// 1. Footage Indexing - probe durations, build the virtual timeline
/// 2. Clip Scheduling - reproducible random placements under the policy
/// 3. Realization - exactly one backend turns placements into the artifact
///
/// Indexing and scheduling errors surface before the backend writes
/// anything, so a failed run never leaves a partial artifact behind.
pub struct CollageEngine {
    config: Config,
}

impl CollageEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the full pipeline on a list of footage files.
    pub async fn assemble(
        &self,
        files: &[PathBuf],
        policy: &Policy,
        backend: &mut dyn Backend,
        output: &Path,
    ) -> Result<()> {
        self.config.validate()?;

        info!("🎬 Starting collage assembly");
        info!("   Files: {}", files.len());
        info!("   Period: {:.2}s, target length: {:.2}s", policy.period, policy.total_length);
        info!("   Backend: {}", backend.name());

        info!("📼 Step 1: Indexing footage...");
        let footage = FootageIndex::from_files(files)?;
        info!(
            "   ✅ {} files, {:.1}s of footage",
            footage.len(),
            footage.total_duration()
        );

        self.assemble_indexed(&footage, policy, backend, output).await
    }

    /// Run scheduling and realization against a prebuilt index.
    pub async fn assemble_indexed(
        &self,
        footage: &FootageIndex,
        policy: &Policy,
        backend: &mut dyn Backend,
        output: &Path,
    ) -> Result<()> {
        info!("🎲 Step 2: Scheduling clips...");
        let scheduler = ClipScheduler::new(policy.clone());
        let placements = scheduler.schedule(footage)?;
        info!("   ✅ {} clips scheduled", placements.len());

        info!("🎞️  Step 3: Realizing with {} backend...", backend.name());
        backend.realize(&placements, footage, output).await?;

        info!("🎉 Collage complete! Output saved to: {:?}", output);
        Ok(())
    }
}
