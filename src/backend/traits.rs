use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::footage::FootageIndex;
use crate::schedule::ClipPlacement;

/// A sink for one run's placement list.
///
/// Implementations consume the ordered placements, the footage they
/// reference, and a destination path, and produce the final artifact.
/// An empty placement list is valid input and must yield a minimal
/// artifact, not an error.
#[async_trait]
pub trait Backend: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Realize the placement list into the output artifact
    async fn realize(
        &mut self,
        placements: &[ClipPlacement],
        footage: &FootageIndex,
        output: &Path,
    ) -> Result<()>;
}
