use assets::VideoAsset;
use tracing::info;

use crate::Result;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionReport {
    /// Frames that received a label carried over from a keyframe.
    pub projected: usize,
}

/// Carries labels attached to an asset's keyframes onto the frames between them.
pub trait LabelProjector {
    fn project(&mut self, asset: &VideoAsset) -> Result<ProjectionReport>;
}

/// Stand-in until a label format is chosen; reports nothing projected.
#[derive(Debug, Default, Clone, Copy)]
pub struct PendingProjector;

impl LabelProjector for PendingProjector {
    fn project(&mut self, asset: &VideoAsset) -> Result<ProjectionReport> {
        info!(
            asset = %asset.name(),
            keyframes = asset.keyframes().len(),
            "label projection is not configured"
        );
        Ok(ProjectionReport::default())
    }
}
