use assets::{AssetRepository, VideoAsset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    Auditer, EditorConfig, EditorSession, FrameEditor, InputEvent, KeyframeEditor, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorKind {
    Recorder,
    Keyframes,
    Frames,
    Auditer,
}

impl EditorKind {
    /// Menu order.
    pub const ALL: [EditorKind; 4] = [
        EditorKind::Recorder,
        EditorKind::Keyframes,
        EditorKind::Frames,
        EditorKind::Auditer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorKind::Recorder => "Recorder",
            EditorKind::Keyframes => "Keyframe Editor",
            EditorKind::Frames => "Frame Editor",
            EditorKind::Auditer => "Auditer",
        }
    }

    /// The recorder always writes into `New` and skips the stage step.
    pub fn needs_stage(self) -> bool {
        !matches!(self, EditorKind::Recorder)
    }
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Behaviour plugged into the workbench for one editor kind.
///
/// Strategies never see navigation events; the workbench applies those to
/// the session itself before anything reaches `handle`.
pub trait EditorStrategy {
    fn kind(&self) -> EditorKind;

    /// Help and status lines shown under the shared navigation help.
    fn describe(&self, session: &EditorSession, asset: Option<&VideoAsset>) -> Vec<String>;

    /// Applies one editor-specific event. `asset` is the session's current
    /// asset, `None` when the stage is empty or the asset was just deleted.
    fn handle(
        &mut self,
        event: InputEvent,
        session: &mut EditorSession,
        asset: &mut Option<VideoAsset>,
        repo: &AssetRepository,
    ) -> Result<()>;
}

/// Strategy for an editing kind; `None` for the recorder, which drives its
/// own screen.
pub fn strategy_for(kind: EditorKind, config: &EditorConfig) -> Option<Box<dyn EditorStrategy>> {
    match kind {
        EditorKind::Recorder => None,
        EditorKind::Keyframes => Some(Box::new(KeyframeEditor::new(config.staging_dir()))),
        EditorKind::Frames => Some(Box::new(FrameEditor)),
        EditorKind::Auditer => Some(Box::new(Auditer)),
    }
}
