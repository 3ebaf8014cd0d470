use assets::{AssetError, AssetRepository, Stage, VideoAsset};
use tracing::info;

use crate::{EditorKind, EditorSession, EditorStrategy, InputEvent, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
}

/// Applies a review verdict to the asset in `slot`, per its current stage:
///
/// | stage    | approve       | reject        |
/// |----------|---------------|---------------|
/// | new      | to verified   | delete        |
/// | verified | to labelled   | back to new   |
/// | labelled | refused       | refused       |
///
/// A rejected `New` asset is deleted and `slot` left empty.
pub fn apply_verdict(slot: &mut Option<VideoAsset>, verdict: Verdict) -> Result<(), AssetError> {
    let Some(from) = slot.as_ref().map(VideoAsset::stage) else {
        return Ok(());
    };
    let target = match (from, verdict) {
        (Stage::New, Verdict::Approve) => Stage::Verified,
        (Stage::New, Verdict::Reject) => {
            if let Some(asset) = slot.take() {
                asset.delete()?;
            }
            return Ok(());
        }
        // TODO: refuse until every keyframe is uploaded and its labels projected
        (Stage::Verified, Verdict::Approve) => Stage::Labelled,
        (Stage::Verified, Verdict::Reject) => Stage::New,
        // no outgoing edge; the move below is refused and reported
        (Stage::Labelled, Verdict::Approve) => Stage::Labelled,
        (Stage::Labelled, Verdict::Reject) => Stage::Verified,
    };
    if let Some(asset) = slot.as_mut() {
        asset.move_to_stage(target)?;
        info!(asset = %asset.name(), ?verdict, from = %from, to = %target, "audited asset");
    }
    Ok(())
}

/// Moves clips between stages, or discards them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Auditer;

impl EditorStrategy for Auditer {
    fn kind(&self) -> EditorKind {
        EditorKind::Auditer
    }

    fn describe(&self, session: &EditorSession, _asset: Option<&VideoAsset>) -> Vec<String> {
        let lines: &[&str] = match session.stage() {
            Stage::New => &["A:    move video to 'Verified'", "D:    delete"],
            Stage::Verified => &["A:    move video to 'Labelled'", "D:    move back to 'New'"],
            Stage::Labelled => &["Labelled videos are final"],
        };
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn handle(
        &mut self,
        event: InputEvent,
        session: &mut EditorSession,
        asset: &mut Option<VideoAsset>,
        repo: &AssetRepository,
    ) -> Result<()> {
        let verdict = match event {
            InputEvent::Approve => Verdict::Approve,
            InputEvent::Reject => Verdict::Reject,
            _ => return Ok(()),
        };
        let outcome = apply_verdict(asset, verdict);
        session.reload_assets(repo)?;
        Ok(outcome?)
    }
}
