use assets::{AssetRepository, VideoAsset};
use tracing::info;

use crate::{EditorKind, EditorSession, EditorStrategy, InputEvent, Result};

/// Cuts frames off either end of a clip, or splits it in two.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameEditor;

impl EditorStrategy for FrameEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Frames
    }

    fn describe(&self, _session: &EditorSession, _asset: Option<&VideoAsset>) -> Vec<String> {
        vec![
            "D:    delete previous frames".to_string(),
            "F:    delete future frames".to_string(),
            "S:    split future frames into a new video".to_string(),
        ]
    }

    fn handle(
        &mut self,
        event: InputEvent,
        session: &mut EditorSession,
        asset: &mut Option<VideoAsset>,
        repo: &AssetRepository,
    ) -> Result<()> {
        let Some(asset) = asset.as_mut() else {
            return Ok(());
        };
        let index = session.frame_index();
        match event {
            InputEvent::TrimBefore => {
                asset.trim_before(index)?;
                session.reload_frames(asset.frame_count()?);
            }
            InputEvent::TrimAfter => {
                asset.trim_after(index)?;
                session.reload_frames(asset.frame_count()?);
            }
            InputEvent::Split => {
                let tail = asset.split(repo, index)?;
                info!(asset = %asset.name(), tail = %tail.name(), at = index, "split clip");
                session.reload_assets(repo)?;
                session.select_asset(asset.name());
                session.reload_frames(asset.frame_count()?);
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::{DataLayout, Stage};
    use image::DynamicImage;
    use tempfile::tempdir;

    #[test]
    fn test_trim_uses_current_frame() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        let created = VideoAsset::create(&repo, Stage::New).unwrap();
        for i in 0..8 {
            created.frames().append(&DynamicImage::new_rgb8(i + 1, 1)).unwrap();
        }
        let mut asset = Some(created);
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();
        session.reload_frames(8);
        for _ in 0..3 {
            session.next_frame();
        }

        FrameEditor
            .handle(InputEvent::TrimBefore, &mut session, &mut asset, &repo)
            .unwrap();
        assert_eq!(session.frame_index(), 0);
        assert_eq!(session.frame_count(), 5);

        session.next_frame();
        FrameEditor
            .handle(InputEvent::TrimAfter, &mut session, &mut asset, &repo)
            .unwrap();
        let asset = asset.unwrap();
        assert_eq!(asset.frame_count().unwrap(), 2);
        assert_eq!(asset.frames().read(0).unwrap().width(), 4);
        assert_eq!(asset.frames().read(1).unwrap().width(), 5);
    }

    #[test]
    fn test_no_asset_is_a_no_op() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();

        FrameEditor
            .handle(InputEvent::Split, &mut session, &mut None, &repo)
            .unwrap();
        assert!(repo.list(Stage::New).unwrap().is_empty());
    }
}
