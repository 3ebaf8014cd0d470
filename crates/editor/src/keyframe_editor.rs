use assets::{AssetRepository, Stage, VideoAsset};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::{
    prepare_upload, EditorKind, EditorSession, EditorStrategy, InputEvent, LabelProjector,
    PendingProjector, Result,
};

/// Marks frames as keyframes and exports them for external labelling.
pub struct KeyframeEditor {
    staging_dir: PathBuf,
    projector: Box<dyn LabelProjector>,
}

impl KeyframeEditor {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            projector: Box::new(PendingProjector),
        }
    }

    pub fn with_projector(mut self, projector: Box<dyn LabelProjector>) -> Self {
        self.projector = projector;
        self
    }
}

impl EditorStrategy for KeyframeEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Keyframes
    }

    fn describe(&self, session: &EditorSession, asset: Option<&VideoAsset>) -> Vec<String> {
        let is_keyframe = asset.is_some_and(|a| a.keyframes().contains(session.frame_index()));
        let listed: Vec<String> = asset
            .map(|a| a.keyframes().keyframes().iter().map(|k| (k + 1).to_string()).collect())
            .unwrap_or_default();

        let mut lines = vec![
            "| -------------------------- |".to_string(),
            format!(
                "Current frame {} a keyframe",
                if is_keyframe { "is" } else { "not" }
            ),
            "| -------------------------- |".to_string(),
            String::new(),
            "A:    add current frame as keyframe".to_string(),
            "D:    delete current keyframe".to_string(),
        ];
        if session.stage() == Stage::Verified {
            lines.push("U:    prepare keyframes for upload".to_string());
        }
        lines.push("L:    project labels from labelled keyframes".to_string());
        lines.push(String::new());
        lines.push("Current keyframes:".to_string());
        lines.push(format!("[{}]", listed.join(", ")));
        lines
    }

    fn handle(
        &mut self,
        event: InputEvent,
        session: &mut EditorSession,
        asset: &mut Option<VideoAsset>,
        repo: &AssetRepository,
    ) -> Result<()> {
        match event {
            InputEvent::AddCurrent | InputEvent::RemoveCurrent if session.frame_count() == 0 => {
                debug!(asset = ?session.current_asset(), "no frame under the cursor");
            }
            InputEvent::AddCurrent => {
                if let Some(asset) = asset.as_mut() {
                    if asset.add_keyframe(session.frame_index())? {
                        debug!(asset = %asset.name(), frame = session.frame_index(), "added keyframe");
                    }
                }
            }
            InputEvent::RemoveCurrent => {
                if let Some(asset) = asset.as_mut() {
                    if asset.remove_keyframe(session.frame_index())? {
                        debug!(asset = %asset.name(), frame = session.frame_index(), "removed keyframe");
                    }
                }
            }
            InputEvent::PrepareUpload => {
                if session.stage() != Stage::Verified {
                    debug!(stage = %session.stage(), "upload is only prepared from verified");
                    return Ok(());
                }
                let report = prepare_upload(repo, &self.staging_dir)?;
                // the export rewrote uploaded records through other handles
                if let Some(asset) = asset.as_mut() {
                    asset.reload_keyframes()?;
                }
                info!(files = report.copied.len(), "upload batch ready");
            }
            InputEvent::ProjectLabels => {
                if let Some(asset) = asset.as_ref() {
                    let report = self.projector.project(asset)?;
                    debug!(asset = %asset.name(), projected = report.projected, "projected labels");
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectionReport;
    use assets::DataLayout;
    use image::DynamicImage;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::tempdir;

    struct CountingProjector(Rc<Cell<usize>>);

    impl LabelProjector for CountingProjector {
        fn project(&mut self, _asset: &VideoAsset) -> Result<ProjectionReport> {
            self.0.set(self.0.get() + 1);
            Ok(ProjectionReport { projected: 3 })
        }
    }

    fn setup(stage: Stage) -> (tempfile::TempDir, AssetRepository, EditorSession, Option<VideoAsset>) {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path().join("data"))).unwrap();
        let asset = VideoAsset::create(&repo, stage).unwrap();
        for i in 0..5 {
            asset.frames().append(&DynamicImage::new_rgb8(i + 1, 1)).unwrap();
        }
        let mut session = EditorSession::open(&repo, stage).unwrap();
        session.reload_frames(5);
        (tmp, repo, session, Some(asset))
    }

    #[test]
    fn test_add_and_remove_current_frame() {
        let (tmp, repo, mut session, mut asset) = setup(Stage::New);
        let mut editor = KeyframeEditor::new(tmp.path().join("to_upload"));
        session.next_frame();
        session.next_frame();

        editor.handle(InputEvent::AddCurrent, &mut session, &mut asset, &repo).unwrap();
        let lines = editor.describe(&session, asset.as_ref());
        assert!(lines.contains(&"Current frame is a keyframe".to_string()));
        assert!(lines.contains(&"[3]".to_string()));

        editor.handle(InputEvent::RemoveCurrent, &mut session, &mut asset, &repo).unwrap();
        assert!(asset.as_ref().unwrap().keyframes().is_empty());
    }

    #[test]
    fn test_frame_actions_ignored_on_empty_asset() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path().join("data"))).unwrap();
        let mut asset = Some(VideoAsset::create(&repo, Stage::New).unwrap());
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();
        session.reload_frames(0);
        let mut editor = KeyframeEditor::new(tmp.path().join("to_upload"));

        editor.handle(InputEvent::AddCurrent, &mut session, &mut asset, &repo).unwrap();
        editor.handle(InputEvent::RemoveCurrent, &mut session, &mut asset, &repo).unwrap();

        assert!(asset.as_ref().unwrap().keyframes().is_empty());
        assert!(editor
            .describe(&session, asset.as_ref())
            .contains(&"[]".to_string()));
    }

    #[test]
    fn test_upload_ignored_outside_verified() {
        let (tmp, repo, mut session, mut asset) = setup(Stage::New);
        let staging = tmp.path().join("to_upload");
        let mut editor = KeyframeEditor::new(&staging);
        editor.handle(InputEvent::AddCurrent, &mut session, &mut asset, &repo).unwrap();

        editor.handle(InputEvent::PrepareUpload, &mut session, &mut asset, &repo).unwrap();

        assert!(!staging.exists());
        assert!(!editor
            .describe(&session, asset.as_ref())
            .iter()
            .any(|l| l.starts_with("U:")));
    }

    #[test]
    fn test_upload_refreshes_loaded_asset() {
        let (tmp, repo, mut session, mut asset) = setup(Stage::Verified);
        let mut editor = KeyframeEditor::new(tmp.path().join("to_upload"));
        editor.handle(InputEvent::AddCurrent, &mut session, &mut asset, &repo).unwrap();

        editor.handle(InputEvent::PrepareUpload, &mut session, &mut asset, &repo).unwrap();

        assert!(asset.as_ref().unwrap().keyframes().uploaded().contains(&0));
    }

    #[test]
    fn test_project_labels_uses_projector() {
        let (tmp, repo, mut session, mut asset) = setup(Stage::Verified);
        let calls = Rc::new(Cell::new(0));
        let mut editor = KeyframeEditor::new(tmp.path().join("to_upload"))
            .with_projector(Box::new(CountingProjector(calls.clone())));

        editor.handle(InputEvent::ProjectLabels, &mut session, &mut asset, &repo).unwrap();

        assert_eq!(calls.get(), 1);
    }
}
