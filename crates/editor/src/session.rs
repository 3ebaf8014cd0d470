use assets::{AssetRepository, Stage};
use tracing::debug;

use crate::Result;

/// Cursor over the assets of one stage and the frames of the current asset.
///
/// `asset_index` is always a valid index into `assets` (or 0 when there are
/// none) and `frame_index` stays below `frame_count` (or 0 when empty).
#[derive(Debug, Clone)]
pub struct EditorSession {
    stage: Stage,
    assets: Vec<String>,
    asset_index: usize,
    frame_index: usize,
    frame_count: usize,
    paused: bool,
}

impl EditorSession {
    pub fn open(repo: &AssetRepository, stage: Stage) -> Result<Self> {
        let mut session = Self {
            stage,
            assets: Vec::new(),
            asset_index: 0,
            frame_index: 0,
            frame_count: 0,
            paused: false,
        };
        session.reload_assets(repo)?;
        Ok(session)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn asset_index(&self) -> usize {
        self.asset_index
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_asset(&self) -> Option<&str> {
        self.assets.get(self.asset_index).map(String::as_str)
    }

    /// Re-reads the stage listing. The asset index is clamped into the new
    /// list and playback restarts at frame 0.
    pub fn reload_assets(&mut self, repo: &AssetRepository) -> Result<()> {
        self.assets = repo.list(self.stage)?;
        self.asset_index = self.asset_index.min(self.assets.len().saturating_sub(1));
        self.frame_index = 0;
        debug!(stage = %self.stage, assets = self.assets.len(), "reloaded asset list");
        Ok(())
    }

    /// Points the cursor at `name` if it is listed.
    pub fn select_asset(&mut self, name: &str) -> bool {
        match self.assets.iter().position(|a| a == name) {
            Some(index) => {
                if index != self.asset_index {
                    self.asset_index = index;
                    self.frame_index = 0;
                }
                true
            }
            None => false,
        }
    }

    /// The current asset's frames changed on disk; restart at frame 0.
    pub fn reload_frames(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.frame_index = 0;
    }

    /// Updates the frame count without restarting playback.
    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.frame_index = self.frame_index.min(frame_count.saturating_sub(1));
    }

    /// Browses another stage from its first asset; the frame count stays 0
    /// until that asset is loaded.
    pub fn set_stage(&mut self, repo: &AssetRepository, stage: Stage) -> Result<()> {
        self.stage = stage;
        self.asset_index = 0;
        self.frame_count = 0;
        self.reload_assets(repo)
    }

    pub fn previous_asset(&mut self) {
        if self.asset_index > 0 {
            self.asset_index -= 1;
            self.frame_index = 0;
        }
    }

    pub fn next_asset(&mut self) {
        if self.asset_index + 1 < self.assets.len() {
            self.asset_index += 1;
            self.frame_index = 0;
        }
    }

    /// Steps one frame back and pauses playback.
    pub fn previous_frame(&mut self) {
        self.frame_index = self.frame_index.saturating_sub(1);
        self.paused = true;
    }

    /// Steps one frame forward and pauses playback.
    pub fn next_frame(&mut self) {
        if self.frame_index + 1 < self.frame_count {
            self.frame_index += 1;
        }
        self.paused = true;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Back to frame 0, playing.
    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.paused = false;
    }

    /// One playback tick: advances a frame unless paused, holding on the last.
    pub fn advance(&mut self) {
        if !self.paused && self.frame_index + 1 < self.frame_count {
            self.frame_index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::DataLayout;
    use std::fs;
    use tempfile::tempdir;

    fn repo_with(names: &[&str]) -> (tempfile::TempDir, AssetRepository) {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        for name in names {
            fs::create_dir(repo.layout().asset_dir(Stage::New, name)).unwrap();
        }
        (tmp, repo)
    }

    #[test]
    fn test_asset_cursor_is_clamped() {
        let (_tmp, repo) = repo_with(&["a", "b"]);
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();

        session.previous_asset();
        assert_eq!(session.current_asset(), Some("a"));
        session.next_asset();
        session.next_asset();
        assert_eq!(session.current_asset(), Some("b"));
    }

    #[test]
    fn test_reload_clamps_after_removal() {
        let (_tmp, repo) = repo_with(&["a", "b", "c"]);
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();
        session.next_asset();
        session.next_asset();

        fs::remove_dir(repo.layout().asset_dir(Stage::New, "c")).unwrap();
        session.reload_assets(&repo).unwrap();

        assert_eq!(session.current_asset(), Some("b"));
    }

    #[test]
    fn test_set_stage_relists_from_the_start() {
        let (_tmp, repo) = repo_with(&["a", "b"]);
        fs::create_dir(repo.layout().asset_dir(Stage::Verified, "v1")).unwrap();
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();
        session.next_asset();
        session.reload_frames(5);
        session.next_frame();

        fs::create_dir(repo.layout().asset_dir(Stage::Verified, "v2")).unwrap();
        session.set_stage(&repo, Stage::Verified).unwrap();

        assert_eq!(session.stage(), Stage::Verified);
        assert_eq!(session.assets(), ["v1", "v2"]);
        assert_eq!(session.asset_index(), 0);
        assert_eq!(session.frame_index(), 0);
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.current_asset(), Some("v1"));
    }

    #[test]
    fn test_empty_stage() {
        let (_tmp, repo) = repo_with(&[]);
        let mut session = EditorSession::open(&repo, Stage::Verified).unwrap();

        session.next_asset();
        session.advance();
        assert_eq!(session.current_asset(), None);
        assert_eq!(session.asset_index(), 0);
        assert_eq!(session.frame_index(), 0);
    }

    #[test]
    fn test_playback_holds_on_last_frame() {
        let (_tmp, repo) = repo_with(&["a"]);
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();
        session.reload_frames(3);

        for _ in 0..5 {
            session.advance();
        }
        assert_eq!(session.frame_index(), 2);

        session.previous_frame();
        assert!(session.is_paused());
        session.advance();
        assert_eq!(session.frame_index(), 1);

        session.reset();
        assert!(!session.is_paused());
        assert_eq!(session.frame_index(), 0);
    }

    #[test]
    fn test_frame_count_shrink_clamps_cursor() {
        let (_tmp, repo) = repo_with(&["a"]);
        let mut session = EditorSession::open(&repo, Stage::New).unwrap();
        session.reload_frames(10);
        for _ in 0..8 {
            session.next_frame();
        }

        session.set_frame_count(4);
        assert_eq!(session.frame_index(), 3);
    }
}
