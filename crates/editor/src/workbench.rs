use assets::{AssetError, AssetRepository, Stage, VideoAsset};
use tracing::{debug, warn};

use crate::{
    EditorError, EditorSession, EditorStrategy, Flow, InputEvent, KeyMode, Result, Screen, View,
};

/// One editing session: a strategy, the session cursor it works on and the
/// asset under the cursor.
pub struct Workbench {
    repo: AssetRepository,
    session: EditorSession,
    strategy: Box<dyn EditorStrategy>,
    asset: Option<VideoAsset>,
    status: Option<String>,
}

impl Workbench {
    pub fn open(
        repo: AssetRepository,
        stage: Stage,
        strategy: Box<dyn EditorStrategy>,
    ) -> Result<Self> {
        let session = EditorSession::open(&repo, stage)?;
        let mut bench = Self {
            repo,
            session,
            strategy,
            asset: None,
            status: None,
        };
        bench.sync()?;
        Ok(bench)
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn asset(&self) -> Option<&VideoAsset> {
        self.asset.as_ref()
    }

    /// Message of the last failed action, until the next action succeeds.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// One tick: apply the event, advance playback, then re-align the loaded
    /// asset with the session cursor.
    pub fn handle(&mut self, event: Option<InputEvent>) -> Flow {
        match event {
            Some(InputEvent::Quit) => return Flow::Quit,
            Some(InputEvent::Back) => return Flow::Exit,
            Some(event) if event.is_navigation() => self.navigate(event),
            Some(event) => {
                let outcome =
                    self.strategy
                        .handle(event, &mut self.session, &mut self.asset, &self.repo);
                match outcome {
                    Ok(()) => self.status = None,
                    Err(err) => self.report(err),
                }
            }
            None => {}
        }
        self.session.advance();
        if let Err(err) = self.sync() {
            self.report(err);
        }
        Flow::Continue
    }

    fn navigate(&mut self, event: InputEvent) {
        match event {
            InputEvent::PreviousAsset => self.session.previous_asset(),
            InputEvent::NextAsset => self.session.next_asset(),
            InputEvent::PreviousFrame => self.session.previous_frame(),
            InputEvent::NextFrame => self.session.next_frame(),
            InputEvent::TogglePause => self.session.toggle_pause(),
            InputEvent::Reset => self.session.reset(),
            _ => {}
        }
    }

    fn report(&mut self, err: EditorError) {
        warn!(editor = %self.strategy.kind(), error = %err, "editor action failed");
        self.status = Some(err.to_string());
    }

    /// Makes `asset` match the session cursor. An asset that vanished from
    /// disk triggers one re-listing of the stage.
    fn sync(&mut self) -> Result<()> {
        match self.try_sync() {
            Err(EditorError::Asset(AssetError::NotFound(what))) => {
                debug!(%what, "asset vanished, re-listing stage");
                self.asset = None;
                self.session.reload_assets(&self.repo)?;
                self.try_sync()
            }
            other => other,
        }
    }

    fn try_sync(&mut self) -> Result<()> {
        let stage = self.session.stage();
        let wanted = self.session.current_asset();
        let loaded = self.asset.as_ref().map(|a| (a.name(), a.stage()));
        if loaded == wanted.map(|name| (name, stage)) {
            let count = match &self.asset {
                Some(asset) => asset.frame_count()?,
                None => 0,
            };
            self.session.set_frame_count(count);
            return Ok(());
        }

        self.asset = match wanted {
            Some(name) => Some(VideoAsset::open(&self.repo, stage, name)?),
            None => None,
        };
        let count = match &self.asset {
            Some(asset) => asset.frame_count()?,
            None => 0,
        };
        self.session.reload_frames(count);
        debug!(asset = ?self.session.current_asset(), frames = count, "loaded asset");
        Ok(())
    }

    pub fn view(&self) -> View {
        let session = &self.session;
        let mut lines = vec![
            "Press q to quit".to_string(),
            String::new(),
            "Esc:  back to menu".to_string(),
            "R:    reset".to_string(),
            "P:    (un)pause".to_string(),
            "B:    back 1 frame".to_string(),
            "N:    next 1 frame".to_string(),
            "I:    previous video".to_string(),
            "O:    next video".to_string(),
            String::new(),
        ];
        let assets = session.assets().len();
        lines.push(format!(
            "Playing video: {}/{}",
            if assets == 0 { 0 } else { session.asset_index() + 1 },
            assets
        ));
        if let Some(name) = session.current_asset() {
            lines.push(format!("Video: {name}"));
        }
        lines.push(format!(
            "Frame: {}/{}{}",
            if session.frame_count() == 0 { 0 } else { session.frame_index() + 1 },
            session.frame_count(),
            if session.is_paused() { " (paused)" } else { "" }
        ));
        lines.push(String::new());
        lines.extend(self.strategy.describe(session, self.asset.as_ref()));
        if let Some(status) = &self.status {
            lines.push(String::new());
            lines.push(format!("Error: {status}"));
        }

        let frame = self
            .asset
            .as_ref()
            .filter(|_| session.frame_count() > 0)
            .and_then(|a| a.frames().path(session.frame_index()).ok());
        View {
            title: format!("{} - {}", self.strategy.kind(), session.stage().label()),
            frame,
            lines,
        }
    }
}

impl Screen for Workbench {
    fn key_mode(&self) -> KeyMode {
        KeyMode::Editor(self.strategy.kind())
    }

    fn step(&mut self, event: Option<InputEvent>) -> Flow {
        self.handle(event)
    }

    fn view(&self) -> View {
        Workbench::view(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Auditer, FrameEditor};
    use assets::DataLayout;
    use image::DynamicImage;
    use tempfile::tempdir;

    fn repo_with_clips(root: &std::path::Path, clips: &[(&str, u32)]) -> AssetRepository {
        let repo = AssetRepository::open(DataLayout::new(root)).unwrap();
        for (name, frames) in clips {
            std::fs::create_dir(repo.layout().asset_dir(Stage::New, name)).unwrap();
            let asset = repo.open_asset(Stage::New, name).unwrap();
            for i in 0..*frames {
                asset.frames().append(&DynamicImage::new_rgb8(i + 1, 1)).unwrap();
            }
        }
        repo
    }

    #[test]
    fn test_playback_and_navigation() {
        let tmp = tempdir().unwrap();
        let repo = repo_with_clips(tmp.path(), &[("a", 3), ("b", 5)]);
        let mut bench = Workbench::open(repo, Stage::New, Box::new(FrameEditor)).unwrap();

        assert_eq!(bench.asset().unwrap().name(), "a");
        assert_eq!(bench.session().frame_count(), 3);
        for _ in 0..4 {
            bench.handle(None);
        }
        assert_eq!(bench.session().frame_index(), 2);

        bench.handle(Some(InputEvent::NextAsset));
        assert_eq!(bench.asset().unwrap().name(), "b");
        assert_eq!(bench.session().frame_count(), 5);
        assert_eq!(bench.session().frame_index(), 0);
    }

    #[test]
    fn test_quit_and_back() {
        let tmp = tempdir().unwrap();
        let repo = repo_with_clips(tmp.path(), &[]);
        let mut bench = Workbench::open(repo, Stage::New, Box::new(Auditer)).unwrap();

        assert!(bench.asset().is_none());
        assert_eq!(bench.handle(Some(InputEvent::Approve)), Flow::Continue);
        assert_eq!(bench.handle(Some(InputEvent::Back)), Flow::Exit);
        assert_eq!(bench.handle(Some(InputEvent::Quit)), Flow::Quit);
        assert!(bench.view().lines.contains(&"Playing video: 0/0".to_string()));
    }

    #[test]
    fn test_failed_action_becomes_status() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        std::fs::create_dir(repo.layout().asset_dir(Stage::Labelled, "done")).unwrap();
        let mut bench = Workbench::open(repo, Stage::Labelled, Box::new(Auditer)).unwrap();

        assert_eq!(bench.handle(Some(InputEvent::Approve)), Flow::Continue);

        assert!(bench.status().unwrap().contains("cannot move asset"));
        assert!(bench.view().lines.iter().any(|l| l.starts_with("Error:")));
        assert_eq!(bench.asset().unwrap().name(), "done");
    }

    #[test]
    fn test_vanished_asset_is_dropped() {
        let tmp = tempdir().unwrap();
        let repo = repo_with_clips(tmp.path(), &[("a", 2), ("b", 2)]);
        let mut bench = Workbench::open(repo.clone(), Stage::New, Box::new(FrameEditor)).unwrap();
        bench.handle(Some(InputEvent::NextAsset));

        std::fs::remove_dir_all(repo.layout().asset_dir(Stage::New, "b")).unwrap();
        bench.handle(None);

        assert_eq!(bench.asset().unwrap().name(), "a");
        assert!(bench.status().is_none());
    }
}
