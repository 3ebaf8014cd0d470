use assets::{AssetRepository, Stage, VideoAsset};
use image::DynamicImage;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{EditorError, EditorKind, Flow, InputEvent, KeyMode, Result, Screen, View};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Where recorded frames come from. `Ok(None)` means the source is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> io::Result<Option<DynamicImage>>;
}

/// Replays the images of one directory in file-name order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    pending: VecDeque<PathBuf>,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> io::Result<Self> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_image = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_image {
                files.push(entry.into_path());
            }
        }
        files.sort();
        debug!(dir = %dir.display(), frames = files.len(), "opened frame directory");
        Ok(Self {
            pending: files.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for DirectorySource {
    fn next_frame(&mut self) -> io::Result<Option<DynamicImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        image::open(&path)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {e}", path.display())))
    }
}

/// Captures frames from a source into fresh assets in the `New` stage.
pub struct Recorder {
    repo: AssetRepository,
    source: Box<dyn FrameSource>,
    recording: Option<VideoAsset>,
    written: usize,
    last_frame: Option<PathBuf>,
    exhausted: bool,
    status: Option<String>,
}

impl Recorder {
    pub fn new(repo: AssetRepository, source: Box<dyn FrameSource>) -> Self {
        Self {
            repo,
            source,
            recording: None,
            written: 0,
            last_frame: None,
            exhausted: false,
            status: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Opens a new asset to record into. No-op while already recording.
    pub fn start(&mut self) -> Result<()> {
        if self.recording.is_some() {
            return Ok(());
        }
        let asset = VideoAsset::create(&self.repo, Stage::New)?;
        info!(asset = %asset.name(), "recording started");
        self.recording = Some(asset);
        self.written = 0;
        Ok(())
    }

    /// Closes the current recording and returns its name. A recording that
    /// never received a frame is discarded.
    pub fn stop(&mut self) -> Result<Option<String>> {
        let Some(asset) = self.recording.take() else {
            return Ok(None);
        };
        if self.written == 0 {
            debug!(asset = %asset.name(), "discarding empty recording");
            asset.delete()?;
            return Ok(None);
        }
        info!(asset = %asset.name(), frames = self.written, "recording stopped");
        Ok(Some(asset.name().to_string()))
    }

    /// Pulls one frame and, while recording, appends it. Returns `false` once
    /// the source is exhausted.
    pub fn capture(&mut self) -> Result<bool> {
        let Some(frame) = self.source.next_frame().map_err(EditorError::Source)? else {
            self.exhausted = true;
            return Ok(false);
        };
        if let Some(asset) = &self.recording {
            let index = asset.frames().append(&frame)?;
            self.last_frame = Some(asset.frames().path(index)?);
            self.written += 1;
        }
        Ok(true)
    }

    /// Records the whole source into one asset.
    pub fn record_all(&mut self) -> Result<Option<String>> {
        self.start()?;
        while self.capture()? {}
        self.stop()
    }

    fn report(&mut self, err: EditorError) {
        warn!(error = %err, "recorder action failed");
        self.status = Some(err.to_string());
    }
}

impl Screen for Recorder {
    fn key_mode(&self) -> KeyMode {
        KeyMode::Editor(EditorKind::Recorder)
    }

    fn step(&mut self, event: Option<InputEvent>) -> Flow {
        let leave = match event {
            Some(InputEvent::Quit) => Some(Flow::Quit),
            Some(InputEvent::Back) => Some(Flow::Exit),
            _ => None,
        };
        if let Some(flow) = leave {
            if let Err(err) = self.stop() {
                warn!(error = %err, "failed to close recording");
            }
            return flow;
        }

        let outcome = match event {
            Some(InputEvent::StartRecording) => self.start(),
            Some(InputEvent::StopRecording) => self.stop().map(|_| ()),
            _ => Ok(()),
        };
        let captured = outcome.and_then(|()| match self.capture()? {
            true => Ok(()),
            false => self.stop().map(|_| ()),
        });
        if let Err(err) = captured {
            self.report(err);
        }
        Flow::Continue
    }

    fn view(&self) -> View {
        let mut lines = vec![
            "Press q to quit".to_string(),
            "Esc:  back to menu".to_string(),
            String::new(),
            "R:    record".to_string(),
            "S:    stop".to_string(),
            String::new(),
        ];
        lines.push(match &self.recording {
            Some(asset) => format!("Recording into {} ({} frames)", asset.name(), self.written),
            None => "Not recording".to_string(),
        });
        if self.exhausted {
            lines.push("The frame source has no more frames".to_string());
        }
        lines.extend(self.status.clone());
        View {
            title: EditorKind::Recorder.label().to_string(),
            frame: self.last_frame.clone(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::DataLayout;
    use tempfile::tempdir;

    struct Synthetic(u32);

    impl FrameSource for Synthetic {
        fn next_frame(&mut self) -> io::Result<Option<DynamicImage>> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(DynamicImage::new_rgb8(self.0 + 1, 1)))
        }
    }

    #[test]
    fn test_record_all_into_new_stage() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        let mut recorder = Recorder::new(repo.clone(), Box::new(Synthetic(3)));

        let name = recorder.record_all().unwrap().unwrap();

        let asset = repo.open_asset(Stage::New, &name).unwrap();
        assert_eq!(asset.frame_count().unwrap(), 3);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_frames_only_kept_while_recording() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        let mut recorder = Recorder::new(repo.clone(), Box::new(Synthetic(10)));

        recorder.step(None);
        recorder.step(Some(InputEvent::StartRecording));
        recorder.step(None);
        recorder.step(Some(InputEvent::StopRecording));
        recorder.step(None);

        let names = repo.list(Stage::New).unwrap();
        assert_eq!(names.len(), 1);
        let asset = repo.open_asset(Stage::New, &names[0]).unwrap();
        assert_eq!(asset.frame_count().unwrap(), 2);
    }

    #[test]
    fn test_exhausted_source_ends_recording() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        let mut recorder = Recorder::new(repo.clone(), Box::new(Synthetic(2)));

        recorder.step(Some(InputEvent::StartRecording));
        recorder.step(None);
        assert!(recorder.is_recording());
        recorder.step(None);

        assert!(!recorder.is_recording());
        assert_eq!(repo.list(Stage::New).unwrap().len(), 1);
        assert!(recorder
            .view()
            .lines
            .contains(&"The frame source has no more frames".to_string()));
    }

    #[test]
    fn test_empty_recording_is_discarded() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path())).unwrap();
        let mut recorder = Recorder::new(repo.clone(), Box::new(Synthetic(0)));

        assert_eq!(recorder.record_all().unwrap(), None);
        assert!(repo.list(Stage::New).unwrap().is_empty());
    }

    #[test]
    fn test_directory_source_order() {
        let tmp = tempdir().unwrap();
        for (name, width) in [("b.png", 2), ("a.png", 1), ("c.png", 3)] {
            DynamicImage::new_rgb8(width, 1).save(tmp.path().join(name)).unwrap();
        }
        std::fs::write(tmp.path().join("notes.txt"), "skip").unwrap();

        let mut source = DirectorySource::open(tmp.path()).unwrap();
        assert_eq!(source.remaining(), 3);
        let widths: Vec<u32> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|f| f.width())
            .collect();
        assert_eq!(widths, vec![1, 2, 3]);
    }
}
