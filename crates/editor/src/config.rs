use assets::{DataLayout, FrameNaming};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::upload::check_staging_dir;
use crate::{EditorError, Result};

/// `~/.local/share/clipline/data` on Linux, the platform equivalent elsewhere.
pub fn default_data_root() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    base.join("clipline").join("data")
}

/// Settings read once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Directory holding the `new`, `verified` and `labelled` stage folders.
    pub data_root: PathBuf,

    /// Flat export directory for keyframes; `<data_root>/to_upload` when unset.
    pub staging_dir: Option<PathBuf>,

    /// Polling ticks per second; playback advances one frame per tick.
    pub fps: u32,

    /// Zero padding of frame file numbers.
    pub frame_digits: usize,

    /// Image extension of frame files.
    pub frame_extension: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            staging_dir: None,
            fps: 10,
            frame_digits: 4,
            frame_extension: "jpg".to_string(),
        }
    }
}

impl EditorConfig {
    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| EditorError::Config(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(EditorError::Config("fps must be greater than 0".to_string()));
        }
        if self.frame_digits == 0 || self.frame_digits > 9 {
            return Err(EditorError::Config(
                "frame_digits must be between 1 and 9".to_string(),
            ));
        }
        if self.frame_extension.trim_start_matches('.').is_empty() {
            return Err(EditorError::Config("frame_extension is empty".to_string()));
        }
        check_staging_dir(&self.layout(), &self.staging_dir()).map_err(EditorError::Config)?;
        Ok(())
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.data_root.join("to_upload"))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_root)
            .with_naming(FrameNaming::new(self.frame_digits, &self.frame_extension))
    }
}
