use std::path::{Path, PathBuf};

use crate::Stage;

/// Keyframe record inside an asset directory.
pub const KEYFRAMES_RECORD: &str = "keyframes.txt";
/// Record of keyframes already copied to the export staging directory.
pub const UPLOADED_RECORD: &str = "uploaded_keyframes.txt";

/// Physical naming of frame files: `frame_0007.jpg` for digits = 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNaming {
    digits: usize,
    extension: String,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self::new(4, "jpg")
    }
}

impl FrameNaming {
    pub fn new(digits: usize, extension: impl Into<String>) -> Self {
        let extension = extension.into().trim_start_matches('.').to_ascii_lowercase();
        Self {
            digits: digits.max(1),
            extension,
        }
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Zero-padded name for the frame at `index`.
    pub fn file_name(&self, index: usize) -> String {
        format!(
            "frame_{:0width$}.{}",
            index,
            self.extension,
            width = self.digits
        )
    }

    /// Number of frames that still sort lexicographically in sequence order.
    pub fn capacity(&self) -> usize {
        10usize.saturating_pow(self.digits as u32)
    }

    pub fn is_frame(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case(&self.extension))
    }
}

/// Where the stage directories live and how frames inside them are named.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
    naming: FrameNaming,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            naming: FrameNaming::default(),
        }
    }

    pub fn with_naming(mut self, naming: FrameNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }

    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.dir_name())
    }

    pub fn asset_dir(&self, stage: Stage, name: &str) -> PathBuf {
        self.stage_dir(stage).join(name)
    }
}
