use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::repository::is_valid_name;
use crate::{
    AssetError, AssetRepository, DataLayout, FrameStore, IoContext, KeyframeSet, Result, Stage,
};

/// One recorded clip: its frames, its keyframe records and the stage it sits in.
#[derive(Debug)]
pub struct VideoAsset {
    name: String,
    stage: Stage,
    layout: DataLayout,
    frames: FrameStore,
    keyframes: KeyframeSet,
}

impl VideoAsset {
    /// Allocates a fresh, empty asset in `stage`.
    pub fn create(repo: &AssetRepository, stage: Stage) -> Result<Self> {
        let name = repo.allocate(stage, None)?;
        Self::open(repo, stage, &name)
    }

    /// Like `create`, deriving the name from an existing one (`clip01` -> `clip01-1`).
    pub fn create_from_hint(repo: &AssetRepository, stage: Stage, hint: &str) -> Result<Self> {
        let name = repo.allocate(stage, Some(hint))?;
        Self::open(repo, stage, &name)
    }

    pub fn open(repo: &AssetRepository, stage: Stage, name: &str) -> Result<Self> {
        if !is_valid_name(name) {
            return Err(AssetError::NotFound(format!("asset '{name}' in {stage}")));
        }
        let layout = repo.layout().clone();
        let dir = layout.asset_dir(stage, name);
        if !dir.is_dir() {
            return Err(AssetError::NotFound(format!("asset '{name}' in {stage}")));
        }
        Ok(Self {
            name: name.to_string(),
            stage,
            frames: FrameStore::open(&dir, layout.naming().clone()),
            keyframes: KeyframeSet::load(&dir)?,
            layout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn dir(&self) -> PathBuf {
        self.layout.asset_dir(self.stage, &self.name)
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn keyframes(&self) -> &KeyframeSet {
        &self.keyframes
    }

    pub fn frame_count(&self) -> Result<usize> {
        self.frames.len()
    }

    /// Marks `index` as a keyframe; the index must address an existing frame.
    pub fn add_keyframe(&mut self, index: usize) -> Result<bool> {
        let len = self.frame_count()?;
        if index >= len {
            return Err(AssetError::NotFound(format!(
                "frame {index} in '{}' ({len} frames)",
                self.name
            )));
        }
        self.keyframes.add(index)
    }

    pub fn remove_keyframe(&mut self, index: usize) -> Result<bool> {
        self.keyframes.remove(index)
    }

    pub fn mark_uploaded(&mut self, indices: &[usize]) -> Result<()> {
        self.keyframes.mark_uploaded(indices)
    }

    /// Re-reads both keyframe records, picking up writes made through
    /// another handle to the same asset.
    pub fn reload_keyframes(&mut self) -> Result<()> {
        self.keyframes = KeyframeSet::load(&self.dir())?;
        Ok(())
    }

    /// Deletes every frame before `index`; `index` becomes frame 0.
    pub fn trim_before(&mut self, index: usize) -> Result<usize> {
        self.delete_frames(0, index)
    }

    /// Deletes every frame after `index`; `index` becomes the last frame.
    pub fn trim_after(&mut self, index: usize) -> Result<usize> {
        let len = self.frame_count()?;
        self.delete_frames(index.saturating_add(1), len)
    }

    /// Deletes frames `[start, end)` and renumbers frames and keyframes.
    pub fn delete_frames(&mut self, start: usize, end: usize) -> Result<usize> {
        let len = self.frame_count()?;
        let (start, end) = (start.min(end.min(len)), end.min(len));
        let removed = self.frames.delete_range(start, end)?;
        self.keyframes.remove_range(start, start + removed)?;
        if removed > 0 {
            info!(asset = %self.name, start, end, removed, "deleted frames");
        }
        Ok(removed)
    }

    /// Moves every frame after `index` into a new asset in the same stage and
    /// returns it. Keyframes travel with their frames.
    pub fn split(&mut self, repo: &AssetRepository, index: usize) -> Result<VideoAsset> {
        let len = self.frame_count()?;
        let start = index.saturating_add(1).min(len);
        let mut tail = Self::create_from_hint(repo, self.stage, &self.name)?;
        let dest_offset = tail.frame_count()?;
        let moved = self.frames.move_range(start, len, &tail.frames)?;
        self.keyframes
            .transfer_range(start, start + moved, &mut tail.keyframes, dest_offset)?;
        info!(asset = %self.name, into = %tail.name, moved, "split asset");
        Ok(tail)
    }

    /// Relocates the whole asset folder along a permitted stage edge.
    pub fn move_to_stage(&mut self, target: Stage) -> Result<()> {
        if !self.stage.can_move_to(target) {
            return Err(AssetError::InvalidTransition {
                from: self.stage,
                to: target,
            });
        }
        let from = self.dir();
        let to = self.layout.asset_dir(target, &self.name);
        if to.exists() {
            return Err(AssetError::Allocation(format!(
                "'{}' already exists in {target}",
                self.name
            )));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        if let Err(err) = fs::rename(&from, &to) {
            warn!(asset = %self.name, error = %err, "rename refused, copying instead");
            copy_tree(&from, &to)?;
            fs::remove_dir_all(&from).at(&from)?;
        }
        info!(asset = %self.name, from = %self.stage, to = %target, "moved asset");
        self.stage = target;
        self.frames.relocate(to.clone());
        self.keyframes.relocate(to);
        Ok(())
    }

    /// Removes the asset and all of its frames. There is no undo.
    pub fn delete(self) -> Result<()> {
        let dir = self.dir();
        fs::remove_dir_all(&dir).at(&dir)?;
        info!(asset = %self.name, stage = %self.stage, "deleted asset");
        Ok(())
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            AssetError::Io {
                source: e.into(),
                path,
            }
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).at(&target)?;
        } else {
            fs::copy(entry.path(), &target).at(entry.path())?;
        }
    }
    Ok(())
}
