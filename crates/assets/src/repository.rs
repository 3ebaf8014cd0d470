use std::fs;
use std::io::ErrorKind;
use tracing::debug;

use crate::{AssetError, DataLayout, IoContext, Result, Stage, VideoAsset};

/// Live view over the three stage directories. Every query re-scans the
/// filesystem; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    layout: DataLayout,
}

impl AssetRepository {
    /// Opens the data root, creating any missing stage directory.
    pub fn open(layout: DataLayout) -> Result<Self> {
        for stage in Stage::ALL {
            let dir = layout.stage_dir(stage);
            fs::create_dir_all(&dir).at(&dir)?;
        }
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Asset names in `stage`, sorted lexicographically.
    pub fn list(&self, stage: Stage) -> Result<Vec<String>> {
        let dir = self.layout.stage_dir(stage);
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).at(&dir)? {
            let entry = entry.at(&dir)?;
            if !entry.file_type().at(&entry.path())?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Stage currently holding `name`, if any.
    pub fn locate(&self, name: &str) -> Option<Stage> {
        if !is_valid_name(name) {
            return None;
        }
        Stage::ALL
            .into_iter()
            .find(|stage| self.layout.asset_dir(*stage, name).is_dir())
    }

    /// A name no stage currently uses.
    ///
    /// Without a hint the name is timestamp-derived (`clip_20240131T101500`).
    /// With a hint the hint's stem is reused and the smallest free counter
    /// appended (`clip01` -> `clip01-1`, `clip01-1` -> `clip01-2`).
    /// Only race-free while a single process owns the data root.
    pub fn resolve_free_name(&self, hint: Option<&str>) -> Result<String> {
        let stem = match hint {
            Some(hint) => {
                validate_name(hint)?;
                counter_stem(hint).to_string()
            }
            None => chrono::Local::now().format("clip_%Y%m%dT%H%M%S").to_string(),
        };
        if hint.is_none() && self.locate(&stem).is_none() {
            return Ok(stem);
        }
        (1usize..)
            .map(|n| format!("{stem}-{n}"))
            .find(|candidate| self.locate(candidate).is_none())
            .ok_or_else(|| AssetError::Allocation(format!("no free name for '{stem}'")))
    }

    /// Reserves a free name by creating its directory in `stage`.
    pub(crate) fn allocate(&self, stage: Stage, hint: Option<&str>) -> Result<String> {
        let name = self.resolve_free_name(hint)?;
        let dir = self.layout.asset_dir(stage, &name);
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                AssetError::Allocation(format!("'{name}' appeared while allocating"))
            }
            _ => AssetError::Allocation(format!("cannot create {}: {e}", dir.display())),
        })?;
        debug!(asset = %name, stage = %stage, "allocated asset");
        Ok(name)
    }

    pub fn open_asset(&self, stage: Stage, name: &str) -> Result<VideoAsset> {
        VideoAsset::open(self, stage, name)
    }

    pub fn move_asset(&self, stage: Stage, name: &str, target: Stage) -> Result<()> {
        self.open_asset(stage, name)?.move_to_stage(target)
    }

    pub fn delete_asset(&self, stage: Stage, name: &str) -> Result<()> {
        self.open_asset(stage, name)?.delete()
    }
}

/// Single path component that names a folder inside a stage directory.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !(name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control))
}

fn validate_name(name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(AssetError::Allocation(format!("invalid asset name '{name}'")));
    }
    Ok(())
}

/// `clip01-3` -> `clip01`; names without a numeric counter are their own stem.
fn counter_stem(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((stem, n))
            if !stem.is_empty() && !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) =>
        {
            stem
        }
        _ => name,
    }
}
