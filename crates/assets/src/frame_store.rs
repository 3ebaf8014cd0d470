use image::{DynamicImage, ImageError, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{invalid_data, AssetError, FrameNaming, IoContext, Result};

/// Ordered frame images of one asset directory.
///
/// Positions are derived from the sorted file names on every call; nothing is
/// cached, so indices are only meaningful until the next mutation.
#[derive(Debug, Clone)]
pub struct FrameStore {
    dir: PathBuf,
    naming: FrameNaming,
}

impl FrameStore {
    pub fn open(dir: impl Into<PathBuf>, naming: FrameNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }

    pub(crate) fn relocate(&mut self, dir: PathBuf) {
        self.dir = dir;
    }

    /// Frame file names in sequence order.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(AssetError::NotFound(format!(
                "frame directory {}",
                self.dir.display()
            )));
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).at(&self.dir)? {
            let entry = entry.at(&self.dir)?;
            if !entry.file_type().at(&entry.path())?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if self.naming.is_frame(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self, index: usize) -> Result<PathBuf> {
        let names = self.list()?;
        names
            .get(index)
            .map(|name| self.dir.join(name))
            .ok_or_else(|| self.missing(index, names.len()))
    }

    pub fn read(&self, index: usize) -> Result<DynamicImage> {
        let path = self.path(index)?;
        image::open(&path).map_err(|e| image_error(&path, e))
    }

    /// Encodes `image` as the next frame and returns its position.
    pub fn append(&self, image: &DynamicImage) -> Result<usize> {
        let index = self.next_slot(1)?;
        let path = self.dir.join(self.naming.file_name(index));
        write_image(&path, image)?;
        Ok(index)
    }

    /// Removes positions `[start, end)` and closes the gap. Returns the number
    /// of frames removed; bounds past the end are clamped.
    pub fn delete_range(&self, start: usize, end: usize) -> Result<usize> {
        let names = self.list()?;
        let (start, end) = clamp_range(start, end, names.len());
        for name in &names[start..end] {
            let path = self.dir.join(name);
            fs::remove_file(&path).at(&path)?;
        }
        if start < end {
            self.renumber()?;
            debug!(dir = %self.dir.display(), start, end, "deleted frame range");
        }
        Ok(end - start)
    }

    /// Relocates positions `[start, end)` to the end of `dest`, keeping their
    /// relative order, then renumbers this store.
    pub fn move_range(&self, start: usize, end: usize, dest: &FrameStore) -> Result<usize> {
        if dest.dir == self.dir {
            return Err(AssetError::Allocation(format!(
                "cannot move frames of {} onto itself",
                self.dir.display()
            )));
        }
        let names = self.list()?;
        let (start, end) = clamp_range(start, end, names.len());
        if start == end {
            return Ok(0);
        }
        let base = dest.next_slot(end - start)?;
        for (offset, name) in names[start..end].iter().enumerate() {
            let from = self.dir.join(name);
            let to = dest.dir.join(dest.naming.file_name(base + offset));
            relocate_file(&from, &to)?;
        }
        self.renumber()?;
        debug!(
            from = %self.dir.display(),
            to = %dest.dir.display(),
            moved = end - start,
            "moved frame range"
        );
        Ok(end - start)
    }

    /// Renames frames so position `i` is stored as `naming.file_name(i)`.
    /// Returns the frame count.
    pub fn renumber(&self) -> Result<usize> {
        let names = self.list()?;
        let pending: Vec<(usize, &String)> = names
            .iter()
            .enumerate()
            .filter(|(index, name)| **name != self.naming.file_name(*index))
            .collect();
        if pending.is_empty() {
            return Ok(names.len());
        }

        // Two phases: a final name may still be held by a file that moves later.
        let mut staged = Vec::with_capacity(pending.len());
        for (index, name) in pending {
            let from = self.dir.join(name);
            let tmp = self.dir.join(format!(".renumber_{index}.tmp"));
            fs::rename(&from, &tmp).at(&from)?;
            staged.push((index, tmp));
        }
        for (index, tmp) in staged {
            let to = self.dir.join(self.naming.file_name(index));
            fs::rename(&tmp, &to).at(&tmp)?;
        }
        Ok(names.len())
    }

    fn next_slot(&self, count: usize) -> Result<usize> {
        let len = self.renumber()?;
        if len + count > self.naming.capacity() {
            return Err(AssetError::Allocation(format!(
                "{} holds {len} frames; {} digit numbering allows {}",
                self.dir.display(),
                self.naming.digits(),
                self.naming.capacity()
            )));
        }
        Ok(len)
    }

    fn missing(&self, index: usize, len: usize) -> AssetError {
        AssetError::NotFound(format!(
            "frame {index} in {} ({len} frames)",
            self.dir.display()
        ))
    }
}

fn clamp_range(start: usize, end: usize, len: usize) -> (usize, usize) {
    let end = end.min(len);
    (start.min(end), end)
}

/// Rename, falling back to copy + remove when the rename is refused
/// (e.g. across devices). Refuses to overwrite.
pub(crate) fn relocate_file(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(AssetError::Allocation(format!(
            "{} already exists",
            to.display()
        )));
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to).at(from)?;
        fs::remove_file(from).at(from)?;
    }
    Ok(())
}

fn write_image(path: &Path, image: &DynamicImage) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| image_error(path, e))?;
    let result = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
        }
        _ => image.save_with_format(path, format),
    };
    result.map_err(|e| image_error(path, e))
}

fn image_error(path: &Path, err: ImageError) -> AssetError {
    match err {
        ImageError::IoError(source) => AssetError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => invalid_data(path, other.to_string()),
    }
}
