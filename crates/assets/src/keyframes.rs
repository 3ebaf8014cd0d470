use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{invalid_data, IoContext, Result, KEYFRAMES_RECORD, UPLOADED_RECORD};

/// Reads a newline-delimited integer record. A missing record is created
/// empty and read as the empty set.
pub fn read_record(path: &Path) -> Result<BTreeSet<usize>> {
    if !path.exists() {
        fs::write(path, "").at(path)?;
        return Ok(BTreeSet::new());
    }
    let raw = fs::read_to_string(path).at(path)?;
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<usize>()
                .map_err(|e| invalid_data(path, format!("bad entry '{line}': {e}")))
        })
        .collect()
}

/// Overwrites the record with one value per line.
pub fn write_record(path: &Path, values: impl IntoIterator<Item = usize>) -> Result<()> {
    let body: String = values.into_iter().map(|v| format!("{v}\n")).collect();
    fs::write(path, body).at(path)
}

/// Keyframe indices of one asset plus the subset already exported.
///
/// Both sets are persisted on every change; they stay small (tens of
/// entries), so whole-file rewrites are fine.
#[derive(Debug, Clone)]
pub struct KeyframeSet {
    dir: PathBuf,
    keyframes: BTreeSet<usize>,
    uploaded: BTreeSet<usize>,
}

impl KeyframeSet {
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            keyframes: read_record(&dir.join(KEYFRAMES_RECORD))?,
            uploaded: read_record(&dir.join(UPLOADED_RECORD))?,
            dir: dir.to_path_buf(),
        })
    }

    pub(crate) fn relocate(&mut self, dir: PathBuf) {
        self.dir = dir;
    }

    pub fn keyframes(&self) -> &BTreeSet<usize> {
        &self.keyframes
    }

    pub fn uploaded(&self) -> &BTreeSet<usize> {
        &self.uploaded
    }

    pub fn contains(&self, index: usize) -> bool {
        self.keyframes.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Returns false when the index was already a keyframe.
    pub fn add(&mut self, index: usize) -> Result<bool> {
        if !self.keyframes.insert(index) {
            return Ok(false);
        }
        self.persist_keyframes()?;
        Ok(true)
    }

    pub fn remove(&mut self, index: usize) -> Result<bool> {
        if !self.keyframes.remove(&index) {
            return Ok(false);
        }
        self.persist_keyframes()?;
        Ok(true)
    }

    /// Keyframes missing from `uploaded`, ascending.
    pub fn diff_upload(&self, uploaded: &BTreeSet<usize>) -> Vec<usize> {
        self.keyframes.difference(uploaded).copied().collect()
    }

    pub fn pending_upload(&self) -> Vec<usize> {
        self.diff_upload(&self.uploaded)
    }

    pub fn mark_uploaded(&mut self, indices: &[usize]) -> Result<()> {
        self.uploaded.extend(indices.iter().copied());
        write_record(&self.dir.join(UPLOADED_RECORD), self.uploaded.iter().copied())
    }

    /// Follows the removal of frame positions `[start, end)`: entries inside
    /// the range are dropped, later entries shift down.
    pub(crate) fn remove_range(&mut self, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let before = (self.keyframes.clone(), self.uploaded.clone());
        self.keyframes = shift_out(&self.keyframes, start, end);
        self.uploaded = shift_out(&self.uploaded, start, end);
        if before.0 != self.keyframes {
            self.persist_keyframes()?;
        }
        if before.1 != self.uploaded {
            write_record(&self.dir.join(UPLOADED_RECORD), self.uploaded.iter().copied())?;
        }
        Ok(())
    }

    /// Follows frames `[start, end)` being appended to `dest` at `dest_offset`:
    /// the entries travel with them, then the range is removed here.
    pub(crate) fn transfer_range(
        &mut self,
        start: usize,
        end: usize,
        dest: &mut KeyframeSet,
        dest_offset: usize,
    ) -> Result<()> {
        let carried = |set: &BTreeSet<usize>| -> Vec<usize> {
            set.range(start..end).map(|v| v - start + dest_offset).collect()
        };
        let keyframes = carried(&self.keyframes);
        let uploaded = carried(&self.uploaded);
        if !keyframes.is_empty() {
            dest.keyframes.extend(keyframes);
            dest.persist_keyframes()?;
        }
        if !uploaded.is_empty() {
            dest.mark_uploaded(&uploaded)?;
        }
        self.remove_range(start, end)
    }

    fn persist_keyframes(&self) -> Result<()> {
        write_record(&self.dir.join(KEYFRAMES_RECORD), self.keyframes.iter().copied())
    }
}

fn shift_out(set: &BTreeSet<usize>, start: usize, end: usize) -> BTreeSet<usize> {
    let width = end - start;
    set.iter()
        .filter(|v| !(start..end).contains(*v))
        .map(|&v| if v >= end { v - width } else { v })
        .collect()
}
