use assets::{AssetError, AssetRepository, DataLayout, IoContext, Stage};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What one `prepare_upload` pass exported.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    /// Assets that had at least one keyframe exported.
    pub assets: Vec<String>,
    /// Files written into the staging directory.
    pub copied: Vec<PathBuf>,
    /// `(asset, keyframe)` pairs whose keyframe no longer addresses a frame.
    pub skipped: Vec<(String, usize)>,
}

/// Exports every not-yet-uploaded keyframe of every `Verified` asset into
/// `staging_dir` as `<asset>__<frame file>`, then records them as uploaded.
///
/// The staging directory is emptied first, so it only ever holds the latest
/// batch. Assets with nothing pending are left untouched.
pub fn prepare_upload(
    repo: &AssetRepository,
    staging_dir: &Path,
) -> Result<UploadReport, AssetError> {
    if let Err(reason) = check_staging_dir(repo.layout(), staging_dir) {
        return Err(AssetError::Allocation(reason));
    }
    clear_staging(staging_dir)?;

    let mut report = UploadReport::default();
    for name in repo.list(Stage::Verified)? {
        let mut asset = repo.open_asset(Stage::Verified, &name)?;
        let pending = asset.keyframes().pending_upload();
        if pending.is_empty() {
            continue;
        }

        let frames = asset.frames().list()?;
        let mut exported = Vec::with_capacity(pending.len());
        for index in pending {
            let Some(frame) = frames.get(index) else {
                warn!(asset = %name, index, frames = frames.len(), "keyframe past the last frame, skipping");
                report.skipped.push((name.clone(), index));
                continue;
            };
            let source = asset.frames().dir().join(frame);
            let target = staging_dir.join(format!("{name}__{frame}"));
            fs::copy(&source, &target).at(&source)?;
            debug!(asset = %name, index, target = %target.display(), "staged keyframe");
            report.copied.push(target);
            exported.push(index);
        }

        if !exported.is_empty() {
            asset.mark_uploaded(&exported)?;
            report.assets.push(name);
        }
    }

    info!(
        assets = report.assets.len(),
        files = report.copied.len(),
        skipped = report.skipped.len(),
        staging = %staging_dir.display(),
        "prepared upload"
    );
    Ok(report)
}

/// The staging directory is wiped on every pass, so it must not be the data
/// root, an ancestor of it, or anything inside a stage directory.
pub(crate) fn check_staging_dir(layout: &DataLayout, staging_dir: &Path) -> Result<(), String> {
    if layout.root().starts_with(staging_dir) {
        return Err(format!(
            "staging dir {} would hold the data root {}",
            staging_dir.display(),
            layout.root().display()
        ));
    }
    if let Some(stage) = Stage::ALL
        .into_iter()
        .find(|stage| staging_dir.starts_with(layout.stage_dir(*stage)))
    {
        return Err(format!(
            "staging dir {} lies inside the {stage} stage",
            staging_dir.display()
        ));
    }
    Ok(())
}

fn clear_staging(dir: &Path) -> Result<(), AssetError> {
    fs::create_dir_all(dir).at(dir)?;
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).at(&path)?;
        } else {
            fs::remove_file(&path).at(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::{DataLayout, VideoAsset};
    use image::DynamicImage;
    use tempfile::tempdir;

    fn verified_asset(repo: &AssetRepository, frames: u32) -> VideoAsset {
        let asset = VideoAsset::create(repo, Stage::Verified).unwrap();
        for i in 0..frames {
            asset.frames().append(&DynamicImage::new_rgb8(i + 1, 1)).unwrap();
        }
        asset
    }

    #[test]
    fn test_staging_is_cleared_each_pass() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path().join("data"))).unwrap();
        let staging = tmp.path().join("to_upload");
        fs::create_dir_all(staging.join("old_batch")).unwrap();
        fs::write(staging.join("stale.jpg"), b"x").unwrap();

        let report = prepare_upload(&repo, &staging).unwrap();

        assert_eq!(report, UploadReport::default());
        assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_second_pass_exports_nothing() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path().join("data"))).unwrap();
        let staging = tmp.path().join("to_upload");
        let mut asset = verified_asset(&repo, 4);
        asset.add_keyframe(0).unwrap();
        asset.add_keyframe(3).unwrap();

        let first = prepare_upload(&repo, &staging).unwrap();
        let second = prepare_upload(&repo, &staging).unwrap();

        assert_eq!(first.copied.len(), 2);
        assert_eq!(first.assets, vec![asset.name().to_string()]);
        assert!(second.copied.is_empty());
        assert!(second.assets.is_empty());
    }

    #[test]
    fn test_stale_keyframe_is_skipped() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path().join("data"))).unwrap();
        let staging = tmp.path().join("to_upload");
        let asset = verified_asset(&repo, 2);
        // written behind the asset's back, past the last frame
        fs::write(asset.dir().join(assets::KEYFRAMES_RECORD), "1\n7\n").unwrap();

        let report = prepare_upload(&repo, &staging).unwrap();

        assert_eq!(report.copied, vec![staging.join(format!("{}__frame_0001.jpg", asset.name()))]);
        assert_eq!(report.skipped, vec![(asset.name().to_string(), 7)]);
        let reopened = repo.open_asset(Stage::Verified, asset.name()).unwrap();
        assert_eq!(reopened.keyframes().uploaded().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_staging_over_data_root_is_refused() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("data");
        let repo = AssetRepository::open(DataLayout::new(&root)).unwrap();
        let asset = verified_asset(&repo, 1);

        for staging in [root.clone(), tmp.path().to_path_buf(), root.join("new").join("x")] {
            assert!(matches!(
                prepare_upload(&repo, &staging),
                Err(AssetError::Allocation(_))
            ));
        }
        assert!(repo.layout().stage_dir(Stage::New).is_dir());
        assert!(asset.dir().is_dir());
    }

    #[test]
    fn test_other_stages_are_ignored() {
        let tmp = tempdir().unwrap();
        let repo = AssetRepository::open(DataLayout::new(tmp.path().join("data"))).unwrap();
        let staging = tmp.path().join("to_upload");
        let mut fresh = VideoAsset::create(&repo, Stage::New).unwrap();
        fresh.frames().append(&DynamicImage::new_rgb8(1, 1)).unwrap();
        fresh.add_keyframe(0).unwrap();

        let report = prepare_upload(&repo, &staging).unwrap();

        assert!(report.copied.is_empty());
    }
}
