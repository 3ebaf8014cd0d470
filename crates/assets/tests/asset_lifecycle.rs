use assets::{
    read_record, AssetError, AssetRepository, DataLayout, Stage, VideoAsset, KEYFRAMES_RECORD,
};
use image::DynamicImage;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn named_asset(repo: &AssetRepository, stage: Stage, name: &str, frames: u32) -> VideoAsset {
    fs::create_dir(repo.layout().asset_dir(stage, name)).unwrap();
    let asset = VideoAsset::open(repo, stage, name).unwrap();
    for i in 0..frames {
        asset.frames().append(&DynamicImage::new_rgb8(i + 1, 2)).unwrap();
    }
    asset
}

fn open_repo(root: &Path) -> AssetRepository {
    AssetRepository::open(DataLayout::new(root)).unwrap()
}

#[test]
fn approved_clip_changes_stage_listing() {
    let tmp = tempdir().unwrap();
    let repo = open_repo(tmp.path());
    let mut clip = named_asset(&repo, Stage::New, "clip01", 10);
    clip.add_keyframe(2).unwrap();
    clip.add_keyframe(5).unwrap();

    repo.move_asset(Stage::New, "clip01", Stage::Verified).unwrap();

    assert!(!repo.list(Stage::New).unwrap().contains(&"clip01".to_string()));
    assert_eq!(repo.list(Stage::Verified).unwrap(), vec!["clip01"]);
    let moved = repo.open_asset(Stage::Verified, "clip01").unwrap();
    assert_eq!(moved.frame_count().unwrap(), 10);
    assert_eq!(
        moved.keyframes().keyframes().iter().copied().collect::<Vec<_>>(),
        vec![2, 5]
    );
}

#[test]
fn split_reproduces_original_sequence() {
    let tmp = tempdir().unwrap();
    let repo = open_repo(tmp.path());
    let mut clip = named_asset(&repo, Stage::New, "clip01", 10);

    let tail = clip.split(&repo, 4).unwrap();

    let mut widths: Vec<u32> = (0..clip.frame_count().unwrap())
        .map(|i| clip.frames().read(i).unwrap().width())
        .collect();
    widths.extend((0..tail.frame_count().unwrap()).map(|i| tail.frames().read(i).unwrap().width()));
    assert_eq!(widths, (1..=10).collect::<Vec<_>>());
    assert_eq!(clip.frame_count().unwrap(), 5);
    assert_eq!(tail.name(), "clip01-1");
    assert_eq!(repo.list(Stage::New).unwrap(), vec!["clip01", "clip01-1"]);
}

#[test]
fn keyframe_record_stays_sorted_unique_and_in_range() {
    let tmp = tempdir().unwrap();
    let repo = open_repo(tmp.path());
    let mut clip = named_asset(&repo, Stage::New, "clip01", 12);

    // deterministic walk over adds, removes and trims
    let mut state = 7usize;
    for step in 0..60 {
        state = (state * 31 + 17) % 97;
        let len = clip.frame_count().unwrap();
        let index = state % (len + 2);
        match step % 5 {
            0 | 1 | 2 => {
                let _ = clip.add_keyframe(index);
            }
            3 => {
                clip.remove_keyframe(index).unwrap();
            }
            _ if step == 24 => {
                clip.trim_before(2).unwrap();
            }
            _ if step == 49 => {
                clip.trim_after(6).unwrap();
            }
            _ => {}
        }

        let record = read_record(&clip.dir().join(KEYFRAMES_RECORD)).unwrap();
        let raw = fs::read_to_string(clip.dir().join(KEYFRAMES_RECORD)).unwrap();
        let values: Vec<usize> = raw.lines().map(|l| l.parse().unwrap()).collect();
        let mut sorted = values.clone();
        sorted.dedup();
        assert_eq!(values, sorted);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(record.len(), values.len());
        let len = clip.frame_count().unwrap();
        assert!(values.iter().all(|v| *v < len), "{values:?} vs {len} frames");
    }
}

#[test]
fn labelled_is_terminal() {
    let tmp = tempdir().unwrap();
    let repo = open_repo(tmp.path());
    named_asset(&repo, Stage::Labelled, "done", 1);

    for target in Stage::ALL {
        assert!(matches!(
            repo.move_asset(Stage::Labelled, "done", target),
            Err(AssetError::InvalidTransition { from: Stage::Labelled, .. })
        ));
    }
    assert_eq!(repo.list(Stage::Labelled).unwrap(), vec!["done"]);
}

#[test]
fn deleting_unknown_asset_is_not_found() {
    let tmp = tempdir().unwrap();
    let repo = open_repo(tmp.path());

    assert!(matches!(
        repo.delete_asset(Stage::New, "ghost"),
        Err(AssetError::NotFound(_))
    ));
}

#[test]
fn path_like_names_never_resolve_to_directories() {
    let tmp = tempdir().unwrap();
    let repo = open_repo(tmp.path());
    named_asset(&repo, Stage::Verified, "keep", 2);
    fs::create_dir_all(repo.layout().asset_dir(Stage::New, "a").join("b")).unwrap();

    for name in ["..", ".", "a/b"] {
        assert_eq!(repo.locate(name), None, "{name}");
        assert!(
            matches!(repo.open_asset(Stage::New, name), Err(AssetError::NotFound(_))),
            "{name}"
        );
        assert!(matches!(
            repo.delete_asset(Stage::New, name),
            Err(AssetError::NotFound(_))
        ));
        assert!(matches!(
            repo.move_asset(Stage::New, name, Stage::Verified),
            Err(AssetError::NotFound(_))
        ));
    }

    assert!(repo.layout().asset_dir(Stage::Verified, "keep").is_dir());
    assert!(repo.layout().asset_dir(Stage::New, "a").join("b").is_dir());
    assert!(!tmp.path().join(KEYFRAMES_RECORD).exists());
}
