use anyhow::{bail, Context, Result};
use assets::{AssetRepository, Stage, VideoAsset};
use editor::{apply_verdict, DirectorySource, Recorder, Verdict};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::{AssetArgs, FrameArgs};

#[derive(Debug, Serialize)]
struct AssetRow {
    name: String,
    stage: Stage,
    frames: usize,
    keyframes: usize,
    pending_upload: usize,
}

fn collect_rows(repo: &AssetRepository, stage: Option<Stage>) -> Result<Vec<AssetRow>> {
    let stages = match stage {
        Some(stage) => vec![stage],
        None => Stage::ALL.to_vec(),
    };
    let mut rows = Vec::new();
    for stage in stages {
        for name in repo.list(stage)? {
            let asset = repo.open_asset(stage, &name)?;
            rows.push(AssetRow {
                frames: asset.frame_count()?,
                keyframes: asset.keyframes().len(),
                pending_upload: asset.keyframes().pending_upload().len(),
                stage,
                name,
            });
        }
    }
    Ok(rows)
}

pub fn list(repo: &AssetRepository, stage: Option<Stage>, json: bool) -> Result<()> {
    let rows = collect_rows(repo, stage)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No clips found");
        return Ok(());
    }
    println!("{:<10} {:<32} {:>7} {:>10} {:>8}", "STAGE", "NAME", "FRAMES", "KEYFRAMES", "PENDING");
    for row in rows {
        println!(
            "{:<10} {:<32} {:>7} {:>10} {:>8}",
            row.stage, row.name, row.frames, row.keyframes, row.pending_upload
        );
    }
    Ok(())
}

pub fn ingest(repo: &AssetRepository, dir: &Path) -> Result<()> {
    let source = DirectorySource::open(dir)
        .with_context(|| format!("cannot read frames from {}", dir.display()))?;
    let mut recorder = Recorder::new(repo.clone(), Box::new(source));
    match recorder.record_all()? {
        Some(name) => {
            println!("Recorded {name}");
            Ok(())
        }
        None => bail!("no images found in {}", dir.display()),
    }
}

pub fn verdict(repo: &AssetRepository, args: &AssetArgs, verdict: Verdict) -> Result<()> {
    let mut slot = Some(open_asset(repo, args)?);
    apply_verdict(&mut slot, verdict)?;
    match slot {
        Some(asset) => println!("{} is now in {}", asset.name(), asset.stage()),
        None => println!("Deleted {}", args.name),
    }
    Ok(())
}

pub fn trim_before(repo: &AssetRepository, args: &FrameArgs) -> Result<()> {
    let mut asset = open_frame(repo, args)?;
    let removed = asset.trim_before(args.index)?;
    println!("Removed {removed} frames from {}", asset.name());
    Ok(())
}

pub fn trim_after(repo: &AssetRepository, args: &FrameArgs) -> Result<()> {
    let mut asset = open_frame(repo, args)?;
    let removed = asset.trim_after(args.index)?;
    println!("Removed {removed} frames from {}", asset.name());
    Ok(())
}

pub fn split(repo: &AssetRepository, args: &FrameArgs) -> Result<()> {
    let mut asset = open_frame(repo, args)?;
    let tail = asset.split(repo, args.index)?;
    println!(
        "Split {} ({} frames) into {} ({} frames)",
        asset.name(),
        asset.frame_count()?,
        tail.name(),
        tail.frame_count()?
    );
    Ok(())
}

pub fn add_keyframe(repo: &AssetRepository, args: &FrameArgs) -> Result<()> {
    let mut asset = open_frame(repo, args)?;
    if !asset.add_keyframe(args.index)? {
        println!("Frame {} of {} is already a keyframe", args.index, asset.name());
    }
    Ok(())
}

pub fn remove_keyframe(repo: &AssetRepository, args: &FrameArgs) -> Result<()> {
    let mut asset = open_asset(repo, &args.asset)?;
    if !asset.remove_keyframe(args.index)? {
        println!("Frame {} of {} is not a keyframe", args.index, asset.name());
    }
    Ok(())
}

pub fn prepare_upload(repo: &AssetRepository, staging_dir: &Path, json: bool) -> Result<()> {
    let report = editor::prepare_upload(repo, staging_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for (asset, index) in &report.skipped {
        println!("Skipped keyframe {index} of {asset}: no such frame");
    }
    println!(
        "Staged {} keyframes from {} clips in {}",
        report.copied.len(),
        report.assets.len(),
        staging_dir.display()
    );
    Ok(())
}

fn open_asset(repo: &AssetRepository, args: &AssetArgs) -> Result<VideoAsset> {
    let stage = match args.stage {
        Some(stage) => stage,
        None => repo
            .locate(&args.name)
            .with_context(|| format!("no clip named '{}'", args.name))?,
    };
    info!(asset = %args.name, stage = %stage, "opening clip");
    Ok(repo.open_asset(stage, &args.name)?)
}

/// Opens the clip and checks that the index addresses one of its frames.
fn open_frame(repo: &AssetRepository, args: &FrameArgs) -> Result<VideoAsset> {
    let asset = open_asset(repo, &args.asset)?;
    let frames = asset.frame_count()?;
    if args.index >= frames {
        bail!("{} has {frames} frames, index {} is out of range", asset.name(), args.index);
    }
    Ok(asset)
}
