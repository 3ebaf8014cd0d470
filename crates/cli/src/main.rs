use anyhow::{Context, Result};
use assets::{AssetRepository, Stage};
use clap::{Args, Parser, Subcommand};
use editor::{EditorConfig, Verdict};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "clipline")]
#[command(about = "Record, curate and stage video clips for labelling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to <config dir>/clipline/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the stage folders
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Playback and capture rate
    #[arg(long, global = true)]
    fps: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive workflow menu (default)
    Interactive {
        /// Directory of images the recorder replays as its camera
        #[arg(long)]
        capture: Option<PathBuf>,
    },

    /// List assets with their frame and keyframe counts
    List {
        /// Only this stage
        #[arg(long)]
        stage: Option<Stage>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record a directory of images as a new clip in `new`
    Ingest {
        /// Directory of images, recorded in file-name order
        dir: PathBuf,
    },

    /// Move a clip one stage forward
    Approve(AssetArgs),

    /// Delete a new clip, or send a verified one back to `new`
    Reject(AssetArgs),

    /// Delete every frame before INDEX
    TrimBefore(FrameArgs),

    /// Delete every frame after INDEX
    TrimAfter(FrameArgs),

    /// Move every frame after INDEX into a new clip
    Split(FrameArgs),

    /// Add or remove keyframes
    Keyframe {
        #[command(subcommand)]
        action: KeyframeAction,
    },

    /// Export pending keyframes of verified clips into the staging directory
    PrepareUpload {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum KeyframeAction {
    Add(FrameArgs),
    Remove(FrameArgs),
}

#[derive(Args)]
struct AssetArgs {
    /// Clip name
    name: String,

    /// Stage holding the clip; looked up when omitted
    #[arg(long)]
    stage: Option<Stage>,
}

#[derive(Args)]
struct FrameArgs {
    #[command(flatten)]
    asset: AssetArgs,

    /// Zero-based frame index
    index: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let command = cli.command.unwrap_or(Commands::Interactive { capture: None });

    std::fs::create_dir_all(&config.data_root)
        .with_context(|| format!("cannot create {}", config.data_root.display()))?;
    // the terminal belongs to the editor in interactive mode
    let log_file = matches!(command, Commands::Interactive { .. })
        .then(|| config.data_root.join("clipline.log"));
    init_logging(cli.verbose, log_file.as_deref())?;

    let repo = AssetRepository::open(config.layout())?;
    info!(data_root = %config.data_root.display(), "opened data root");

    match command {
        Commands::Interactive { capture } => {
            terminal::run_interactive(&config, &repo, capture.as_deref())
        }
        Commands::List { stage, json } => commands::list(&repo, stage, json),
        Commands::Ingest { dir } => commands::ingest(&repo, &dir),
        Commands::Approve(args) => commands::verdict(&repo, &args, Verdict::Approve),
        Commands::Reject(args) => commands::verdict(&repo, &args, Verdict::Reject),
        Commands::TrimBefore(args) => commands::trim_before(&repo, &args),
        Commands::TrimAfter(args) => commands::trim_after(&repo, &args),
        Commands::Split(args) => commands::split(&repo, &args),
        Commands::Keyframe { action } => match action {
            KeyframeAction::Add(args) => commands::add_keyframe(&repo, &args),
            KeyframeAction::Remove(args) => commands::remove_keyframe(&repo, &args),
        },
        Commands::PrepareUpload { json } => {
            commands::prepare_upload(&repo, &config.staging_dir(), json)
        }
    }
}

/// Defaults, then the config file, then command-line overrides.
fn load_config(cli: &Cli) -> Result<EditorConfig> {
    let path = cli.config.clone().or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("clipline").join("config.json"))
            .filter(|path| path.is_file())
    });
    let mut config = match &path {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if let Some(root) = &cli.data_root {
        config.data_root = root.clone();
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
