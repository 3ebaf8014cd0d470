//! Interactive curation on top of the `assets` crate: the editing session
//! cursor, the editor strategies, the selection wizard and the polling driver
//! that ties them to an input source and a display.

use thiserror::Error;

mod auditer;
mod config;
mod driver;
mod event;
mod frame_editor;
mod keyframe_editor;
mod labels;
mod recorder;
mod session;
mod strategy;
mod upload;
mod wizard;
mod workbench;

pub use auditer::{apply_verdict, Auditer, Verdict};
pub use config::{default_data_root, EditorConfig};
pub use driver::{drive, DisplaySink, EventSource, Flow, Screen, View};
pub use event::{resolve_key, InputEvent, Key, KeyMode};
pub use frame_editor::FrameEditor;
pub use keyframe_editor::KeyframeEditor;
pub use labels::{LabelProjector, PendingProjector, ProjectionReport};
pub use recorder::{DirectorySource, FrameSource, Recorder};
pub use session::EditorSession;
pub use strategy::{strategy_for, EditorKind, EditorStrategy};
pub use upload::{prepare_upload, UploadReport};
pub use wizard::{Selection, WizardOutcome, WizardStep, WorkflowWizard};
pub use workbench::Workbench;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Asset(#[from] assets::AssetError),
    #[error("frame source failed: {0}")]
    Source(#[source] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
