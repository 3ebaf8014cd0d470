//! Directory-backed video assets for the curation pipeline.
//!
//! Every asset is a folder of numbered frame images plus two small integer
//! records (keyframes and already-exported keyframes). Folders live in one of
//! three stage directories under a data root.

use std::path::{Path, PathBuf};
use thiserror::Error;

mod asset;
mod frame_store;
mod keyframes;
mod layout;
mod repository;
mod stage;

pub use asset::VideoAsset;
pub use frame_store::FrameStore;
pub use keyframes::{read_record, write_record, KeyframeSet};
pub use layout::{DataLayout, FrameNaming, KEYFRAMES_RECORD, UPLOADED_RECORD};
pub use repository::AssetRepository;
pub use stage::{ParseStageError, Stage};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("cannot move asset from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },
    #[error("allocation failed: {0}")]
    Allocation(String),
    #[error("i/o failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = AssetError> = std::result::Result<T, E>;

/// Attaches the offending path to a raw `io::Error`.
pub trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub(crate) fn invalid_data(path: &Path, msg: impl Into<String>) -> AssetError {
    AssetError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into()),
    }
}
