//! Frame ingestion.
//!
//! Sources:
//! - `stub://...` synthetic scene (demo and tests)
//! - a local directory of JPEG/PNG stills, replayed in a loop
//!
//! `CameraSession` drives a source on its own thread and hands every frame to a
//! `FrameSink`. Sources never store or transmit frames.

mod image_dir;
mod session;
mod source;
mod synthetic;

pub use image_dir::ImageDirSource;
pub use session::CameraSession;
pub use source::{FrameSink, FrameSource, SourceConfig, SourceStats};
pub use synthetic::SyntheticSource;

use anyhow::Result;

/// Open the source named by `config.uri`.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    if config.uri.starts_with("stub://") {
        Ok(Box::new(SyntheticSource::new(config.clone())))
    } else {
        Ok(Box::new(ImageDirSource::new(config.clone())?))
    }
}
