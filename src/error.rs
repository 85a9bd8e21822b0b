//! Fatal initialization errors.
//!
//! Everything else in the pipeline is absorbed locally (empty detections, absent
//! distances). Only these cross the top-level boundary, and they abort startup.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("model resource '{name}' not found at {}", path.display())]
    ModelNotFound { name: String, path: PathBuf },

    #[error("failed to load model '{name}': {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("failed to start {component}: {source}")]
    Startup {
        component: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
