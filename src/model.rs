//! Model resource lookup.
//!
//! Each inference component loads one named, precompiled artifact from the models
//! directory at construction time. A missing artifact is a fatal `InitError`.

use std::path::{Path, PathBuf};

use crate::error::InitError;

/// Detection model artifact name.
pub const DETECTION_MODEL: &str = "ObjectDetection.onnx";
/// Class labels for the detection model, one per line.
pub const DETECTION_LABELS: &str = "ObjectDetection.labels";
/// Monocular depth model artifact name.
pub const DEPTH_MODEL: &str = "DepthEstimation.onnx";

/// A located model artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelResource {
    pub name: String,
    pub path: PathBuf,
}

impl ModelResource {
    /// Locate `name` inside `models_dir`.
    pub fn locate(models_dir: &Path, name: &str) -> Result<Self, InitError> {
        let path = models_dir.join(name);
        if !path.is_file() {
            return Err(InitError::ModelNotFound {
                name: name.to_string(),
                path,
            });
        }
        log::info!("model resource '{}' located at {}", name, path.display());
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Wrap a backend load failure for this resource.
    pub fn load_error(&self, source: anyhow::Error) -> InitError {
        InitError::ModelLoad {
            name: self.name.clone(),
            source,
        }
    }
}

/// Read a labels resource: one label per line, blank lines skipped.
pub fn read_labels(resource: &ModelResource) -> Result<Vec<String>, InitError> {
    let raw = std::fs::read_to_string(&resource.path)
        .map_err(|e| resource.load_error(anyhow::anyhow!(e)))?;
    let labels: Vec<String> = raw
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();
    if labels.is_empty() {
        return Err(resource.load_error(anyhow::anyhow!("labels file is empty")));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelResource::locate(dir.path(), DEPTH_MODEL).unwrap_err();
        match err {
            InitError::ModelNotFound { name, path } => {
                assert_eq!(name, DEPTH_MODEL);
                assert_eq!(path, dir.path().join(DEPTH_MODEL));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn labels_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DETECTION_LABELS), "person\n\n chair \ncup\n").unwrap();
        let resource = ModelResource::locate(dir.path(), DETECTION_LABELS).unwrap();
        assert_eq!(read_labels(&resource).unwrap(), vec!["person", "chair", "cup"]);
    }

    #[test]
    fn empty_labels_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DETECTION_LABELS), "\n\n").unwrap();
        let resource = ModelResource::locate(dir.path(), DETECTION_LABELS).unwrap();
        assert!(matches!(
            read_labels(&resource),
            Err(InitError::ModelLoad { .. })
        ));
    }
}
