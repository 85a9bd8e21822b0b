use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use crate::frame::Frame;
use crate::ingest::source::{FrameSource, SourceConfig, SourceStats};

/// Replays still images from a local directory, looping forever.
///
/// JPEG and PNG files are read in file-name order. Undecodable files are reported as
/// capture errors and skipped on the next call.
pub struct ImageDirSource {
    config: SourceConfig,
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    frame_count: u64,
    capture_errors: u64,
}

impl ImageDirSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if config.uri.contains("://") {
            return Err(anyhow!(
                "image directory sources only support local paths (got {})",
                config.uri
            ));
        }
        let dir = PathBuf::from(&config.uri);
        Ok(Self {
            config,
            dir,
            files: Vec::new(),
            cursor: 0,
            frame_count: 0,
            capture_errors: 0,
        })
    }

    fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read image directory {}", dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn name(&self) -> &'static str {
        "image-dir"
    }

    fn connect(&mut self) -> Result<()> {
        let files = Self::scan(&self.dir)?;
        if files.is_empty() {
            return Err(anyhow!("no .jpg or .png images in {}", self.dir.display()));
        }
        log::info!(
            "ImageDirSource: {} images in {}",
            files.len(),
            self.dir.display()
        );
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if self.files.is_empty() {
            return Err(anyhow!("image source {} is not connected", self.config.uri));
        }
        let path = &self.files[self.cursor % self.files.len()];
        self.cursor = (self.cursor + 1) % self.files.len();
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                self.capture_errors += 1;
                return Err(anyhow!("failed to decode {}: {}", path.display(), e));
            }
        };
        self.frame_count += 1;
        Ok(Frame::from_rgb_image(image).with_sequence(self.frame_count))
    }

    fn is_healthy(&self) -> bool {
        !self.files.is_empty()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            capture_errors: self.capture_errors,
            uri: self.config.uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn config(dir: &Path) -> SourceConfig {
        SourceConfig {
            uri: dir.to_string_lossy().into_owned(),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn replays_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbImage::from_pixel(8, 6, Rgb([9, 9, 9]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageDirSource::new(config(dir.path())).unwrap();
        source.connect().unwrap();
        let sizes: Vec<_> = (0..3)
            .map(|_| {
                let f = source.next_frame().unwrap();
                (f.width, f.height, f.sequence)
            })
            .collect();
        assert_eq!(sizes, vec![(8, 6, 1), (4, 2, 2), (8, 6, 3)]);
    }

    #[test]
    fn empty_directory_fails_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageDirSource::new(config(dir.path())).unwrap();
        assert!(source.connect().is_err());
        assert!(!source.is_healthy());
    }

    #[test]
    fn url_schemes_are_rejected() {
        let result = ImageDirSource::new(SourceConfig {
            uri: "rtsp://10.0.0.2/stream".into(),
            ..SourceConfig::default()
        });
        assert!(result.is_err());
    }
}
