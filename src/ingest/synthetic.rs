use anyhow::Result;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::Frame;
use crate::ingest::source::{FrameSource, SourceConfig, SourceStats};

/// Synthetic scene for `stub://` URIs.
///
/// A dark room with a bright block drifting left to right and a little sensor noise.
/// Brightness rises as the block grows, which the luminance depth backend reads as the
/// object getting closer.
pub struct SyntheticSource {
    config: SourceConfig,
    frame_count: u64,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        Self::with_seed(config, 0x5eed)
    }

    pub fn with_seed(config: SourceConfig, seed: u64) -> Self {
        Self {
            config,
            frame_count: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn render(&mut self) -> RgbImage {
        let (w, h) = (self.config.width, self.config.height);
        let phase = (self.frame_count % 120) as f64 / 120.0;
        let side = ((w.min(h) as f64) * (0.2 + 0.3 * phase)) as u32;
        let left = ((w.saturating_sub(side)) as f64 * phase) as u32;
        let top = h.saturating_sub(side) / 2;
        let rng = &mut self.rng;
        RgbImage::from_fn(w, h, |x, y| {
            let noise: u8 = rng.gen_range(0..12);
            let inside = x >= left && x < left + side && y >= top && y < top + side;
            let base = if inside { 200 } else { 30 };
            Rgb([base + noise, base + noise, base + noise / 2])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.config.uri);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        let image = self.render();
        Ok(Frame::from_rgb_image(image).with_sequence(self.frame_count))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            capture_errors: 0,
            uri: self.config.uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_have_configured_size_and_sequence() {
        let mut source = SyntheticSource::new(SourceConfig {
            width: 64,
            height: 48,
            ..SourceConfig::default()
        });
        source.connect().unwrap();
        let first = source.next_frame().unwrap();
        let second = source.next_frame().unwrap();
        assert_eq!((first.width, first.height), (64, 48));
        assert_eq!((first.sequence, second.sequence), (1, 2));
        assert_eq!(source.stats().frames_captured, 2);
    }
}
