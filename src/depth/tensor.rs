use anyhow::{anyhow, Result};

/// Inverse-depth map produced by a depth model.
///
/// Rank 2 to 4. The trailing two dimensions are height × width; leading dimensions are
/// batch/channel axes and only index 0 is read. Element strides are kept so that
/// non-contiguous layouts are reduced without copying.
#[derive(Clone, Debug)]
pub struct DepthTensor {
    data: Vec<f32>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl DepthTensor {
    /// Wrap a row-major buffer.
    pub fn contiguous(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let mut strides = vec![1usize; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self::strided(shape, strides, data)
    }

    /// Wrap a buffer with explicit element strides.
    pub fn strided(shape: Vec<usize>, strides: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        if !(2..=4).contains(&shape.len()) {
            return Err(anyhow!("depth tensor rank must be 2..=4, got {}", shape.len()));
        }
        if strides.len() != shape.len() {
            return Err(anyhow!(
                "stride count {} does not match rank {}",
                strides.len(),
                shape.len()
            ));
        }
        if shape.iter().any(|&dim| dim == 0) {
            return Err(anyhow!("depth tensor has an empty dimension: {:?}", shape));
        }
        let rank = shape.len();
        let last = (shape[rank - 2] - 1) * strides[rank - 2] + (shape[rank - 1] - 1) * strides[rank - 1];
        if last >= data.len() {
            return Err(anyhow!(
                "strides {:?} address element {} beyond buffer of {}",
                strides,
                last,
                data.len()
            ));
        }
        Ok(Self {
            data,
            shape,
            strides,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn height(&self) -> usize {
        self.shape[self.shape.len() - 2]
    }

    pub fn width(&self) -> usize {
        self.shape[self.shape.len() - 1]
    }

    fn at(&self, y: usize, x: usize) -> f32 {
        let rank = self.shape.len();
        self.data[y * self.strides[rank - 2] + x * self.strides[rank - 1]]
    }

    /// Mean over rows `H/4..3H/4` and columns `W/4..3W/4` (half-open).
    ///
    /// The border is excluded to suppress edge noise and background bleed from a loose
    /// bounding box. Returns `None` when the patch is empty (maps narrower than 2).
    pub fn central_patch_mean(&self) -> Option<f32> {
        let (h, w) = (self.height(), self.width());
        let (y0, y1) = (h / 4, 3 * h / 4);
        let (x0, x1) = (w / 4, 3 * w / 4);
        if y1 <= y0 || x1 <= x0 {
            return None;
        }
        let mut sum = 0.0f64;
        for y in y0..y1 {
            for x in x0..x1 {
                sum += self.at(y, x) as f64;
            }
        }
        let count = ((y1 - y0) * (x1 - x0)) as f64;
        Some((sum / count) as f32)
    }
}
