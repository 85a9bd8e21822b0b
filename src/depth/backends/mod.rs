pub mod luminance;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use luminance::{LuminanceBackend, UniformBackend};

#[cfg(feature = "backend-tract")]
pub use tract::TractDepthBackend;
