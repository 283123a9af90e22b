//! Chart patch geometry and per-patch channel averaging

mod averager;
pub mod types;

pub use averager::{PatchAverages, average_patches};
pub(crate) use averager::mean;
pub use types::{PatchRect, PatchSet};
