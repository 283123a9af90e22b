use crate::calibration::image::RgbImage;

pub const INPUT_PREVIEW_FILE: &str = "Input_Image_without_CCM.tiff";
pub const OUTPUT_PREVIEW_FILE: &str = "Output_Image_with_CCM.tiff";

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

/// The chart as loaded and the chart after correction.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewPair {
    pub input: RgbImage,
    pub output: RgbImage,
}
