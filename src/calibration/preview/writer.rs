use std::io::Write;

use crate::calibration::common::error::Result;
use crate::calibration::image::RgbImage;

pub trait PreviewWriter {
    fn write_preview(&self, image: &RgbImage, output: &mut dyn Write) -> Result<()>;
}
