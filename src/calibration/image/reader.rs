use crate::calibration::common::error::Result;
use crate::calibration::image::types::BayerImage;

pub trait RawImageReader {
    fn read_raw(&self, data: &[u8]) -> Result<BayerImage>;
}
