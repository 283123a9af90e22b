use std::io::{Cursor, Write};

use tiff::encoder::colortype::{RGB8, RGB16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tracing::debug;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::RgbImage;
use crate::calibration::preview::types::TiffCompression;
use crate::calibration::preview::writer::PreviewWriter;

/// RGB TIFF encoder. Images of up to 8 bits are stored as RGB8, deeper ones
/// as RGB16 with their levels unchanged.
#[derive(Debug, Clone, Default)]
pub struct TiffPreviewWriter {
    compression: TiffCompression,
}

impl TiffPreviewWriter {
    pub fn new(compression: TiffCompression) -> Self {
        Self { compression }
    }

    fn encoder_compression(&self) -> Compression {
        match self.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

impl PreviewWriter for TiffPreviewWriter {
    fn write_preview(&self, image: &RgbImage, output: &mut dyn Write) -> Result<()> {
        debug!(
            "Encoding preview TIFF: {}x{} ({} bits)",
            image.width, image.height, image.bits_per_sample
        );
        let encode_err = |e: tiff::TiffError| CalibrationError::EncodeError(e.to_string());

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(encode_err)?
            .with_compression(self.encoder_compression());

        let (width, height) = (image.width as u32, image.height as u32);
        if image.bits_per_sample <= 8 {
            let bytes: Vec<u8> = image.data.iter().map(|&v| v.min(255) as u8).collect();
            encoder
                .write_image::<RGB8>(width, height, &bytes)
                .map_err(encode_err)?;
        } else {
            encoder
                .write_image::<RGB16>(width, height, &image.data)
                .map_err(encode_err)?;
        }

        output.write_all(&buffer)?;
        Ok(())
    }
}
