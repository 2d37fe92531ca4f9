//! DNG container assembly.
//!
//! Emits a classic little-endian TIFF with the raw CFA plane as the primary
//! image and, when supplied, the JPEG thumbnail as a reduced-image IFD0 that
//! references the raw directory through a SubIFDs entry. The thumbnail
//! bytes are embedded verbatim; the raw plane is stored uncompressed as
//! 16-bit samples in a single strip.

use std::io::{self, Seek, Write};

use tracing::debug;

use crate::dng_pipeline::common::error::{PackError, Result};
use crate::dng_pipeline::raw::types::{CfaPattern, UnpackedPlane};
use crate::dng_pipeline::thumbnail::Thumbnail;
use crate::dng_pipeline::tiff::directory::{DirectoryWriter, TiffWriter};
use crate::dng_pipeline::tiff::types::*;
use crate::dng_pipeline::tiff::writer::{DngWriter, TiffOutput};

/// Fixed origin identification written into every file.
const MAKE: &str = "DngPack Camera";
const MODEL: &str = "DngPack Sensor";
const UNIQUE_CAMERA_MODEL: &str = "CFA Virtual";

/// Lowest DNG version the emitted tag set conforms to.
const DNG_VERSION: [u8; 4] = [1, 4, 0, 0];

const WHITE_LEVEL: u32 = 65535;

fn encode_error(err: io::Error) -> PackError {
    if err.kind() == io::ErrorKind::OutOfMemory {
        PackError::Allocation(err.to_string())
    } else {
        PackError::Encode(err.to_string())
    }
}

pub struct StandardDngWriter;

impl StandardDngWriter {
    /// Writes the plane as one uncompressed strip, scanline by scanline,
    /// and returns the strip offset and byte count.
    fn write_raw_strip<W: Write + Seek>(
        tiff: &mut TiffWriter<W>,
        image: &UnpackedPlane,
    ) -> io::Result<(u32, u32)> {
        tiff.align_word()?;
        let offset = tiff.position()?;

        let mut row_bytes = vec![0u8; image.width as usize * 2];
        for row in image.rows() {
            for (dst, sample) in row_bytes.chunks_exact_mut(2).zip(row) {
                dst.copy_from_slice(&sample.to_le_bytes());
            }
            tiff.write_bytes(&row_bytes)?;
        }

        let byte_count = u32::try_from(image.data.len() as u64 * 2)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "strip exceeds 4 GiB"))?;
        Ok((offset, byte_count))
    }

    fn build_raw_directory<W: Write + Seek>(
        tiff: &mut TiffWriter<W>,
        image: &UnpackedPlane,
        pattern: [u8; 4],
        strip: (u32, u32),
    ) -> io::Result<u32> {
        let mut dir = DirectoryWriter::new();

        dir.set_tag(TAG_NEW_SUBFILE_TYPE, FILETYPE_PRIMARY_IMAGE);
        dir.set_tag(TAG_IMAGE_WIDTH, image.width);
        dir.set_tag(TAG_IMAGE_LENGTH, image.height);
        dir.set_tag(TAG_SAMPLES_PER_PIXEL, 1u16);
        // The plane is always promoted to 16 bits, whatever the packed depth.
        dir.set_tag(TAG_BITS_PER_SAMPLE, 16u16);
        dir.set_tag(TAG_COMPRESSION, COMPRESSION_NONE);
        dir.set_tag(TAG_PHOTOMETRIC, PHOTOMETRIC_CFA);
        dir.set_tag(TAG_PLANAR_CONFIG, PLANAR_CONFIG_CONTIG);
        dir.set_tag(TAG_ORIENTATION, ORIENTATION_TOPLEFT);
        dir.set_tag(TAG_SAMPLE_FORMAT, SAMPLE_FORMAT_UINT);

        dir.set_tag(TAG_ROWS_PER_STRIP, image.height);
        dir.set_tag(TAG_STRIP_OFFSETS, strip.0);
        dir.set_tag(TAG_STRIP_BYTE_COUNTS, strip.1);

        dir.set_tag(TAG_CFA_REPEAT_PATTERN_DIM, Value::Short(vec![2, 2]));
        dir.set_tag(TAG_CFA_PATTERN, Value::Byte(pattern.to_vec()));
        dir.set_tag(TAG_CFA_LAYOUT, CFA_LAYOUT_RECTANGULAR);

        dir.set_tag(TAG_MAKE, MAKE);
        dir.set_tag(TAG_MODEL, MODEL);
        dir.set_tag(TAG_UNIQUE_CAMERA_MODEL, UNIQUE_CAMERA_MODEL);

        dir.set_tag(TAG_DNG_VERSION, Value::Byte(DNG_VERSION.to_vec()));
        dir.set_tag(TAG_DNG_BACKWARD_VERSION, Value::Byte(DNG_VERSION.to_vec()));

        // No per-sensor calibration is modeled: full-range levels and a
        // neutral as-shot white balance.
        dir.set_tag(TAG_BLACK_LEVEL, Value::Rational(vec![(0, 1)]));
        dir.set_tag(TAG_WHITE_LEVEL, WHITE_LEVEL);
        dir.set_tag(TAG_AS_SHOT_NEUTRAL, Value::Rational(vec![(1, 1); 3]));

        dir.build(tiff)
    }

    fn build_thumbnail_directory<W: Write + Seek>(
        tiff: &mut TiffWriter<W>,
        thumbnail: &Thumbnail<'_>,
        strip_offset: u32,
        raw_ifd_offset: u32,
    ) -> io::Result<u32> {
        let info = &thumbnail.info;
        let samples = u16::from(info.components);
        let mut dir = DirectoryWriter::new();

        dir.set_tag(TAG_NEW_SUBFILE_TYPE, FILETYPE_REDUCED_IMAGE);
        dir.set_tag(TAG_IMAGE_WIDTH, info.width);
        dir.set_tag(TAG_IMAGE_LENGTH, info.height);
        dir.set_tag(
            TAG_BITS_PER_SAMPLE,
            Value::Short(vec![8; info.components as usize]),
        );
        dir.set_tag(TAG_SAMPLES_PER_PIXEL, samples);
        dir.set_tag(TAG_COMPRESSION, COMPRESSION_JPEG);
        dir.set_tag(TAG_PHOTOMETRIC, PHOTOMETRIC_YCBCR);
        dir.set_tag(TAG_ORIENTATION, ORIENTATION_TOPLEFT);
        dir.set_tag(TAG_PLANAR_CONFIG, PLANAR_CONFIG_CONTIG);
        dir.set_tag(TAG_ROWS_PER_STRIP, info.height);

        dir.set_tag(TAG_STRIP_OFFSETS, strip_offset);
        dir.set_tag(TAG_STRIP_BYTE_COUNTS, thumbnail.jpeg.len() as u32);

        dir.set_tag(TAG_SUB_IFDS, raw_ifd_offset);

        dir.build(tiff)
    }
}

impl DngWriter for StandardDngWriter {
    fn write_dng(
        &self,
        image: &UnpackedPlane,
        cfa: CfaPattern,
        thumbnail: Option<&Thumbnail<'_>>,
        output: &mut dyn TiffOutput,
    ) -> Result<()> {
        let pattern = cfa
            .plane_pattern()
            .ok_or_else(|| PackError::InvalidRequest("unknown CFA pattern".to_string()))?;

        debug!(
            width = image.width,
            height = image.height,
            thumbnail = thumbnail.is_some(),
            "encoding DNG"
        );

        let mut tiff = TiffWriter::new(output).map_err(encode_error)?;

        // Image data first; the directories referencing it go at the end.
        let thumbnail_strip = match thumbnail {
            Some(thumb) => Some(tiff.write_strip(thumb.jpeg).map_err(encode_error)?),
            None => None,
        };
        let raw_strip = Self::write_raw_strip(&mut tiff, image).map_err(encode_error)?;

        let raw_ifd = Self::build_raw_directory(&mut tiff, image, pattern, raw_strip)
            .map_err(encode_error)?;

        // With a thumbnail the reduced image becomes IFD0 and chains the raw
        // directory as its SubIFD; otherwise the raw directory is IFD0.
        let ifd0 = match (thumbnail, thumbnail_strip) {
            (Some(thumb), Some(strip_offset)) => {
                Self::build_thumbnail_directory(&mut tiff, thumb, strip_offset, raw_ifd)
                    .map_err(encode_error)?
            }
            _ => raw_ifd,
        };

        tiff.finish(ifd0).map_err(encode_error)?;
        Ok(())
    }
}
