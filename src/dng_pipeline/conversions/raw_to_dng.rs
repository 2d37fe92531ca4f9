use std::io::Write;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::dng_pipeline::{
    common::error::{PackError, Result},
    raw::{CfaPattern, FrameLayout, MipiUnpacker, PackRequest, RawUnpacker},
    thumbnail::{self, Thumbnail},
    tiff::{DngWriter, MemFile, StandardDngWriter},
};

/// Extra virtual-file headroom for the header and tag tables, on top of the
/// pixel and thumbnail payloads.
const DNG_HEADROOM: usize = 1024;

/// A complete DNG file image. The bytes can be written verbatim to a `.dng`
/// file or pushed downstream as-is.
#[derive(Debug, Clone)]
pub struct PackResult {
    pub bytes: Vec<u8>,
}

impl PackResult {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub struct RawToDngPipeline<U: RawUnpacker, W: DngWriter> {
    unpacker: U,
    writer: W,
}

impl RawToDngPipeline<MipiUnpacker, StandardDngWriter> {
    pub fn new() -> Self {
        Self {
            unpacker: MipiUnpacker,
            writer: StandardDngWriter,
        }
    }
}

impl Default for RawToDngPipeline<MipiUnpacker, StandardDngWriter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: RawUnpacker, W: DngWriter> RawToDngPipeline<U, W> {
    pub fn with_custom(unpacker: U, writer: W) -> Self {
        Self { unpacker, writer }
    }

    /// Checks the declared geometry against the supplied buffer before any
    /// allocation happens.
    fn validate(&self, request: &PackRequest<'_>) -> Result<()> {
        let layout = &request.layout;

        if layout.width == 0 || layout.height == 0 {
            return Err(PackError::InvalidRequest(format!(
                "invalid dimensions: {}x{}",
                layout.width, layout.height
            )));
        }

        if layout.cfa_pattern == CfaPattern::Unknown {
            return Err(PackError::InvalidRequest("unknown CFA pattern".to_string()));
        }

        if !matches!(layout.bits_per_pixel, 8 | 10 | 12 | 16) {
            return Err(PackError::InvalidRequest(format!(
                "unsupported bits per pixel: {}",
                layout.bits_per_pixel
            )));
        }

        let min_size = layout
            .min_raw_size()
            .ok_or_else(|| PackError::InvalidRequest("frame geometry overflow".to_string()))?;
        if request.raw.len() < min_size {
            return Err(PackError::InvalidRequest(format!(
                "raw buffer too small: {} bytes, need at least {}",
                request.raw.len(),
                min_size
            )));
        }

        debug!(
            raw_size = request.raw.len(),
            min_size, "pack request validated"
        );
        Ok(())
    }

    /// Packs one raw frame (and optional JPEG thumbnail) into a DNG buffer.
    #[instrument(skip(self, request), fields(raw_size = request.raw.len()))]
    pub fn pack(&self, request: &PackRequest<'_>) -> Result<PackResult> {
        info!(
            width = request.layout.width,
            height = request.layout.height,
            bits_per_pixel = request.layout.bits_per_pixel,
            "starting RAW to DNG pack"
        );

        self.validate(request)?;

        let plane = {
            let _span = tracing::info_span!("unpack_raw").entered();
            self.unpacker.unpack(request)?
        };

        let thumbnail = match request.thumbnail {
            Some(jpeg) => {
                let _span = tracing::info_span!("scan_thumbnail", jpeg_size = jpeg.len()).entered();
                let info = thumbnail::read_header(jpeg)?;
                Some(Thumbnail { jpeg, info })
            }
            None => None,
        };

        let capacity =
            plane.data.len() * 2 + request.thumbnail.map_or(0, |jpeg| jpeg.len()) + DNG_HEADROOM;
        let mut file = MemFile::with_capacity(capacity)
            .map_err(|e| PackError::Allocation(e.to_string()))?;

        {
            let _span = tracing::info_span!("encode_dng").entered();
            self.writer
                .write_dng(&plane, request.layout.cfa_pattern, thumbnail.as_ref(), &mut file)?;
        }

        info!(bytes = file.len(), "DNG pack complete");
        Ok(PackResult {
            bytes: file.into_bytes(),
        })
    }

    /// Reads a packed raw dump (and optional thumbnail JPEG) from disk and
    /// writes the resulting DNG next to it.
    #[instrument(skip(self, raw_path, thumbnail_path, output_path))]
    pub fn pack_file<P, Q, R>(
        &self,
        raw_path: P,
        thumbnail_path: Option<Q>,
        output_path: R,
        layout: FrameLayout,
    ) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let raw_path = raw_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %raw_path.display(),
            output = %output_path.display(),
            "packing file"
        );

        let raw = std::fs::read(raw_path)?;
        let jpeg = match thumbnail_path {
            Some(path) => Some(std::fs::read(path.as_ref())?),
            None => None,
        };

        let result = self.pack(&PackRequest {
            raw: &raw,
            layout,
            thumbnail: jpeg.as_deref(),
        })?;

        let mut output = std::fs::File::create(output_path)?;
        output.write_all(result.as_bytes())?;

        Ok(())
    }
}
