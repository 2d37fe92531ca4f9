//! JPEG thumbnail header scan.
//!
//! The thumbnail is embedded in the DNG verbatim, so only the frame header
//! is needed: width, height and component count populate the reduced-image
//! directory. The scan walks the marker stream to the first SOF segment and
//! never decompresses anything.

use tracing::debug;

use crate::dng_pipeline::common::error::{PackError, Result};

/// Frame properties read from a JPEG SOF marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

/// A caller-supplied JPEG thumbnail paired with its scanned header info.
#[derive(Debug, Clone, Copy)]
pub struct Thumbnail<'a> {
    pub jpeg: &'a [u8],
    pub info: JpegInfo,
}

fn be16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

/// Scans the marker stream for the first start-of-frame segment.
pub fn read_header(data: &[u8]) -> Result<JpegInfo> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(PackError::Thumbnail("missing SOI marker".to_string()));
    }

    let mut pos = 2;
    loop {
        if pos >= data.len() {
            return Err(PackError::Thumbnail("truncated marker stream".to_string()));
        }
        if data[pos] != 0xFF {
            return Err(PackError::Thumbnail(format!(
                "invalid marker byte {:#04x} at offset {}",
                data[pos], pos
            )));
        }

        // Skip fill bytes before the marker code.
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(PackError::Thumbnail("truncated marker stream".to_string()));
        }
        let marker = data[pos];
        pos += 1;

        match marker {
            // Standalone markers carry no length field.
            0x01 | 0xD0..=0xD7 => continue,
            // Entropy-coded data or end of image before any frame header.
            0xD9 | 0xDA => {
                return Err(PackError::Thumbnail("no SOF marker before scan data".to_string()));
            }
            _ => {
                if pos + 2 > data.len() {
                    return Err(PackError::Thumbnail("truncated segment length".to_string()));
                }
                let segment_len = be16(data, pos) as usize;
                if segment_len < 2 || pos + segment_len > data.len() {
                    return Err(PackError::Thumbnail(format!(
                        "segment {:#04x} overruns buffer",
                        marker
                    )));
                }

                // SOF0..SOF15, except the DHT/JPG/DAC codes in that range.
                if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
                    // Segment payload: precision, height, width, components.
                    if segment_len < 8 {
                        return Err(PackError::Thumbnail("SOF segment too short".to_string()));
                    }
                    let height = u32::from(be16(data, pos + 3));
                    let width = u32::from(be16(data, pos + 5));
                    let components = data[pos + 7];
                    if width == 0 || height == 0 || components == 0 {
                        return Err(PackError::Thumbnail(format!(
                            "invalid frame header: {}x{}, {} components",
                            width, height, components
                        )));
                    }

                    debug!(width, height, components, "parsed JPEG thumbnail header");
                    return Ok(JpegInfo {
                        width,
                        height,
                        components,
                    });
                }

                pos += segment_len;
            }
        }
    }
}
