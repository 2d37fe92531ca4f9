//! MIPI CSI-2 packed raw unpacker.
//!
//! Converts 8/10/12/16-bit packed scanlines into 16-bit samples. The bit
//! placement matches what downstream DNG consumers of this format expect:
//! 10-bit samples occupy bits [2:11] of the output word, 12-bit samples
//! bits [4:15], 8-bit samples stay in the low byte, 16-bit samples are read
//! as little-endian pairs.

use tracing::debug;

use crate::dng_pipeline::common::error::{PackError, Result};
use crate::dng_pipeline::raw::types::{PackRequest, UnpackedPlane};
use crate::dng_pipeline::raw::unpacker::RawUnpacker;

/// Byte shortfall detected while unpacking one scanline.
struct LineTruncated {
    needed: usize,
    available: usize,
}

type LineResult = std::result::Result<(), LineTruncated>;

fn unpack_line_raw8(src: &[u8], dst: &mut [u16]) -> LineResult {
    if src.len() < dst.len() {
        return Err(LineTruncated {
            needed: dst.len(),
            available: src.len(),
        });
    }

    for (out, byte) in dst.iter_mut().zip(src) {
        *out = u16::from(*byte);
    }

    Ok(())
}

fn unpack_line_raw10(src: &[u8], dst: &mut [u16]) -> LineResult {
    let width = dst.len();
    let mut pos = 0;
    let mut x = 0;

    // Packed RAW10 group layout:
    // Byte 0 = P0[2:9]
    // Byte 1 = P1[2:9]
    // Byte 2 = P2[2:9]
    // Byte 3 = P3[2:9]
    // Byte 4 = P0[0:1] | P1[0:1] | P2[0:1] | P3[0:1]
    while x + 4 <= width {
        if pos + 5 > src.len() {
            return Err(LineTruncated {
                needed: pos + 5,
                available: src.len(),
            });
        }

        let lows = src[pos + 4];
        dst[x] = (u16::from(src[pos]) << 2) | u16::from(lows & 0x03);
        dst[x + 1] = (u16::from(src[pos + 1]) << 2) | u16::from((lows >> 2) & 0x03);
        dst[x + 2] = (u16::from(src[pos + 2]) << 2) | u16::from((lows >> 4) & 0x03);
        dst[x + 3] = (u16::from(src[pos + 3]) << 2) | u16::from((lows >> 6) & 0x03);

        x += 4;
        pos += 5;
    }

    // A trailing group of 1..=3 pixels is packed as that many high bytes
    // followed by one shared low-bits byte.
    let rem = width - x;
    if rem > 0 {
        let needed = pos + rem + 1;
        if needed > src.len() {
            return Err(LineTruncated {
                needed,
                available: src.len(),
            });
        }

        let lows = src[pos + rem];
        for i in 0..rem {
            dst[x + i] = (u16::from(src[pos + i]) << 2) | u16::from((lows >> (2 * i)) & 0x03);
        }
    }

    Ok(())
}

fn unpack_line_raw12(src: &[u8], dst: &mut [u16]) -> LineResult {
    let width = dst.len();
    let mut pos = 0;
    let mut x = 0;

    // Packed RAW12 group layout:
    // Byte 0 = P0[4:11]
    // Byte 1 = P1[4:11]
    // Byte 2 = P0[0:3] | P1[0:3]
    while x + 2 <= width {
        if pos + 3 > src.len() {
            return Err(LineTruncated {
                needed: pos + 3,
                available: src.len(),
            });
        }

        let lows = src[pos + 2];
        dst[x] = (u16::from(src[pos]) << 4) | u16::from(lows & 0x0F);
        dst[x + 1] = (u16::from(src[pos + 1]) << 4) | u16::from((lows >> 4) & 0x0F);

        x += 2;
        pos += 3;
    }

    // Trailing odd pixel: one high byte plus its low nibble.
    if x < width {
        if pos + 2 > src.len() {
            return Err(LineTruncated {
                needed: pos + 2,
                available: src.len(),
            });
        }

        dst[x] = (u16::from(src[pos]) << 4) | u16::from(src[pos + 1] & 0x0F);
    }

    Ok(())
}

fn unpack_line_raw16(src: &[u8], dst: &mut [u16]) -> LineResult {
    let needed = dst.len() * 2;
    if src.len() < needed {
        return Err(LineTruncated {
            needed,
            available: src.len(),
        });
    }

    for (out, pair) in dst.iter_mut().zip(src.chunks_exact(2)) {
        *out = u16::from_le_bytes([pair[0], pair[1]]);
    }

    Ok(())
}

/// Unpacks MIPI CSI-2 packed scanlines row by row using the caller's
/// declared stride.
pub struct MipiUnpacker;

impl RawUnpacker for MipiUnpacker {
    fn unpack(&self, request: &PackRequest<'_>) -> Result<UnpackedPlane> {
        let layout = &request.layout;
        let width = layout.width as usize;
        let height = layout.height as usize;
        let stride = layout.stride as usize;

        let unpack_line = match layout.bits_per_pixel {
            8 => unpack_line_raw8,
            10 => unpack_line_raw10,
            12 => unpack_line_raw12,
            16 => unpack_line_raw16,
            bpp => {
                return Err(PackError::InvalidRequest(format!(
                    "unsupported bits per pixel: {}",
                    bpp
                )));
            }
        };

        debug!(
            width,
            height,
            bits_per_pixel = layout.bits_per_pixel,
            stride,
            "unpacking raw frame"
        );

        let pixels = width
            .checked_mul(height)
            .ok_or_else(|| PackError::InvalidRequest("frame geometry overflow".to_string()))?;

        let mut data = Vec::new();
        data.try_reserve_exact(pixels)
            .map_err(|e| PackError::Allocation(format!("unpacked plane: {}", e)))?;
        data.resize(pixels, 0u16);

        for y in 0..height {
            let start = y.saturating_mul(stride).min(request.raw.len());
            let end = start.saturating_add(stride).min(request.raw.len());
            let line = &request.raw[start..end];

            unpack_line(line, &mut data[y * width..(y + 1) * width]).map_err(|e| {
                PackError::Unpack {
                    row: y as u32,
                    needed: e.needed,
                    available: e.available,
                }
            })?;
        }

        Ok(UnpackedPlane {
            width: layout.width,
            height: layout.height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dng_pipeline::raw::types::{CfaPattern, FrameLayout};

    fn request<'a>(raw: &'a [u8], width: u32, height: u32, bpp: u32, stride: u32) -> PackRequest<'a> {
        PackRequest {
            raw,
            layout: FrameLayout {
                width,
                height,
                bits_per_pixel: bpp,
                stride,
                cfa_pattern: CfaPattern::Rggb,
            },
            thumbnail: None,
        }
    }

    /// Packs 10-bit samples into the 5-bytes-per-4-pixels wire format,
    /// including the short trailing group.
    fn pack_raw10(samples: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for group in samples.chunks(4) {
            let mut lows = 0u8;
            for (i, &s) in group.iter().enumerate() {
                out.push((s >> 2) as u8);
                lows |= ((s & 0x03) as u8) << (2 * i);
            }
            out.push(lows);
        }
        out
    }

    /// Packs 12-bit samples into the 3-bytes-per-2-pixels wire format.
    fn pack_raw12(samples: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for pair in samples.chunks(2) {
            out.push((pair[0] >> 4) as u8);
            if pair.len() == 2 {
                out.push((pair[1] >> 4) as u8);
                out.push(((pair[0] & 0x0F) | ((pair[1] & 0x0F) << 4)) as u8);
            } else {
                out.push((pair[0] & 0x0F) as u8);
            }
        }
        out
    }

    #[test]
    fn test_raw8_values_stay_unshifted() {
        let src = [0u8, 1, 127, 255];
        let plane = MipiUnpacker.unpack(&request(&src, 4, 1, 8, 4)).unwrap();
        assert_eq!(plane.data, vec![0, 1, 127, 255]);
    }

    #[test]
    fn test_raw16_little_endian() {
        let src = [0x34, 0x12, 0xFF, 0xFF, 0x00, 0x80];
        let plane = MipiUnpacker.unpack(&request(&src, 3, 1, 16, 6)).unwrap();
        assert_eq!(plane.data, vec![0x1234, 0xFFFF, 0x8000]);
    }

    #[test]
    fn test_raw10_round_trip() {
        let samples: Vec<u16> = vec![0, 1, 2, 3, 1023, 512, 770, 5, 681, 341, 682, 42];
        let packed = pack_raw10(&samples);
        let plane = MipiUnpacker
            .unpack(&request(&packed, 12, 1, 10, packed.len() as u32))
            .unwrap();
        assert_eq!(plane.data, samples);
    }

    #[test]
    fn test_raw10_round_trip_partial_groups() {
        for rem in 1..=3usize {
            let samples: Vec<u16> = (0..(4 + rem) as u16).map(|i| 1023 - i * 7).collect();
            let packed = pack_raw10(&samples);
            assert_eq!(packed.len(), 5 + rem + 1);
            let plane = MipiUnpacker
                .unpack(&request(&packed, samples.len() as u32, 1, 10, packed.len() as u32))
                .unwrap();
            assert_eq!(plane.data, samples);
        }
    }

    #[test]
    fn test_raw12_round_trip() {
        let samples: Vec<u16> = vec![0, 4095, 2048, 15, 16, 255, 256, 4094];
        let packed = pack_raw12(&samples);
        let plane = MipiUnpacker
            .unpack(&request(&packed, 8, 1, 12, packed.len() as u32))
            .unwrap();
        assert_eq!(plane.data, samples);
    }

    #[test]
    fn test_raw12_round_trip_odd_width() {
        let samples: Vec<u16> = vec![4095, 1, 2730];
        let packed = pack_raw12(&samples);
        assert_eq!(packed.len(), 5);
        let plane = MipiUnpacker
            .unpack(&request(&packed, 3, 1, 12, packed.len() as u32))
            .unwrap();
        assert_eq!(plane.data, samples);
    }

    #[test]
    fn test_exact_minimum_line_succeeds_one_byte_short_fails() {
        // (bpp, width, minimum packed bytes for one row)
        let cases = [(8, 7, 7), (10, 7, 9), (10, 8, 10), (12, 5, 8), (16, 7, 14)];
        for (bpp, width, min_bytes) in cases {
            let exact = vec![0u8; min_bytes];
            assert!(
                MipiUnpacker
                    .unpack(&request(&exact, width, 1, bpp, min_bytes as u32))
                    .is_ok(),
                "bpp={} width={} should accept {} bytes",
                bpp,
                width,
                min_bytes
            );

            let short = vec![0u8; min_bytes - 1];
            let err = MipiUnpacker
                .unpack(&request(&short, width, 1, bpp, (min_bytes - 1) as u32))
                .unwrap_err();
            assert!(
                matches!(err, PackError::Unpack { row: 0, .. }),
                "bpp={} width={} should reject {} bytes",
                bpp,
                width,
                min_bytes - 1
            );
        }
    }

    #[test]
    fn test_error_reports_offending_row() {
        // Two full rows plus a truncated third one.
        let src = vec![0u8; 2 * 8 + 3];
        let err = MipiUnpacker.unpack(&request(&src, 4, 3, 16, 8)).unwrap_err();
        assert!(matches!(err, PackError::Unpack { row: 2, .. }));
    }

    #[test]
    fn test_stride_padding_is_skipped() {
        // 2x2 frame, 16-bit, rows padded to 8 bytes.
        let mut src = vec![0u8; 16];
        src[0] = 0x01; // row 0: 0x0001, 0x0002
        src[2] = 0x02;
        src[8] = 0x03; // row 1: 0x0003, 0x0004
        src[10] = 0x04;
        let plane = MipiUnpacker.unpack(&request(&src, 2, 2, 16, 8)).unwrap();
        assert_eq!(plane.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unsupported_bit_depth_is_invalid_request() {
        let src = vec![0u8; 64];
        let err = MipiUnpacker.unpack(&request(&src, 4, 4, 14, 8)).unwrap_err();
        assert!(matches!(err, PackError::InvalidRequest(_)));
    }
}
