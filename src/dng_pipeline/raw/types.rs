//! Input-side types for the packing pipeline

use std::str::FromStr;

/// 2x2 Bayer color filter arrangement of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfaPattern {
    Rggb,
    Bggr,
    Gbrg,
    Grbg,
    /// Pattern could not be determined; packing must be refused.
    Unknown,
}

impl CfaPattern {
    /// DNG color-plane indices (0 = R, 1 = G, 2 = B) for the four CFA
    /// positions in row-major order, or `None` for [`CfaPattern::Unknown`].
    pub fn plane_pattern(&self) -> Option<[u8; 4]> {
        match self {
            CfaPattern::Rggb => Some([0, 1, 1, 2]),
            CfaPattern::Bggr => Some([2, 1, 1, 0]),
            CfaPattern::Gbrg => Some([1, 2, 0, 1]),
            CfaPattern::Grbg => Some([1, 0, 2, 1]),
            CfaPattern::Unknown => None,
        }
    }
}

impl FromStr for CfaPattern {
    type Err = String;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match name {
            "rggb" => Self::Rggb,
            "bggr" => Self::Bggr,
            "gbrg" => Self::Gbrg,
            "grbg" => Self::Grbg,
            _ => return Err(format!("Unknown CFA pattern: {}", name)),
        })
    }
}

/// Geometry and packing description of one raw sensor frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameLayout {
    /// Width of the frame in pixels
    pub width: u32,
    /// Height of the frame in pixels
    pub height: u32,
    /// Packed bit depth, one of 8, 10, 12 or 16
    pub bits_per_pixel: u32,
    /// Bytes from the start of one packed row to the start of the next
    pub stride: u32,
    /// Sensor CFA arrangement
    pub cfa_pattern: CfaPattern,
}

impl FrameLayout {
    /// Minimum number of input bytes the declared geometry and bit depth
    /// imply. `None` for an unsupported bit depth or arithmetic overflow.
    pub fn min_raw_size(&self) -> Option<usize> {
        let pixels = (self.width as usize).checked_mul(self.height as usize)?;
        match self.bits_per_pixel {
            8 => Some(pixels),
            10 => (pixels / 4).checked_mul(5),
            12 => (pixels / 2).checked_mul(3),
            16 => pixels.checked_mul(2),
            _ => None,
        }
    }
}

/// One packing request. The engine only borrows the buffers for the
/// duration of a single `pack` call.
#[derive(Debug, Clone, Copy)]
pub struct PackRequest<'a> {
    /// MIPI-packed raw pixel data
    pub raw: &'a [u8],
    /// Geometry and packing description of `raw`
    pub layout: FrameLayout,
    /// Optional baseline-JPEG thumbnail, embedded verbatim when present
    pub thumbnail: Option<&'a [u8]>,
}

/// Raw frame unpacked to one 16-bit sample per pixel, row-major.
#[derive(Debug, Clone)]
pub struct UnpackedPlane {
    /// Width of the plane in pixels
    pub width: u32,
    /// Height of the plane in pixels
    pub height: u32,
    /// `width * height` samples
    pub data: Vec<u16>,
}

impl UnpackedPlane {
    pub fn rows(&self) -> impl Iterator<Item = &[u16]> {
        self.data.chunks_exact(self.width as usize)
    }
}
