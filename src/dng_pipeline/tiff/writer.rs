use std::io::{Seek, Write};

use crate::dng_pipeline::common::error::Result;
use crate::dng_pipeline::raw::types::{CfaPattern, UnpackedPlane};
use crate::dng_pipeline::thumbnail::Thumbnail;

/// Seekable byte sink the DNG encoder writes into.
pub trait TiffOutput: Write + Seek {}

impl<T: Write + Seek> TiffOutput for T {}

pub trait DngWriter {
    fn write_dng(
        &self,
        image: &UnpackedPlane,
        cfa: CfaPattern,
        thumbnail: Option<&Thumbnail<'_>>,
        output: &mut dyn TiffOutput,
    ) -> Result<()>;
}
