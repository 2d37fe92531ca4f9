use crate::dng_pipeline::common::error::Result;
use crate::dng_pipeline::raw::types::{PackRequest, UnpackedPlane};

pub trait RawUnpacker {
    fn unpack(&self, request: &PackRequest<'_>) -> Result<UnpackedPlane>;
}
