//! # Sample Format Converter
//!
//! Copies Symphonia audio buffers into planar `f32` PCM blocks.

use super::PcmBlock;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Normalizes decoded audio of any sample format to planar `f32`.
///
/// The Vorbis decoder emits `f32` directly, but every buffer variant is
/// handled so a buffer is never silently dropped.
pub struct SampleConverter;

impl SampleConverter {
    /// Append the planes of `buffer` to `block`.
    ///
    /// `block` must already be prepared with the stream channel count. Planes
    /// beyond the block's channel count are ignored and missing planes stay
    /// empty; the session rejects such a block as non-rectangular.
    ///
    /// Returns the number of frames copied.
    pub fn copy_planar_f32(buffer: &AudioBufferRef<'_>, block: &mut PcmBlock) -> usize {
        match buffer {
            AudioBufferRef::F32(buf) => Self::copy_f32_planes(&**buf, block),
            AudioBufferRef::F64(buf) => {
                Self::convert_planes(&**buf, block, |sample: f64| sample.into_sample())
            }
            AudioBufferRef::S32(buf) => {
                Self::convert_planes(&**buf, block, |sample: i32| sample.into_sample())
            }
            AudioBufferRef::S24(buf) => {
                Self::convert_planes(&**buf, block, |sample| IntoSample::into_sample(sample))
            }
            AudioBufferRef::S16(buf) => {
                Self::convert_planes(&**buf, block, |sample: i16| sample.into_sample())
            }
            AudioBufferRef::S8(buf) => {
                Self::convert_planes(&**buf, block, |sample: i8| sample.into_sample())
            }
            AudioBufferRef::U32(buf) => {
                Self::convert_planes(&**buf, block, |sample: u32| sample.into_sample())
            }
            AudioBufferRef::U24(buf) => {
                Self::convert_planes(&**buf, block, |sample| IntoSample::into_sample(sample))
            }
            AudioBufferRef::U16(buf) => {
                Self::convert_planes(&**buf, block, |sample: u16| sample.into_sample())
            }
            AudioBufferRef::U8(buf) => {
                Self::convert_planes(&**buf, block, |sample: u8| sample.into_sample())
            }
        }
    }

    fn copy_f32_planes(buf: &AudioBuffer<f32>, block: &mut PcmBlock) -> usize {
        let num_channels = buf.spec().channels.count();
        for chan_idx in 0..num_channels {
            if let Some(plane) = block.plane_mut(chan_idx) {
                plane.extend_from_slice(buf.chan(chan_idx));
            }
        }
        buf.frames()
    }

    fn convert_planes<T>(buf: &AudioBuffer<T>, block: &mut PcmBlock, convert: fn(T) -> f32) -> usize
    where
        T: Sample + Copy,
    {
        let num_channels = buf.spec().channels.count();
        for chan_idx in 0..num_channels {
            if let Some(plane) = block.plane_mut(chan_idx) {
                plane.extend(buf.chan(chan_idx).iter().map(|&sample| convert(sample)));
            }
        }
        buf.frames()
    }
}
