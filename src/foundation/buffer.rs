use crate::foundation::error::{ExrmixError, ExrmixResult};

/// One decoded image: interleaved RGB or RGBA samples, 32-bit float.
///
/// `data` holds `width * height * channels()` samples in scanline order.
/// Arithmetic treats every interleaved sample uniformly, alpha included,
/// so combining two buffers requires identical dimensions *and* identical
/// alpha presence.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    has_alpha: bool,
    data: Vec<f32>,
}

impl PixelBuffer {
    /// Create a buffer from raw interleaved samples, validating the length.
    pub fn from_raw(width: u32, height: u32, has_alpha: bool, data: Vec<f32>) -> ExrmixResult<Self> {
        let channels = if has_alpha { 4 } else { 3 };
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(ExrmixError::validation(format!(
                "pixel data length {} does not match {}x{} with {} channels",
                data.len(),
                width,
                height,
                channels
            )));
        }
        Ok(Self {
            width,
            height,
            has_alpha,
            data,
        })
    }

    /// A zero-filled buffer, mostly useful in tests.
    pub fn zeroed(width: u32, height: u32, has_alpha: bool) -> Self {
        let channels = if has_alpha { 4 } else { 3 };
        Self {
            width,
            height,
            has_alpha,
            data: vec![0.0; width as usize * height as usize * channels],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Samples per pixel: 3 for RGB, 4 for RGBA.
    pub fn channels(&self) -> usize {
        if self.has_alpha { 4 } else { 3 }
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// `true` when both buffers have the same pixel dimensions.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Apply `f` to every sample, keeping shape and alpha presence.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            has_alpha: self.has_alpha,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two buffers sample by sample.
    ///
    /// Callers must have checked shape and alpha compatibility already.
    pub fn zip(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Self {
        debug_assert!(self.same_shape(other) && self.has_alpha == other.has_alpha);
        Self {
            width: self.width,
            height: self.height,
            has_alpha: self.has_alpha,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}
