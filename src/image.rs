//! Simple image struct, used for custom cursors.
//!
//! This doesn't use the `image` crate, however converting an `Image` from
//! this module to an `ImageBuffer` should be easy.

use crate::error::{self, Result};
use crate::{Extent2, Rgba};

/// Row-major pixels, top row first.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Image<T> {
    pub pixels: Vec<T>,
    pub size: Extent2<u32>,
}

/// The only pixel format cursors accept: 8 bits per channel, non-premultiplied.
pub type RgbaImage = Image<Rgba<u8>>;

impl<T> Image<T> {
    /// Builds an image, checking that `pixels` covers exactly `size`.
    pub fn new(size: Extent2<u32>, pixels: Vec<T>) -> Result<Self> {
        let img = Self { pixels, size };
        img.validate()?;
        Ok(img)
    }
    pub(crate) fn validate(&self) -> Result<()> {
        if self.size.w == 0 || self.size.h == 0 {
            return error::invalid_value(format!("Invalid image dimensions {}x{}", self.size.w, self.size.h));
        }
        let expected = self.size.w as usize * self.size.h as usize;
        if self.pixels.len() != expected {
            return error::invalid_value(format!("Image of size {}x{} needs {} pixels, got {}", self.size.w, self.size.h, expected, self.pixels.len()));
        }
        Ok(())
    }
}
