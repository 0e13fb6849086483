use std::borrow::Cow;

use image::{RgbImage, RgbaImage};

use crate::foundation::core::Resolution;
use crate::foundation::error::{VidreelError, VidreelResult};

/// Channel order of the pixels in a [`Frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    /// Blue first, as produced by many capture and windowing APIs.
    Bgr,
}

/// One 8-bit pixel buffer, row-major `(height, width, channel)`.
///
/// Three channels are color; a fourth channel, when present, is alpha and is dropped on encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    height: u32,
    width: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a raw buffer, validating its length against the shape.
    pub fn new(height: u32, width: u32, channels: u8, data: Vec<u8>) -> VidreelResult<Self> {
        if height == 0 || width == 0 {
            return Err(VidreelError::validation(format!(
                "frame shape ({height}, {width}, {channels}) has a zero dimension"
            )));
        }
        if !matches!(channels, 3 | 4) {
            return Err(VidreelError::validation(format!(
                "frame must have 3 or 4 channels, got {channels}"
            )));
        }
        let expected = height as usize * width as usize * channels as usize;
        if data.len() != expected {
            return Err(VidreelError::validation(format!(
                "frame data length {} does not match shape ({height}, {width}, {channels}) = {expected}",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// A frame filled with one color.
    pub fn solid(height: u32, width: u32, rgb: [u8; 3]) -> Self {
        Self::from(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `(height, width, channels)`.
    pub fn shape(&self) -> (u32, u32, u8) {
        (self.height, self.width, self.channels)
    }

    /// Width-first size of the frame.
    pub fn resolution(&self) -> Resolution {
        Resolution::from_shape(self.height, self.width)
    }

    /// Convert to an RGB image, swapping red and blue when `order` is BGR.
    pub fn to_rgb_image(&self, order: ChannelOrder) -> RgbImage {
        let stride = self.channels as usize;
        let mut rgb = Vec::with_capacity(self.height as usize * self.width as usize * 3);
        for px in self.data.chunks_exact(stride) {
            match order {
                ChannelOrder::Rgb => rgb.extend_from_slice(&px[..3]),
                ChannelOrder::Bgr => rgb.extend_from_slice(&[px[2], px[1], px[0]]),
            }
        }
        // Length is validated in `new`, so the buffer always matches the dimensions.
        RgbImage::from_raw(self.width, self.height, rgb)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            height,
            width,
            channels: 3,
            data: img.into_raw(),
        }
    }
}

impl From<RgbaImage> for Frame {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            height,
            width,
            channels: 4,
            data: img.into_raw(),
        }
    }
}

/// Place `img` at the top-left of a black canvas of `canvas` size, cropping overflow.
pub(crate) fn fit_to_canvas(img: &RgbImage, canvas: Resolution) -> Cow<'_, RgbImage> {
    if img.dimensions() == (canvas.width, canvas.height) {
        return Cow::Borrowed(img);
    }
    let mut out = RgbImage::new(canvas.width, canvas.height);
    image::imageops::replace(&mut out, img, 0, 0);
    Cow::Owned(out)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/buffer.rs"]
mod tests;
