use image::RgbaImage;

use crate::foundation::error::{HudError, HudResult};
use crate::foundation::math::{over_premul, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// A rendered overlay frame as RGBA8 pixels.
///
/// Frames leave the compositor **premultiplied**; the flag keeps that explicit at API
/// boundaries (encoders and PNG export convert as needed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
            premultiplied: true,
        }
    }

    /// Wrap a straight-alpha image, premultiplying it.
    pub fn from_straight(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self {
            width,
            height,
            data,
            premultiplied: true,
        }
    }

    /// Straight-alpha copy, suitable for PNG export and `image` operations.
    pub fn to_straight_image(&self) -> HudResult<RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| HudError::validation("frame byte length does not match its size"))
    }

    /// Source-over `src` (premultiplied, same size) onto this premultiplied frame.
    pub fn composite_over(&mut self, src: &[u8]) -> HudResult<()> {
        if !self.premultiplied || src.len() != self.data.len() {
            return Err(HudError::validation(
                "composite_over needs two premultiplied buffers of equal size",
            ));
        }
        for (d, s) in self.data.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            if s[3] == 0 {
                continue;
            }
            let out = over_premul([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
        Ok(())
    }

    /// Source-over a straight-alpha image with its top-left at `(x, y)`, clipped to the frame.
    pub fn paste_straight(&mut self, img: &RgbaImage, x: i64, y: i64) {
        let (iw, ih) = img.dimensions();
        let fw = i64::from(self.width);
        let fh = i64::from(self.height);
        for iy in 0..ih {
            let fy = y + i64::from(iy);
            if fy < 0 || fy >= fh {
                continue;
            }
            for ix in 0..iw {
                let fx = x + i64::from(ix);
                if fx < 0 || fx >= fw {
                    continue;
                }
                let mut src = img.get_pixel(ix, iy).0;
                if src[3] == 0 {
                    continue;
                }
                premultiply_rgba8_in_place(&mut src);
                let i = ((fy * fw + fx) as usize) * 4;
                let dst = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over_premul(dst, src));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
