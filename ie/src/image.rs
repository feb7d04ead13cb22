//! Image primitives and utilities.
//!
//! Captures arrive as a lightweight owned RGB image (`OwnedImage`). Region
//! checks borrow a view (`Image<'a>`) instead of copying pixels, and convert to
//! `image::GrayImage` when a grayscale pipeline (signatures, OCR prep) needs it.

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = if width == 0 { 0 } else { bytes.len() / width / 4 };
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Solid image, mostly useful for synthetic captures.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; (width * height) as usize],
        }
    }

    /// Build from a per-pixel function of `(x, y)`.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Create an RGB `OwnedImage` from a grayscale image (each pixel repeated into RGB).
    pub fn from_gray_as_rgb(gray: &image::GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let data = gray.pixels().map(|p| Color::new(p.0[0], p.0[0], p.0[0])).collect();
        Self {
            width: w,
            height: h,
            data,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        self.as_image().to_gray_image()
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> &Color {
        &self.data[(x + y * self.true_width) as usize]
    }

    /// Top-left pixel of the view, if it has any.
    pub fn first_pixel(&self) -> Option<Color> {
        if self.width() == 0 || self.height() == 0 {
            return None;
        }
        Some(*self.pixel(self.x1, self.y1))
    }

    pub fn to_gray_image(&self) -> image::GrayImage {
        let mut out = image::GrayImage::new(self.width(), self.height());
        for (x, y, p) in out.enumerate_pixels_mut() {
            p.0[0] = self.pixel(self.x1 + x, self.y1 + y).luma();
        }
        out
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                bytes.extend_from_slice(&[clr.r, clr.g, clr.b]);
            }
        }
        bytes
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self.get_bytes();
        let img = image::RgbImage::from_raw(self.width(), self.height(), bytes)
            .context("RgbImage::from_raw failed")?;
        img.save_with_format(path, image::ImageFormat::Png)
            .context("save png")?;
        Ok(())
    }
}

/// Population standard deviation of the luma channel; 0 for an empty image.
pub fn gray_std_dev(gray: &image::GrayImage) -> f32 {
    let n = (gray.width() * gray.height()) as usize;
    if n == 0 {
        return 0.0;
    }
    let mean = gray.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n as f64;
    let var = gray
        .pixels()
        .map(|p| {
            let d = p.0[0] as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;
    var.sqrt() as f32
}

/// Resize a grayscale image with `fast_image_resize` (Catmull-Rom).
pub fn resize_gray(gray: &image::GrayImage, width: u32, height: u32) -> Result<image::GrayImage> {
    use fast_image_resize as fr;

    let src = fr::images::Image::from_vec_u8(gray.width(), gray.height(), gray.as_raw().clone(), fr::PixelType::U8)
        .context("fast_image_resize: source buffer")?;
    let mut dst = fr::images::Image::new(width.max(1), height.max(1), fr::PixelType::U8);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Interpolation(fr::FilterType::CatmullRom));
    resizer
        .resize(&src, &mut dst, &Some(options))
        .context("fast_image_resize: resize failed")?;

    image::GrayImage::from_raw(width.max(1), height.max(1), dst.into_vec()).context("GrayImage::from_raw failed")
}

/// OCR input for one stat line: grayscale, upscaled x3 (x2 for larger crops),
/// 3x3 median denoise, Otsu binarization.
pub fn preprocess_for_ocr(image: Image) -> Result<OwnedImage> {
    use imageproc::contrast::{otsu_level, threshold, ThresholdType};

    let gray = image.to_gray_image();
    if gray.width() == 0 || gray.height() == 0 {
        return Ok(OwnedImage::from_gray_as_rgb(&gray));
    }

    let scale = if gray.width().min(gray.height()) < 120 { 3 } else { 2 };
    let gray = resize_gray(&gray, gray.width() * scale, gray.height() * scale)?;
    let gray = imageproc::filter::median_filter(&gray, 1, 1);
    let level = otsu_level(&gray);
    let bin = threshold(&gray, level, ThresholdType::Binary);
    Ok(OwnedImage::from_gray_as_rgb(&bin))
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True if every channel is within `tolerance` of `other`.
    pub fn within(&self, other: Color, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) <= tolerance
            && self.g.abs_diff(other.g) <= tolerance
            && self.b.abs_diff(other.b) <= tolerance
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }
}
