//! Perceptual signatures: a 16x16 mean-thresholded bit grid.
//!
//! Two captures of the same UI element differ by anti-aliasing and compression
//! noise, so comparisons go through [`distance`] rather than pixel equality.

/// Grid side length.
pub const SIG_SIZE: u32 = 16;
/// Bits in a signature.
pub const SIG_BITS: u32 = SIG_SIZE * SIG_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature([u8; (SIG_BITS / 8) as usize]);

impl Signature {
    /// Area-average `gray` down to 16x16, then set each bit whose cell is
    /// at least the grid's mean intensity. Bits are packed MSB first, row-major.
    pub fn of(gray: &image::GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return Self::default();
        }

        let mut cells = [0f32; SIG_BITS as usize];
        for cy in 0..SIG_SIZE {
            let (y0, y1) = span(cy, h);
            for cx in 0..SIG_SIZE {
                let (x0, x1) = span(cx, w);
                let mut sum = 0u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += gray.get_pixel(x, y).0[0] as u64;
                    }
                }
                cells[(cy * SIG_SIZE + cx) as usize] = sum as f32 / ((y1 - y0) * (x1 - x0)) as f32;
            }
        }

        let mean = cells.iter().sum::<f32>() / cells.len() as f32;
        let mut bits = [0u8; (SIG_BITS / 8) as usize];
        for (i, &v) in cells.iter().enumerate() {
            if v >= mean {
                bits[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self(bits)
    }

    #[cfg(test)]
    pub(crate) const fn from_bytes(bytes: [u8; (SIG_BITS / 8) as usize]) -> Self {
        Self(bytes)
    }
}

/// Source pixel range covered by grid cell `i` along an axis of length `len`.
/// Small sources repeat pixels rather than produce empty cells.
fn span(i: u32, len: u32) -> (u32, u32) {
    let start = (i as u64 * len as u64 / SIG_SIZE as u64) as u32;
    let end = ((i as u64 + 1) * len as u64 / SIG_SIZE as u64) as u32;
    let start = start.min(len - 1);
    (start, end.max(start + 1).min(len))
}

/// Hamming distance in `0..=256`.
pub fn distance(a: &Signature, b: &Signature) -> u32 {
    a.0.iter().zip(b.0.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn stripes(w: u32, h: u32, period: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| Luma([if (x / period) % 2 == 0 { 30 } else { 220 }]))
    }

    #[test]
    fn deterministic() {
        let img = stripes(160, 23, 5);
        assert_eq!(Signature::of(&img), Signature::of(&img));
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = Signature::of(&stripes(160, 23, 5));
        let b = Signature::of(&stripes(160, 23, 20));
        assert_eq!(distance(&a, &a), 0);
        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert!(distance(&a, &b) <= SIG_BITS);
    }

    #[test]
    fn inverted_image_is_far() {
        let img = GrayImage::from_fn(32, 32, |x, _| Luma([if x < 16 { 0 } else { 255 }]));
        let inv = GrayImage::from_fn(32, 32, |x, _| Luma([if x < 16 { 255 } else { 0 }]));
        assert_eq!(distance(&Signature::of(&img), &Signature::of(&inv)), SIG_BITS);
    }

    #[test]
    fn light_noise_stays_close() {
        let img = stripes(160, 23, 10);
        let noisy = GrayImage::from_fn(160, 23, |x, y| {
            let v = img.get_pixel(x, y).0[0] as i32 + if (x + y) % 3 == 0 { 12 } else { -7 };
            Luma([v.clamp(0, 255) as u8])
        });
        assert!(distance(&Signature::of(&img), &Signature::of(&noisy)) <= 12);
    }

    #[test]
    fn tiny_and_empty_images() {
        let one = GrayImage::from_pixel(1, 1, Luma([77]));
        assert_eq!(Signature::of(&one), Signature::from_bytes([0xff; 32]));
        assert_eq!(Signature::of(&GrayImage::new(0, 0)), Signature::default());
    }
}
