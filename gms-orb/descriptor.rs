use gms_core::{Descriptor, Image, Keypoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Number of point pairs = one bit of descriptor each
const NUM_PAIRS: usize = 256;

/// Fixed seed so every detector instance samples the same test pattern
const PATTERN_SEED: u64 = 0x5143_8ACE;

/// Rotated BRIEF descriptor generation
pub struct BriefGenerator {
    w: usize,
    h: usize,
    pairs: Vec<(f32, f32, f32, f32)>,
}

impl BriefGenerator {
    pub fn new(width: usize, height: usize, patch_size: usize) -> Self {
        Self {
            w: width,
            h: height,
            pairs: Self::generate_pattern(patch_size),
        }
    }

    /// Draw the 256 test pairs uniformly within the patch from a fixed-seed
    /// RNG, as in the BRIEF paper's G I sampling
    fn generate_pattern(patch_size: usize) -> Vec<(f32, f32, f32, f32)> {
        let half = (patch_size / 2) as i32;
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        (0..NUM_PAIRS)
            .map(|_| {
                (
                    rng.gen_range(-half..=half) as f32,
                    rng.gen_range(-half..=half) as f32,
                    rng.gen_range(-half..=half) as f32,
                    rng.gen_range(-half..=half) as f32,
                )
            })
            .collect()
    }

    /// Generate one descriptor per keypoint, parallel over keypoints
    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> Vec<Descriptor> {
        kps.par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (cx, cy) = (kp.x, kp.y);
                let mut d = [0u8; 32];

                for (i, &(dx1, dy1, dx2, dy2)) in self.pairs.iter().enumerate() {
                    // Rotate the sampling pattern by the keypoint orientation
                    let (rx1, ry1) = (cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
                    let (rx2, ry2) = (cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

                    let val1 = self.bilinear_sample(img, rx1, ry1);
                    let val2 = self.bilinear_sample(img, rx2, ry2);

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect()
    }

    /// Bilinear interpolation for subpixel sampling, clamped at the border
    fn bilinear_sample(&self, img: &Image, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;

        if x0 < 0.0 || y0 < 0.0 || x1 >= self.w as f32 || y1 >= self.h as f32 {
            let cx = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
            return img[cy * self.w + cx] as f32;
        }

        let dx = x - x0;
        let dy = y - y0;

        let x0_idx = x0 as usize;
        let y0_idx = y0 as usize;
        let x1_idx = (x1 as usize).min(self.w - 1);
        let y1_idx = (y1 as usize).min(self.h - 1);

        let p00 = img[y0_idx * self.w + x0_idx] as f32;
        let p10 = img[y0_idx * self.w + x1_idx] as f32;
        let p01 = img[y1_idx * self.w + x0_idx] as f32;
        let p11 = img[y1_idx * self.w + x1_idx] as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;

        top * (1.0 - dy) + bottom * dy
    }
}
