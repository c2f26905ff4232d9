use gms_core::{Image, Keypoint};
use crate::types::ScoredKeypoint;
use rayon::prelude::*;

/// FAST-9 corner detection
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets (16-pixel Bresenham circle of radius 3)
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Minimum arc length of the segment test
    const ARC_LENGTH: usize = 9;

    /// Detect FAST corners with response scores, parallel over rows
    pub fn detect(img: &Image, width: usize, height: usize, threshold: u8) -> Vec<ScoredKeypoint> {
        if width < 7 || height < 7 {
            return Vec::new();
        }

        (3..height - 3)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row_keypoints = Vec::new();
                for x in 3..width - 3 {
                    let center = img[y * width + x];
                    if let Some(response) = Self::corner_response(img, width, x, y, center, threshold) {
                        row_keypoints.push(ScoredKeypoint {
                            keypoint: Keypoint {
                                x: x as f32,
                                y: y as f32,
                                angle: 0.0,
                            },
                            response,
                        });
                    }
                }
                row_keypoints
            })
            .collect()
    }

    /// Segment test at one pixel; `Some(response)` if it passes
    fn corner_response(
        img: &Image,
        width: usize,
        x: usize,
        y: usize,
        center: u8,
        threshold: u8,
    ) -> Option<f32> {
        let center_i32 = center as i32;
        let threshold_i32 = threshold as i32;

        let mut brighter = [false; 16];
        let mut darker = [false; 16];
        let mut sum_diff = 0i32;

        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let pixel = img[py * width + px] as i32;
            let diff = pixel - center_i32;

            if diff > threshold_i32 {
                brighter[i] = true;
                sum_diff += diff - threshold_i32;
            } else if diff < -threshold_i32 {
                darker[i] = true;
                sum_diff += -diff - threshold_i32;
            }
        }

        if has_consecutive(&brighter, Self::ARC_LENGTH) || has_consecutive(&darker, Self::ARC_LENGTH) {
            Some(sum_diff as f32)
        } else {
            None
        }
    }
}

/// Check for at least `min_count` consecutive true values on the circular
/// 16-pixel ring using a bitmask of rotated shifts
pub fn has_consecutive(pixels: &[bool; 16], min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    let mut mask: u16 = 0;
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            mask |= 1 << i;
        }
    }

    let mut test_mask = mask;
    for i in 1..min_count {
        let shifted = (mask << i) | (mask >> (16 - i));
        test_mask &= shifted;
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: usize, height: usize) -> Image {
        vec![128; width * height]
    }

    fn create_corner_image(width: usize, height: usize) -> Image {
        let mut img = vec![50; width * height];
        let cx = width / 2;
        let cy = height / 2;
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let x = (cx as i32 + dx) as usize;
                let y = (cy as i32 + dy) as usize;
                if x < width && y < height {
                    img[y * width + x] = 255;
                }
            }
        }
        img
    }

    #[test]
    fn test_uniform_image_has_no_corners() {
        let img = create_test_image(20, 20);
        let keypoints = CornerDetector::detect(&img, 20, 20, 20);
        assert!(keypoints.is_empty());
    }

    #[test]
    fn test_bright_square_triggers_detection() {
        let img = create_corner_image(20, 20);
        let keypoints = CornerDetector::detect(&img, 20, 20, 20);
        assert!(!keypoints.is_empty());
        for sk in &keypoints {
            assert!(sk.response > 0.0);
        }
    }

    #[test]
    fn test_too_small_image_yields_nothing() {
        let img = create_test_image(6, 6);
        assert!(CornerDetector::detect(&img, 6, 6, 20).is_empty());
    }

    #[test]
    fn test_consecutive_simple_run() {
        let mut pixels = [false; 16];
        for i in 0..9 {
            pixels[i] = true;
        }
        assert!(has_consecutive(&pixels, 9));
        assert!(!has_consecutive(&pixels, 10));
    }

    #[test]
    fn test_consecutive_wrap_around() {
        let mut pixels = [false; 16];
        for i in 12..16 {
            pixels[i] = true;
        }
        for i in 0..5 {
            pixels[i] = true;
        }
        assert!(has_consecutive(&pixels, 9));
    }

    #[test]
    fn test_alternating_pixels_fail() {
        let mut pixels = [false; 16];
        for i in (0..16).step_by(2) {
            pixels[i] = true;
        }
        assert!(!has_consecutive(&pixels, 2));
    }
}
