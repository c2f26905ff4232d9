use gms_core::Image;
use crate::types::ScoredKeypoint;

/// Keypoint selection and orientation assignment
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Non-maximum suppression to reduce duplicate keypoints
    pub fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }

        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints
            .sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(std::cmp::Ordering::Equal));

        let mut suppressed: Vec<ScoredKeypoint> = Vec::new();
        let min_distance_sq = min_distance * min_distance;

        for candidate in sorted_keypoints {
            let mut is_local_max = true;

            for accepted in &suppressed {
                let dx = candidate.keypoint.x - accepted.keypoint.x;
                let dy = candidate.keypoint.y - accepted.keypoint.y;
                if dx * dx + dy * dy < min_distance_sq {
                    is_local_max = false;
                    break;
                }
            }

            if is_local_max {
                suppressed.push(candidate);
            }
        }

        suppressed
    }

    /// Keep the `max_features` strongest keypoints by response
    pub fn retain_best(mut keypoints: Vec<ScoredKeypoint>, max_features: usize) -> Vec<ScoredKeypoint> {
        if keypoints.len() > max_features {
            keypoints
                .sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(std::cmp::Ordering::Equal));
            keypoints.truncate(max_features);
        }
        keypoints
    }

    /// Compute orientation using the intensity centroid method
    pub fn compute_orientation(
        img: &Image,
        width: usize,
        height: usize,
        x: f32,
        y: f32,
        patch_size: usize,
    ) -> f32 {
        let half = (patch_size / 2) as i32;
        let (cx, cy) = (x.round() as i32, y.round() as i32);

        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            let yy = (cy + dy).clamp(0, height as i32 - 1) as usize;
            for dx in -half..=half {
                let xx = (cx + dx).clamp(0, width as i32 - 1) as usize;
                let val = img[yy * width + xx] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gms_core::Keypoint;

    fn scored(x: f32, y: f32, response: f32) -> ScoredKeypoint {
        ScoredKeypoint {
            keypoint: Keypoint { x, y, angle: 0.0 },
            response,
        }
    }

    #[test]
    fn test_nms_keeps_strongest_of_close_pair() {
        let keypoints = vec![scored(10.0, 10.0, 5.0), scored(11.0, 10.0, 9.0)];
        let suppressed = KeypointRefinement::non_maximum_suppression(&keypoints, 3.0);
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].response, 9.0);
    }

    #[test]
    fn test_nms_keeps_distant_keypoints() {
        let keypoints = vec![scored(10.0, 10.0, 5.0), scored(30.0, 10.0, 9.0)];
        let suppressed = KeypointRefinement::non_maximum_suppression(&keypoints, 3.0);
        assert_eq!(suppressed.len(), 2);
    }

    #[test]
    fn test_retain_best_caps_count() {
        let keypoints: Vec<_> = (0..10).map(|i| scored(i as f32 * 10.0, 0.0, i as f32)).collect();
        let kept = KeypointRefinement::retain_best(keypoints, 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].response, 9.0);
        assert_eq!(kept[2].response, 7.0);
    }

    #[test]
    fn test_retain_best_no_op_under_cap() {
        let keypoints = vec![scored(1.0, 1.0, 1.0), scored(2.0, 2.0, 2.0)];
        assert_eq!(KeypointRefinement::retain_best(keypoints, 10).len(), 2);
    }

    #[test]
    fn test_orientation_points_toward_bright_side() {
        let width = 31;
        let height = 31;
        let mut img = vec![0u8; width * height];
        // Bright column on the right half of the patch
        for y in 0..height {
            for x in 20..width {
                img[y * width + x] = 255;
            }
        }
        let angle = KeypointRefinement::compute_orientation(&img, width, height, 15.0, 15.0, 15);
        assert!(angle.abs() < 0.2, "expected angle near 0, got {}", angle);
    }

    #[test]
    fn test_orientation_of_uniform_patch_is_zero() {
        let img = vec![100u8; 31 * 31];
        let angle = KeypointRefinement::compute_orientation(&img, 31, 31, 15.0, 15.0, 15);
        assert_eq!(angle, 0.0);
    }
}
