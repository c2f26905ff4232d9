mod config;
mod descriptor;
mod detector;
mod error;
mod refinement;
mod types;

pub use config::OrbConfig;
pub use descriptor::BriefGenerator;
pub use detector::CornerDetector;
pub use error::{OrbError, OrbResult};
pub use refinement::KeypointRefinement;
pub use types::ScoredKeypoint;

use gms_core::{Descriptor, Image, Keypoint};

/// ORB feature detector: FAST-9 corners, intensity-centroid orientation,
/// rotated BRIEF descriptors, capped at `max_features` keypoints per image
pub struct OrbDetector {
    cfg: OrbConfig,
    w: usize,
    h: usize,
    brief: BriefGenerator,
}

impl OrbDetector {
    /// Creates a new ORB detector with validation
    pub fn new(cfg: OrbConfig, width: usize, height: usize) -> OrbResult<Self> {
        if width == 0 || height == 0 {
            return Err(OrbError::InvalidImageSize { width, height });
        }

        // FAST requires at least 7x7 image (3-pixel border on each side)
        const MIN_SIZE: usize = 7;
        if width < MIN_SIZE || height < MIN_SIZE {
            return Err(OrbError::ImageTooSmall { width, height, min_size: MIN_SIZE });
        }

        cfg.validate()?;

        let min_dim = std::cmp::min(width, height);
        if cfg.patch_size >= min_dim {
            return Err(OrbError::InvalidPatchSize {
                patch_size: cfg.patch_size,
                min_image_dim: min_dim,
            });
        }

        let brief = BriefGenerator::new(width, height, cfg.patch_size);

        Ok(Self { cfg, w: width, h: height, brief })
    }

    /// Validates image data before processing
    fn validate_image(&self, img: &Image) -> OrbResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(OrbError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect keypoints: FAST corners, NMS, best-N retention, orientation
    pub fn detect_keypoints(&self, img: &Image) -> OrbResult<Vec<Keypoint>> {
        self.validate_image(img)?;

        let scored = CornerDetector::detect(img, self.w, self.h, self.cfg.threshold);
        log::debug!("FAST produced {} raw corners", scored.len());

        let suppressed = KeypointRefinement::non_maximum_suppression(&scored, self.cfg.nms_radius);
        let retained = KeypointRefinement::retain_best(suppressed, self.cfg.max_features);

        let keypoints = retained
            .into_iter()
            .map(|sk| {
                let angle = KeypointRefinement::compute_orientation(
                    img,
                    self.w,
                    self.h,
                    sk.keypoint.x,
                    sk.keypoint.y,
                    self.cfg.patch_size,
                );
                Keypoint { angle, ..sk.keypoint }
            })
            .collect::<Vec<_>>();

        log::debug!("{} keypoints after suppression and retention", keypoints.len());
        Ok(keypoints)
    }

    /// Generate BRIEF descriptors for the given keypoints
    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> Vec<Descriptor> {
        self.brief.generate_descriptors(img, kps)
    }

    /// Detect keypoints and generate descriptors in one step
    pub fn detect_and_describe(&self, img: &Image) -> OrbResult<(Vec<Keypoint>, Vec<Descriptor>)> {
        let kps = self.detect_keypoints(img)?;
        let desc = self.generate_descriptors(img, &kps);
        Ok((kps, desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_config() -> OrbConfig {
        OrbConfig {
            threshold: 20,
            patch_size: 15,
            max_features: 10_000,
            nms_radius: 3.0,
            n_threads: 1,
        }
    }

    fn create_corner_image(width: usize, height: usize) -> Image {
        let mut img = vec![50; width * height];
        let corners = [(width / 4, height / 4), (3 * width / 4, height / 4), (width / 2, height / 2)];
        for &(cx, cy) in &corners {
            for dy in -2i32..=2 {
                for dx in -2i32..=2 {
                    let x = (cx as i32 + dx) as usize;
                    let y = (cy as i32 + dy) as usize;
                    if x < width && y < height {
                        img[y * width + x] = 255;
                    }
                }
            }
        }
        img
    }

    #[test]
    fn test_valid_constructor() {
        assert!(OrbDetector::new(create_test_config(), 100, 100).is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        let result = OrbDetector::new(create_test_config(), 0, 100);
        assert!(matches!(result, Err(OrbError::InvalidImageSize { .. })));

        let result = OrbDetector::new(create_test_config(), 100, 0);
        assert!(matches!(result, Err(OrbError::InvalidImageSize { .. })));
    }

    #[test]
    fn test_too_small_image() {
        let result = OrbDetector::new(create_test_config(), 6, 6);
        assert!(matches!(result, Err(OrbError::ImageTooSmall { .. })));
    }

    #[test]
    fn test_patch_size_larger_than_image() {
        let result = OrbDetector::new(create_test_config(), 10, 10);
        assert!(matches!(result, Err(OrbError::InvalidPatchSize { .. })));
    }

    #[test]
    fn test_invalid_image_data() {
        let detector = OrbDetector::new(create_test_config(), 100, 100).unwrap();
        let img = vec![0; 50];
        let result = detector.detect_keypoints(&img);
        assert!(matches!(result, Err(OrbError::InvalidImageData { .. })));
    }

    #[test]
    fn test_uniform_image_detects_nothing() {
        let detector = OrbDetector::new(create_test_config(), 50, 50).unwrap();
        let img = vec![128; 50 * 50];
        let (kps, descs) = detector.detect_and_describe(&img).unwrap();
        assert!(kps.is_empty());
        assert!(descs.is_empty());
    }

    #[test]
    fn test_corners_are_detected_and_described() {
        let detector = OrbDetector::new(create_test_config(), 60, 60).unwrap();
        let img = create_corner_image(60, 60);
        let (kps, descs) = detector.detect_and_describe(&img).unwrap();
        assert!(!kps.is_empty());
        assert_eq!(kps.len(), descs.len());
    }

    #[test]
    fn test_max_features_cap_is_respected() {
        let mut cfg = create_test_config();
        cfg.max_features = 2;
        let detector = OrbDetector::new(cfg, 60, 60).unwrap();
        let img = create_corner_image(60, 60);
        let kps = detector.detect_keypoints(&img).unwrap();
        assert!(kps.len() <= 2);
    }

    proptest! {
        #[test]
        fn prop_detection_never_exceeds_cap(seed in 0u64..1000) {
            let mut cfg = create_test_config();
            cfg.max_features = 16;
            let detector = OrbDetector::new(cfg, 40, 40).unwrap();
            let img: Image = (0..40 * 40)
                .map(|i| ((i as u64).wrapping_mul(seed.wrapping_add(7)) % 251) as u8)
                .collect();
            let (kps, descs) = detector.detect_and_describe(&img).unwrap();
            prop_assert!(kps.len() <= 16);
            prop_assert_eq!(kps.len(), descs.len());
        }
    }
}
