use crate::error::{OrbError, OrbResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ORB detector configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrbConfig {
    /// FAST segment-test threshold
    pub threshold: u8,
    /// Patch size for orientation and descriptor sampling (odd)
    pub patch_size: usize,
    /// Upper bound on the number of keypoints kept per image
    pub max_features: usize,
    /// Minimum distance between keypoints after non-maximum suppression
    pub nms_radius: f32,
    /// Worker threads for the Rayon pool
    pub n_threads: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            max_features: 10_000,
            nms_radius: 3.0,
            n_threads: gms_core::default_threads(),
        }
    }
}

impl OrbConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> OrbResult<()> {
        if self.threshold == 0 || self.threshold > 127 {
            return Err(OrbError::InvalidThreshold(self.threshold));
        }
        if self.patch_size % 2 == 0 {
            return Err(OrbError::InvalidPatchSize {
                patch_size: self.patch_size,
                min_image_dim: 0,
            });
        }
        if self.max_features == 0 {
            return Err(OrbError::InvalidMaxFeatures(self.max_features));
        }
        Ok(())
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
