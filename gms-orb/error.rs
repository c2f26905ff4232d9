#[derive(Debug, Clone)]
pub enum OrbError {
    InvalidImageSize { width: usize, height: usize },
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidThreshold(u8),
    InvalidPatchSize { patch_size: usize, min_image_dim: usize },
    InvalidMaxFeatures(usize),
    ImageTooSmall { width: usize, height: usize, min_size: usize },
}

impl std::fmt::Display for OrbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            OrbError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            OrbError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be 1-127)", t)
            }
            OrbError::InvalidPatchSize { patch_size, min_image_dim } => {
                write!(f, "Patch size {} invalid for minimum image dimension {}", patch_size, min_image_dim)
            }
            OrbError::InvalidMaxFeatures(n) => {
                write!(f, "Invalid maximum feature count: {} (must be > 0)", n)
            }
            OrbError::ImageTooSmall { width, height, min_size } => {
                write!(f, "Image {}x{} too small (minimum {}x{})", width, height, min_size, min_size)
            }
        }
    }
}

impl std::error::Error for OrbError {}

pub type OrbResult<T> = Result<T, OrbError>;
