use gms_core::Keypoint;

/// Keypoint with corner response score for NMS and best-N retention
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: f32,
}
