mod gms;
mod matcher;

pub use gms::{GmsConfig, GmsFilter};
pub use matcher::BruteForceMatcher;
