mod render;

pub use render::{draw_matches, gray_to_rgba, side_by_side};

use gms_match::{BruteForceMatcher, GmsConfig, GmsFilter};
use gms_orb::{OrbConfig, OrbDetector, OrbError};
use image::{GrayImage, ImageReader, RgbaImage};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Demo failure conditions, each terminal with a nonzero exit code
#[derive(Debug)]
pub enum DemoError {
    ImageLoad { path: PathBuf, source: image::ImageError },
    InvalidImage { path: PathBuf },
    UnknownDetector { name: String },
    Detector(OrbError),
    ImageSave { path: PathBuf, source: image::ImageError },
}

impl std::fmt::Display for DemoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemoError::ImageLoad { path, source } => {
                write!(f, "Unable to load image '{}': {}", path.display(), source)
            }
            DemoError::InvalidImage { path } => {
                write!(f, "Image '{}' is empty or could not be decoded", path.display())
            }
            DemoError::UnknownDetector { name } => {
                write!(
                    f,
                    "Invalid detector type '{}'. Unable to detect and compute keypoints \
                     and descriptors with the selected detector type",
                    name
                )
            }
            DemoError::Detector(e) => write!(f, "Detector error: {}", e),
            DemoError::ImageSave { path, source } => {
                write!(f, "Unable to save image '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::ImageLoad { source, .. } | DemoError::ImageSave { source, .. } => Some(source),
            DemoError::Detector(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OrbError> for DemoError {
    fn from(err: OrbError) -> Self {
        DemoError::Detector(err)
    }
}

pub type DemoResult<T> = Result<T, DemoError>;

/// Closed selection of supported detector/descriptor algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Orb,
}

impl FromStr for DetectorKind {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Unrecognized names fail explicitly; the enumeration is closed
        // today but the contract stays when variants are added
        if s.eq_ignore_ascii_case("orb") {
            Ok(DetectorKind::Orb)
        } else {
            Err(DemoError::UnknownDetector { name: s.to_string() })
        }
    }
}

impl DetectorKind {
    /// Factory: construct the detector for this kind and image size
    pub fn create(self, cfg: OrbConfig, width: usize, height: usize) -> DemoResult<OrbDetector> {
        match self {
            DetectorKind::Orb => Ok(OrbDetector::new(cfg, width, height)?),
        }
    }
}

/// One GMS configuration exercised by the demo, with its window title
pub struct FilterRun {
    pub label: &'static str,
    pub with_rotation: bool,
    pub with_scale: bool,
}

/// The three rotation/scale configurations the demo walks through
pub const FILTER_RUNS: [FilterRun; 3] = [
    FilterRun {
        label: "GMS No Rotation or Scale Support",
        with_rotation: false,
        with_scale: false,
    },
    FilterRun {
        label: "GMS with Rotation and Scale Support",
        with_rotation: true,
        with_scale: true,
    },
    FilterRun {
        label: "GMS with Scale Support and No Rotation",
        with_rotation: false,
        with_scale: true,
    },
];

/// Demo invocation parameters
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub image1: PathBuf,
    pub image2: PathBuf,
    pub detector: String,
    pub headless: bool,
    pub output_dir: PathBuf,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            image1: PathBuf::from("dog01.jpg"),
            image2: PathBuf::from("dog02.jpg"),
            detector: "orb".to_string(),
            headless: false,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Result of one filter configuration
#[derive(Debug)]
pub struct RunSummary {
    pub label: &'static str,
    pub kept: usize,
    pub render: RgbaImage,
}

/// Everything the demo produced, ready for display or saving
#[derive(Debug)]
pub struct DemoReport {
    pub keypoints: (usize, usize),
    pub total_matches: usize,
    pub runs: Vec<RunSummary>,
}

/// Validity predicate: a decoded image is usable iff its buffer is non-empty
pub fn is_valid_image(img: &GrayImage) -> bool {
    img.width() > 0 && img.height() > 0 && !img.as_raw().is_empty()
}

/// Load one image and convert to grayscale
pub fn load_gray(path: &Path) -> DemoResult<GrayImage> {
    let decoded = ImageReader::open(path)
        .map_err(|e| DemoError::ImageLoad {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .decode()
        .map_err(|source| DemoError::ImageLoad { path: path.to_path_buf(), source })?;
    Ok(decoded.to_luma8())
}

/// Load and validate both input images; nothing else runs until both pass
pub fn load_inputs(opts: &DemoOptions) -> DemoResult<(GrayImage, GrayImage)> {
    let img1 = load_gray(&opts.image1)?;
    let img2 = load_gray(&opts.image2)?;

    if !is_valid_image(&img1) {
        return Err(DemoError::InvalidImage { path: opts.image1.clone() });
    }
    if !is_valid_image(&img2) {
        return Err(DemoError::InvalidImage { path: opts.image2.clone() });
    }

    Ok((img1, img2))
}

/// Detect, match, filter three ways and render the validated inputs.
/// Split from [`load_inputs`] so the caller can display the sources while
/// detection runs. Display/saving is left to the caller.
pub fn run_pipeline(
    opts: &DemoOptions,
    img1: &GrayImage,
    img2: &GrayImage,
) -> DemoResult<DemoReport> {
    let kind: DetectorKind = opts.detector.parse()?;
    let cfg = OrbConfig::default();
    // Fails when a pool already exists, e.g. on a second run in-process
    if let Err(err) = gms_core::init_thread_pool(cfg.n_threads) {
        log::debug!("thread pool already initialized: {}", err);
    }

    log::info!("Detecting keypoints for input images");
    let detector1 = kind.create(cfg.clone(), img1.width() as usize, img1.height() as usize)?;
    let detector2 = kind.create(cfg, img2.width() as usize, img2.height() as usize)?;

    let (kp1, desc1) = detector1.detect_and_describe(img1.as_raw())?;
    let (kp2, desc2) = detector2.detect_and_describe(img2.as_raw())?;
    log::info!("Detected {} / {} keypoints", kp1.len(), kp2.len());

    let matcher = BruteForceMatcher::new(false);
    let matches_all = matcher.match_descriptors(&desc1, &desc2);
    log::info!("{} brute-force matches", matches_all.len());

    let size1 = (img1.width() as usize, img1.height() as usize);
    let size2 = (img2.width() as usize, img2.height() as usize);

    let runs = FILTER_RUNS
        .iter()
        .map(|run| {
            let filter = GmsFilter::new(GmsConfig {
                with_rotation: run.with_rotation,
                with_scale: run.with_scale,
                ..GmsConfig::default()
            });
            let filtered = filter.filter(size1, size2, &kp1, &kp2, &matches_all);
            let render = draw_matches(img1, &kp1, img2, &kp2, &filtered);
            RunSummary {
                label: run.label,
                kept: filtered.len(),
                render,
            }
        })
        .collect();

    Ok(DemoReport {
        keypoints: (kp1.len(), kp2.len()),
        total_matches: matches_all.len(),
        runs,
    })
}

/// Full demo pipeline in one call: load, validate, detect, match, filter
/// three ways, render
pub fn run_demo(opts: &DemoOptions) -> DemoResult<DemoReport> {
    let (img1, img2) = load_inputs(opts)?;
    run_pipeline(opts, &img1, &img2)
}

/// File name a run's render is saved under in headless mode
pub fn output_filename(label: &str) -> String {
    let slug: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}.png", slug)
}

/// Save every run's render into `output_dir`, returning the written paths
pub fn save_report(report: &DemoReport, output_dir: &Path) -> DemoResult<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(report.runs.len());
    for run in &report.runs {
        let path = output_dir.join(output_filename(run.label));
        run.render
            .save(&path)
            .map_err(|source| DemoError::ImageSave { path: path.clone(), source })?;
        paths.push(path);
    }
    Ok(paths)
}
