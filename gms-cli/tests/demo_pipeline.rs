use gms_cli::{load_inputs, run_demo, run_pipeline, save_report, DemoError, DemoOptions};
use image::GrayImage;
use std::path::PathBuf;

const WIDTH: u32 = 240;
const HEIGHT: u32 = 180;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gms-demo-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Dark background with a jittered lattice of bright dots, optionally
/// shifted; dots give FAST plenty of corners and the shift a consistent
/// motion between the two images
fn dotted_image(shift: (i32, i32)) -> GrayImage {
    let mut img = GrayImage::from_pixel(WIDTH, HEIGHT, image::Luma([60]));
    let mut i = 0u32;
    for gy in (16..HEIGHT as i32 - 16).step_by(16) {
        for gx in (16..WIDTH as i32 - 16).step_by(16) {
            let jitter = (i * 7 % 5) as i32;
            let cx = gx + jitter + shift.0;
            let cy = gy + shift.1;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let x = cx + dx;
                    let y = cy + dy;
                    if x >= 0 && y >= 0 && (x as u32) < WIDTH && (y as u32) < HEIGHT {
                        img.put_pixel(x as u32, y as u32, image::Luma([230]));
                    }
                }
            }
            i += 1;
        }
    }
    img
}

fn write_sample_images(dir: &PathBuf) -> (PathBuf, PathBuf) {
    let path1 = dir.join("dog01.jpg");
    let path2 = dir.join("dog02.jpg");
    dotted_image((0, 0)).save(&path1).unwrap();
    dotted_image((5, 3)).save(&path2).unwrap();
    (path1, path2)
}

fn options(image1: PathBuf, image2: PathBuf, output_dir: PathBuf) -> DemoOptions {
    DemoOptions {
        image1,
        image2,
        detector: "orb".to_string(),
        headless: true,
        output_dir,
    }
}

#[test]
fn end_to_end_produces_three_filtered_match_sets() {
    let dir = temp_dir("success");
    let (path1, path2) = write_sample_images(&dir);
    let opts = options(path1, path2, dir.clone());

    let report = run_demo(&opts).expect("pipeline must succeed on valid images");

    assert!(report.keypoints.0 > 0);
    assert!(report.keypoints.1 > 0);
    assert_eq!(report.runs.len(), 3);
    for run in &report.runs {
        // Filtered sets are subsets of the brute-force match set
        assert!(run.kept <= report.total_matches);
        assert_eq!(
            run.render.dimensions(),
            (WIDTH * 2, HEIGHT),
            "side-by-side render has both images"
        );
    }

    let paths = save_report(&report, &dir).unwrap();
    assert_eq!(paths.len(), 3);
    for path in paths {
        assert!(path.exists(), "missing render {}", path.display());
    }
}

#[test]
fn missing_first_image_fails_before_detection() {
    let dir = temp_dir("missing");
    let opts = options(dir.join("dog01.jpg"), dir.join("dog02.jpg"), dir);

    let err = run_demo(&opts).unwrap_err();
    assert!(matches!(err, DemoError::ImageLoad { .. }));
}

#[test]
fn unknown_detector_fails_with_distinct_diagnostic() {
    let dir = temp_dir("detector");
    let (path1, path2) = write_sample_images(&dir);
    let mut opts = options(path1, path2, dir);
    opts.detector = "surf".to_string();

    let err = run_demo(&opts).unwrap_err();
    assert!(matches!(err, DemoError::UnknownDetector { .. }));

    let image_err = DemoError::InvalidImage { path: PathBuf::from("dog01.jpg") };
    assert_ne!(err.to_string(), image_err.to_string());
}

#[test]
fn inputs_load_before_the_detector_is_resolved() {
    // The windowed mode shows the sources between these two steps, so
    // loading must succeed on its own even when the pipeline later fails
    let dir = temp_dir("split");
    let (path1, path2) = write_sample_images(&dir);
    let mut opts = options(path1, path2, dir);
    opts.detector = "akaze".to_string();

    let (img1, img2) = load_inputs(&opts).expect("valid images must load");
    assert_eq!(img1.dimensions(), (WIDTH, HEIGHT));

    let err = run_pipeline(&opts, &img1, &img2).unwrap_err();
    assert!(matches!(err, DemoError::UnknownDetector { .. }));
}

#[test]
fn repeated_runs_in_one_process_succeed() {
    // The second run hits an already-built thread pool; that must not fail
    // the pipeline
    let dir = temp_dir("repeat");
    let (path1, path2) = write_sample_images(&dir);
    let opts = options(path1, path2, dir);

    let first = run_demo(&opts).expect("first run succeeds");
    let second = run_demo(&opts).expect("second run succeeds");
    assert_eq!(first.total_matches, second.total_matches);
}

#[test]
fn zero_size_image_is_rejected_as_invalid() {
    // A decodable file with zero pixels cannot be produced by the JPEG
    // encoder, so exercise the predicate directly
    assert!(!gms_cli::is_valid_image(&GrayImage::new(0, 0)));
    assert!(gms_cli::is_valid_image(&dotted_image((0, 0))));
}
