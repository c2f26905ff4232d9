use gms_cli::{run_demo, save_report, DemoError, DemoOptions, DemoReport};
use image::DynamicImage;
use show_image::{create_window, event, WindowOptions, WindowProxy};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let opts = parse_args();

    if opts.headless {
        run_headless(&opts)
    } else {
        // The windowing context owns the main thread and exits the process
        // with the returned code, tearing down all open windows
        show_image::run_context(move || windowed_exit(opts))
    }
}

/// Argument parsing: only `--headless` and `--detector NAME` are
/// recognized, everything else is ignored
fn parse_args() -> DemoOptions {
    let mut opts = DemoOptions::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--headless" => opts.headless = true,
            "--detector" => {
                if let Some(name) = args.next() {
                    opts.detector = name;
                }
            }
            _ => {}
        }
    }

    opts
}

fn run_headless(opts: &DemoOptions) -> ExitCode {
    let report = match run_demo(opts) {
        Ok(report) => report,
        Err(err) => return report_failure(&err),
    };

    print_counts(&report);

    match save_report(&report, &opts.output_dir) {
        Ok(paths) => {
            for path in paths {
                println!("Saved {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => report_failure(&err),
    }
}

/// Adapter so the windowed exit code satisfies `show_image`'s local
/// `Termination` trait, which `std::process::ExitCode` does not implement
/// on stable.
struct WindowedExit(i32);

impl show_image::termination::Termination for WindowedExit {
    fn report(self) -> i32 {
        self.0
    }
}

fn windowed_exit(opts: DemoOptions) -> WindowedExit {
    match run_windowed(&opts) {
        Ok(()) => WindowedExit(0),
        Err(WindowedError::Demo(err)) => {
            report_failure(&err);
            WindowedExit(1)
        }
        Err(WindowedError::Display(err)) => {
            eprintln!("Display error: {}", err);
            WindowedExit(1)
        }
    }
}

enum WindowedError {
    Demo(DemoError),
    Display(Box<dyn std::error::Error>),
}

impl From<DemoError> for WindowedError {
    fn from(err: DemoError) -> Self {
        WindowedError::Demo(err)
    }
}

fn run_windowed(opts: &DemoOptions) -> Result<(), WindowedError> {
    // Source images go up as soon as validation passes, so they are visible
    // while detection runs; then one window per filter configuration, each
    // gated on a key press
    let (img1, img2) = gms_cli::load_inputs(opts)?;
    let _src1 = show(
        "Dog01 Image",
        DynamicImage::ImageRgba8(gms_cli::gray_to_rgba(&img1)),
    )
    .map_err(WindowedError::Display)?;
    let _src2 = show(
        "Dog02 Image",
        DynamicImage::ImageRgba8(gms_cli::gray_to_rgba(&img2)),
    )
    .map_err(WindowedError::Display)?;

    let report = gms_cli::run_pipeline(opts, &img1, &img2)?;
    print_counts(&report);

    for run in &report.runs {
        let window = show(run.label, DynamicImage::ImageRgba8(run.render.clone()))
            .map_err(WindowedError::Display)?;
        wait_for_key(&window).map_err(WindowedError::Display)?;
    }

    Ok(())
}

fn show(title: &str, img: DynamicImage) -> Result<WindowProxy, Box<dyn std::error::Error>> {
    let window = create_window(title, WindowOptions::default())?;
    window.set_image(title, img)?;
    Ok(window)
}

/// Block until any key press (or the window is closed)
fn wait_for_key(window: &WindowProxy) -> Result<(), Box<dyn std::error::Error>> {
    for ev in window.event_channel()? {
        match ev {
            event::WindowEvent::KeyboardInput(ev) if ev.input.state.is_pressed() => break,
            event::WindowEvent::CloseRequested(_) | event::WindowEvent::Destroyed(_) => break,
            _ => {}
        }
    }
    Ok(())
}

fn print_counts(report: &DemoReport) {
    println!(
        "Detected {} / {} keypoints, {} brute-force matches",
        report.keypoints.0, report.keypoints.1, report.total_matches
    );
    for run in &report.runs {
        println!("{}: {} matches", run.label, run.kept);
    }
}

fn report_failure(err: &DemoError) -> ExitCode {
    eprintln!("{}", err);
    if matches!(err, DemoError::ImageLoad { .. } | DemoError::InvalidImage { .. }) {
        eprintln!(
            "Please check that dog01.jpg and dog02.jpg images exist in the working directory."
        );
    }
    ExitCode::FAILURE
}
