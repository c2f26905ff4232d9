use gms_core::{Keypoint, Match};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

/// Cycled line/circle colors, one per match
const MATCH_COLORS: [Rgba<u8>; 6] = [
    Rgba([255, 0, 0, 255]),
    Rgba([0, 200, 0, 255]),
    Rgba([64, 64, 255, 255]),
    Rgba([255, 160, 0, 255]),
    Rgba([0, 200, 200, 255]),
    Rgba([255, 0, 255, 255]),
];

const CIRCLE_RADIUS: i32 = 3;

/// Convert a grayscale image to RGBA for drawing
pub fn gray_to_rgba(img: &GrayImage) -> RgbaImage {
    image::DynamicImage::ImageLuma8(img.clone()).into_rgba8()
}

/// Place two images side by side on a shared canvas, padding the shorter
/// one with black
pub fn side_by_side(a: &GrayImage, b: &GrayImage) -> RgbaImage {
    let width = a.width() + b.width();
    let height = a.height().max(b.height());
    let mut canvas = RgbaImage::new(width, height);

    for (x, y, pixel) in a.enumerate_pixels() {
        let v = pixel.0[0];
        canvas.put_pixel(x, y, Rgba([v, v, v, 255]));
    }
    for (x, y, pixel) in b.enumerate_pixels() {
        let v = pixel.0[0];
        canvas.put_pixel(x + a.width(), y, Rgba([v, v, v, 255]));
    }

    canvas
}

/// Render a match set as an annotated side-by-side image: a circle on each
/// matched keypoint and a line joining the pair, right image offset by the
/// left image's width
pub fn draw_matches(
    img1: &GrayImage,
    kp1: &[Keypoint],
    img2: &GrayImage,
    kp2: &[Keypoint],
    matches: &[Match],
) -> RgbaImage {
    let mut canvas = side_by_side(img1, img2);
    let offset = img1.width() as f32;

    for (i, m) in matches.iter().enumerate() {
        let color = MATCH_COLORS[i % MATCH_COLORS.len()];
        let p1 = &kp1[m.query_idx];
        let p2 = &kp2[m.train_idx];
        let start = (p1.x, p1.y);
        let end = (p2.x + offset, p2.y);

        draw_line_segment_mut(&mut canvas, start, end, color);
        draw_hollow_circle_mut(&mut canvas, (start.0 as i32, start.1 as i32), CIRCLE_RADIUS, color);
        draw_hollow_circle_mut(&mut canvas, (end.0 as i32, end.1 as i32), CIRCLE_RADIUS, color);
    }

    canvas
}
