use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use symbol_scan_types::{PixelQuad, Point};
use thiserror::Error;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Smallest quad area, in square pixels, worth warping.
const MIN_QUAD_AREA: f32 = 0.5;

/// Smallest area of the triangle spanned by any three corners.
const MIN_CORNER_TRIANGLE_AREA: f32 = 0.25;

#[derive(Debug, Error, PartialEq)]
pub enum RectifyError {
    #[error("character box covers no whole pixels")]
    EmptyCrop,
    #[error("character box has non-finite corners")]
    NonFinite,
    #[error("character box corners do not span a quadrilateral")]
    Degenerate,
}

/// Crops `quad` out of `image` and warps it into an upright rectangle.
///
/// The crop is the quad's bounding rectangle widened to whole pixels. The
/// output is as wide as the longer of the top and bottom edges and as tall as
/// the longer of the left and right edges. Samples falling outside the crop
/// are transparent.
pub fn rectify(image: &RgbaImage, quad: &PixelQuad) -> Result<RgbaImage, RectifyError> {
    if !quad
        .corners()
        .iter()
        .all(|corner| corner.x.is_finite() && corner.y.is_finite())
    {
        return Err(RectifyError::NonFinite);
    }

    let (left, top, crop_width, crop_height) = quad
        .bounding_rect()
        .pixel_bounds(image.width(), image.height())
        .ok_or(RectifyError::EmptyCrop)?;
    if is_degenerate(quad) {
        return Err(RectifyError::Degenerate);
    }
    let crop = imageops::crop_imm(image, left, top, crop_width, crop_height).to_image();
    let local = quad.translated(left as f32, top as f32);

    let (out_width, out_height) = output_size(&local);
    let projection = Projection::from_control_points(
        [
            as_pair(local.top_left),
            as_pair(local.top_right),
            as_pair(local.bottom_right),
            as_pair(local.bottom_left),
        ],
        [
            (0.0, 0.0),
            (out_width as f32, 0.0),
            (out_width as f32, out_height as f32),
            (0.0, out_height as f32),
        ],
    )
    .ok_or(RectifyError::Degenerate)?;

    let mut rectified = RgbaImage::new(out_width, out_height);
    warp_into(
        &crop,
        &projection,
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut rectified,
    );
    Ok(rectified)
}

/// True when the quad encloses almost no area or three of its corners are
/// nearly collinear.
fn is_degenerate(quad: &PixelQuad) -> bool {
    // Perimeter order for the shoelace formula.
    let ring = [
        quad.top_left,
        quad.top_right,
        quad.bottom_right,
        quad.bottom_left,
    ];
    let doubled: f32 = (0..4)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % 4]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    if doubled.abs() / 2.0 < MIN_QUAD_AREA {
        return true;
    }
    (0..4).any(|i| {
        triangle_area(ring[i], ring[(i + 1) % 4], ring[(i + 2) % 4]) < MIN_CORNER_TRIANGLE_AREA
    })
}

fn triangle_area(a: Point, b: Point, c: Point) -> f32 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

fn output_size(quad: &PixelQuad) -> (u32, u32) {
    let width = quad
        .top_left
        .distance(quad.top_right)
        .max(quad.bottom_left.distance(quad.bottom_right));
    let height = quad
        .top_left
        .distance(quad.bottom_left)
        .max(quad.top_right.distance(quad.bottom_right));
    (to_extent(width), to_extent(height))
}

fn to_extent(length: f32) -> u32 {
    length.round().max(1.0) as u32
}

fn as_pair(point: Point) -> (f32, f32) {
    (point.x, point.y)
}
