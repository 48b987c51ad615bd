use std::ffi::{CStr, c_char};
use std::slice;

use image::RgbaImage;
use symbol_scan_types::{NormalizedQuad, Point, TextRegion};

use crate::{DetectionError, RegionDetector, validate_regions};

#[repr(C)]
#[derive(Clone, Copy)]
struct CVisionPoint {
    x: f32,
    y: f32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct CVisionQuad {
    top_left: CVisionPoint,
    top_right: CVisionPoint,
    bottom_left: CVisionPoint,
    bottom_right: CVisionPoint,
}

#[repr(C)]
struct CVisionTextRegion {
    boxes: *mut CVisionQuad,
    count: usize,
}

#[repr(C)]
struct CVisionTextResult {
    regions: *mut CVisionTextRegion,
    count: usize,
    error: *mut c_char,
}

unsafe extern "C" {
    fn vision_detect_character_boxes(
        rgba: *const u8,
        width: usize,
        height: usize,
        bytes_per_row: usize,
    ) -> CVisionTextResult;

    fn vision_text_result_destroy(result: CVisionTextResult);
}

struct OwnedVisionTextResult {
    raw: CVisionTextResult,
}

impl OwnedVisionTextResult {
    fn new(raw: CVisionTextResult) -> Self {
        Self { raw }
    }

    fn error_message(&self) -> Option<String> {
        if self.raw.error.is_null() {
            None
        } else {
            Some(
                unsafe { CStr::from_ptr(self.raw.error) }
                    .to_string_lossy()
                    .into_owned(),
            )
        }
    }

    fn regions(&self) -> &[CVisionTextRegion] {
        if self.raw.count == 0 || self.raw.regions.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.raw.regions, self.raw.count) }
        }
    }
}

impl CVisionTextRegion {
    fn boxes(&self) -> &[CVisionQuad] {
        if self.count == 0 || self.boxes.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.boxes, self.count) }
        }
    }
}

impl Drop for OwnedVisionTextResult {
    fn drop(&mut self) {
        unsafe {
            vision_text_result_destroy(CVisionTextResult {
                regions: self.raw.regions,
                count: self.raw.count,
                error: self.raw.error,
            });
        }
        self.raw.regions = std::ptr::null_mut();
        self.raw.error = std::ptr::null_mut();
        self.raw.count = 0;
    }
}

/// Apple Vision text-rectangle detector with per-character boxes.
#[derive(Debug, Clone, Default)]
pub struct VisionTextDetector;

impl VisionTextDetector {
    pub fn new() -> Self {
        Self
    }
}

impl RegionDetector for VisionTextDetector {
    fn name(&self) -> &'static str {
        "macos_vision"
    }

    fn detect(&self, image: &RgbaImage) -> Result<Vec<TextRegion>, DetectionError> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        if width == 0 || height == 0 {
            return Err(DetectionError::EmptyImage);
        }
        let bytes_per_row = width * 4;
        let data = image.as_raw();

        let raw =
            unsafe { vision_detect_character_boxes(data.as_ptr(), width, height, bytes_per_row) };
        let owned = OwnedVisionTextResult::new(raw);
        if let Some(message) = owned.error_message() {
            return Err(DetectionError::Vision(message));
        }

        let regions: Vec<TextRegion> = owned
            .regions()
            .iter()
            .map(|region| TextRegion::new(region.boxes().iter().map(convert_quad).collect()))
            .collect();
        validate_regions(&regions)?;
        Ok(regions)
    }
}

fn convert_quad(quad: &CVisionQuad) -> NormalizedQuad {
    let point = |p: CVisionPoint| Point::new(p.x, p.y);
    NormalizedQuad::new(
        point(quad.top_left),
        point(quad.top_right),
        point(quad.bottom_left),
        point(quad.bottom_right),
    )
}
