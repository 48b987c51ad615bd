use serde::{Deserialize, Serialize};

/// A 2D point. Units depend on the owning type (unit square or pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Character box reported by a detector, in unit coordinates.
///
/// The origin is the top-left corner of the image and `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl NormalizedQuad {
    pub const fn new(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Axis-aligned quad spanning `x..x+width`, `y..y+height`.
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            top_left: Point::new(x, y),
            top_right: Point::new(x + width, y),
            bottom_left: Point::new(x, y + height),
            bottom_right: Point::new(x + width, y + height),
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.corners().iter().all(|corner| corner.is_finite())
    }
}

/// One detected text area. Character boxes keep the detector's order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    #[serde(default)]
    pub characters: Vec<NormalizedQuad>,
}

impl TextRegion {
    pub fn new(characters: Vec<NormalizedQuad>) -> Self {
        Self { characters }
    }
}

/// Scale from unit coordinates to the pixel space of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    sx: f32,
    sy: f32,
}

impl ScaleTransform {
    pub fn for_image(width: u32, height: u32) -> Self {
        Self {
            sx: width as f32,
            sy: height as f32,
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(point.x * self.sx, point.y * self.sy)
    }

    pub fn quad(&self, quad: &NormalizedQuad) -> PixelQuad {
        PixelQuad {
            top_left: self.apply(quad.top_left),
            top_right: self.apply(quad.top_right),
            bottom_left: self.apply(quad.bottom_left),
            bottom_right: self.apply(quad.bottom_right),
        }
    }
}

/// A character box scaled into pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelQuad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl PixelQuad {
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn bounding_rect(&self) -> PixelRect {
        let corners = self.corners();
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for corner in corners {
            min_x = min_x.min(corner.x);
            min_y = min_y.min(corner.y);
            max_x = max_x.max(corner.x);
            max_y = max_y.max(corner.y);
        }
        PixelRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Same quad with every corner moved by `(-dx, -dy)`.
    pub fn translated(&self, dx: f32, dy: f32) -> PixelQuad {
        let shift = |p: Point| Point::new(p.x - dx, p.y - dy);
        PixelQuad {
            top_left: shift(self.top_left),
            top_right: shift(self.top_right),
            bottom_left: shift(self.bottom_left),
            bottom_right: shift(self.bottom_right),
        }
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// True when the rectangle lies entirely inside `[0,width]x[0,height]`.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return false;
        }
        self.x >= 0.0
            && self.y >= 0.0
            && self.max_x() <= width as f32
            && self.max_y() <= height as f32
    }

    /// Whole-pixel bounds `(left, top, width, height)` covering the rectangle,
    /// clamped to the image. `None` when nothing is left.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.floor().clamp(0.0, width as f32) as u32;
        let top = self.y.floor().clamp(0.0, height as f32) as u32;
        let right = self.max_x().ceil().clamp(left as f32, width as f32) as u32;
        let bottom = self.max_y().ceil().clamp(top as f32, height as f32) as u32;
        let w = right.saturating_sub(left);
        let h = bottom.saturating_sub(top);
        if w == 0 || h == 0 {
            return None;
        }
        Some((left, top, w, h))
    }
}
