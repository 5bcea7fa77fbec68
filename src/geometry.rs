use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::my_types::*;

/// Axis-aligned integer rectangle, `(x, y)` is the top-left pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Saturates at `i32::MAX` for rects reaching past the coordinate range
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Overlap of both rectangles, or an all-zero rectangle when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Rect::default();
        }
        Rect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Geometric center, `x + w/2, y + h/2`
    pub fn center(&self) -> Vector2f {
        Vector2f::new(
            self.x as f32 + 0.5 * self.width as f32,
            self.y as f32 + 0.5 * self.height as f32,
        )
    }

    pub fn origin(&self) -> Vector2f {
        Vector2f::new(self.x as f32, self.y as f32)
    }

    pub fn to_array(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Parse `[x, y, w, h, x, y, w, h, ...]`.
    pub fn from_flat(values: &[i32]) -> Result<Vec<Rect>> {
        if values.is_empty() || values.len() % 4 != 0 {
            return Err(TrackError::InvalidBoxCount { len: values.len() });
        }
        Ok(values
            .chunks_exact(4)
            .map(|c| Rect::new(c[0], c[1], c[2], c[3]))
            .collect())
    }

    pub fn write_flat(rects: &[Rect], out: &mut [i32]) {
        for (rect, chunk) in rects.iter().zip(out.chunks_exact_mut(4)) {
            chunk.copy_from_slice(&rect.to_array());
        }
    }
}

impl From<[i32; 4]> for Rect {
    fn from(v: [i32; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vector2f,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vector2f, radius: f32) -> Self {
        Circle { center, radius }
    }
}
