use crate::contour::find_external_contours;
use crate::geometry::Circle;
use crate::image::Image;
use crate::my_types::*;

/// A candidate object in the mask, reduced to its enclosing circle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    pub center: Vector2f,
    pub radius: f32,
    pub area: f32,
}

impl Blob {
    pub fn circle(&self) -> Circle {
        Circle::new(self.center, self.radius)
    }
}

#[derive(Clone, Debug)]
pub struct BlobDetector {
    min_area: f32,
    min_radius: f32,
}

impl BlobDetector {
    pub fn new(min_area: f32, min_radius: f32) -> Self {
        Self {
            min_area,
            min_radius,
        }
    }

    /// Blobs of the external contours, in raster order of their top-left pixel
    pub fn detect(&self, mask: &Image) -> Vec<Blob> {
        find_external_contours(mask)
            .iter()
            .filter_map(|contour| {
                let area = contour.area();
                if area < self.min_area {
                    return None;
                }
                let circle = contour.enclosing_circle();
                if circle.radius < self.min_radius {
                    return None;
                }
                Some(Blob {
                    center: circle.center,
                    radius: circle.radius,
                    area,
                })
            })
            .collect()
    }
}
