use crate::geometry::{Circle, Rect};

/// Turns a matched circle into an output box in frame coordinates
#[derive(Clone, Copy, Debug)]
pub struct BoxBuilder {
    padding: f32,
}

impl BoxBuilder {
    pub fn new(padding: f32) -> Self {
        Self { padding }
    }

    /// Square of side `2 (r + pad)` around the roi-local `circle`, clamped to
    /// the roi and shifted by the roi origin.
    pub fn build(&self, circle: &Circle, roi: &Rect) -> Rect {
        let half = circle.radius + self.padding;
        let x = (circle.center.x - half).max(0.);
        let y = (circle.center.y - half).max(0.);
        let width = (2. * half).min(roi.width as f32 - x).max(0.);
        let height = (2. * half).min(roi.height as f32 - y).max(0.);

        Rect::new(
            (x + roi.x as f32).round() as i32,
            (y + roi.y as f32).round() as i32,
            width.round() as i32,
            height.round() as i32,
        )
    }
}
