use nalgebra as na;

/// Sub-pixel position in image space, x to the right and y down.
pub type Vector2f = na::Vector2<f32>;
