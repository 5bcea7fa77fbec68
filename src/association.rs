use crate::blob::Blob;
use crate::my_types::*;

/// Gate for matching a track to the blobs of the current frame.
#[derive(Clone, Copy, Debug)]
pub struct Associator {
    gate_radius: f32,
}

impl Associator {
    pub fn new(gate_radius: f32) -> Self {
        Self { gate_radius }
    }

    /// Nearest blob strictly inside the gate around `previous`. On equal
    /// distance the earlier blob wins. None means the object is lost for
    /// this frame.
    pub fn associate<'a>(&self, blobs: &'a [Blob], previous: Vector2f) -> Option<&'a Blob> {
        let mut best_d2 = self.gate_radius * self.gate_radius;
        let mut best = None;
        for blob in blobs {
            let d2 = (blob.center - previous).norm_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best = Some(blob);
            }
        }
        best
    }
}
