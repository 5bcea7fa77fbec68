use log::debug;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackError};
use crate::geometry::Rect;
use crate::hsv::HsvImage;
use crate::hue::*;
use crate::image::ColorImage;
use crate::my_types::*;

/// Derives a hue model from a small patch around a user selected point
#[derive(Clone, Debug)]
pub struct HueModelEstimator {
    patch_radius: i32,
    min_samples: usize,
    sample_min_saturation: u8,
    sample_min_value: u8,
    tolerance_min: f32,
    tolerance_max: f32,
    spread_gain: f32,
    spread_offset: f32,
    // floors written into the model, stricter than the sampling ones
    model_min_saturation: u8,
    model_min_value: u8,
}

impl HueModelEstimator {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            patch_radius: config.patch_radius as i32,
            min_samples: config.min_calibration_samples,
            sample_min_saturation: config.calibration_min_saturation,
            sample_min_value: config.calibration_min_value,
            tolerance_min: config.tolerance_min,
            tolerance_max: config.tolerance_max,
            spread_gain: config.tolerance_spread_gain,
            spread_offset: config.tolerance_offset,
            model_min_saturation: config.tracking_min_saturation,
            model_min_value: config.tracking_min_value,
        }
    }

    /// Square patch of side `2r + 1` around `center`, clipped to `roi`.
    /// `center` is roi-local, the returned rect is in frame coordinates.
    pub fn patch_rect(&self, roi: Rect, center: Vector2f) -> Rect {
        let cx = center.x.round() as i32;
        let cy = center.y.round() as i32;
        let r = self.patch_radius;
        let x0 = cx.saturating_sub(r).max(0);
        let y0 = cy.saturating_sub(r).max(0);
        let x1 = cx.saturating_add(r).min(roi.width - 1);
        let y1 = cy.saturating_add(r).min(roi.height - 1);
        if x1 < x0 || y1 < y0 {
            return Rect::default();
        }
        Rect::new(roi.x + x0, roi.y + y0, x1 - x0 + 1, y1 - y0 + 1)
    }

    /// Sample the frame around the roi-local `center` and estimate a model.
    pub fn calibrate(&self, frame: &ColorImage, roi: Rect, center: Vector2f) -> Result<HueModel> {
        let patch = self.patch_rect(roi, center);
        if patch.is_empty() {
            return Err(TrackError::CalibrationInsufficientSamples {
                found: 0,
                required: self.min_samples,
            });
        }
        self.estimate(&HsvImage::from_region(frame, patch))
    }

    pub fn estimate(&self, patch: &HsvImage) -> Result<HueModel> {
        // drop background and shadows
        let samples: Vec<u8> = patch
            .pixels()
            .filter(|[_, s, v]| *s >= self.sample_min_saturation && *v >= self.sample_min_value)
            .map(|[h, _, _]| h)
            .collect();

        let center = match circular_mean_hue(&samples) {
            Some(center) if samples.len() >= self.min_samples => center,
            _ => {
                return Err(TrackError::CalibrationInsufficientSamples {
                    found: samples.len(),
                    required: self.min_samples,
                })
            }
        };

        let spread = samples
            .iter()
            .map(|&h| hue_dist(h, center) as f32)
            .sum::<f32>()
            / samples.len() as f32;
        let tolerance = (spread * self.spread_gain + self.spread_offset)
            .clamp(self.tolerance_min, self.tolerance_max)
            .round();

        debug!(
            "hue model from {} samples: center {center}, spread {spread:.2}, tolerance {tolerance}",
            samples.len()
        );

        Ok(HueModel {
            center,
            tolerance: tolerance as u8,
            min_saturation: self.model_min_saturation,
            min_value: self.model_min_value,
        })
    }
}
