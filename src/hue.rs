use std::f64::consts::PI;

use crate::hsv::HUE_RANGE;

/// Inclusive hue interval on the circle, never wrapping itself
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HueRange {
    pub low: u8,
    pub high: u8,
}

impl HueRange {
    pub fn contains(&self, hue: u8) -> bool {
        hue >= self.low && hue <= self.high
    }
}

/// Color signature of one tracked object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HueModel {
    /// In `[0, 180)`
    pub center: u8,
    /// Half width of the accepted hue band
    pub tolerance: u8,
    pub min_saturation: u8,
    pub min_value: u8,
}

impl HueModel {
    /// Accepted hue band split at the 0/180 seam: one range, or two when it wraps.
    pub fn hue_ranges(&self) -> Vec<HueRange> {
        let max = (HUE_RANGE - 1) as u8;
        let low = self.center as i32 - self.tolerance as i32;
        let high = self.center as i32 + self.tolerance as i32;
        if low < 0 {
            vec![
                HueRange {
                    low: 0,
                    high: high.min(max as i32) as u8,
                },
                HueRange {
                    low: (low + HUE_RANGE).max(0) as u8,
                    high: max,
                },
            ]
        } else if high > max as i32 {
            vec![
                HueRange {
                    low: low as u8,
                    high: max,
                },
                HueRange {
                    low: 0,
                    high: (high - HUE_RANGE).min(max as i32) as u8,
                },
            ]
        } else {
            vec![HueRange {
                low: low as u8,
                high: high as u8,
            }]
        }
    }

    pub fn matches(&self, ranges: &[HueRange], hsv: [u8; 3]) -> bool {
        let [h, s, v] = hsv;
        s >= self.min_saturation && v >= self.min_value && ranges.iter().any(|r| r.contains(h))
    }
}

/// Hue state of a track. A calibrated hue of 0 (red) is a real color,
/// so "never calibrated" gets its own variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackHue {
    #[default]
    Uncalibrated,
    Calibrated(HueModel),
}

impl TrackHue {
    pub fn model(&self) -> Option<&HueModel> {
        match self {
            TrackHue::Uncalibrated => None,
            TrackHue::Calibrated(model) => Some(model),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, TrackHue::Calibrated(_))
    }
}

/// Mean of hue samples computed on the circle, so 178 and 2 average to 0.
/// Returns None for no samples.
pub fn circular_mean_hue(hues: &[u8]) -> Option<u8> {
    if hues.is_empty() {
        return None;
    }
    let (mut sum_sin, mut sum_cos) = (0_f64, 0_f64);
    for &h in hues {
        let angle = 2. * PI * h as f64 / HUE_RANGE as f64;
        sum_sin += angle.sin();
        sum_cos += angle.cos();
    }
    let mut mean = sum_sin.atan2(sum_cos);
    if mean < 0. {
        mean += 2. * PI;
    }
    let mut hue = (mean * HUE_RANGE as f64 / (2. * PI)).round() as i32;
    if hue >= HUE_RANGE {
        hue -= HUE_RANGE;
    }
    Some(hue as u8)
}

/// Shortest way around the hue circle, at most 90
pub fn hue_dist(a: u8, b: u8) -> u8 {
    let d = (a as i32 - b as i32).abs();
    d.min(HUE_RANGE - d) as u8
}
