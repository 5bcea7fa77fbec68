use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};

/// Tuned constants of the tracker. The defaults were picked for one
/// camera and lighting setup and are worth revisiting for others.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[derive(clap::Parser)]
#[serde(default)]
pub struct TrackerConfig {
    /// Max displacement of a blob between two frames, roi pixels
    #[clap(long, default_value = "120")]
    pub gate_radius: f32,

    /// Contours with a smaller polygon area are noise
    #[clap(long, default_value = "8")]
    pub min_blob_area: f32,

    /// Enclosing circles with a smaller radius are noise
    #[clap(long, default_value = "1.5")]
    pub min_blob_radius: f32,

    /// Margin added around the enclosing circle of a match
    #[clap(long, default_value = "2")]
    pub box_padding: f32,

    /// Radius of the elliptical structuring element
    #[clap(long, default_value = "2")]
    pub morph_radius: usize,

    /// Calibration samples a (2r+1)^2 patch
    #[clap(long, default_value = "4")]
    pub patch_radius: usize,

    #[clap(long, default_value = "10")]
    pub min_calibration_samples: usize,

    #[clap(long, default_value = "60")]
    pub calibration_min_saturation: u8,

    #[clap(long, default_value = "40")]
    pub calibration_min_value: u8,

    #[clap(long, default_value = "80")]
    pub tracking_min_saturation: u8,

    #[clap(long, default_value = "60")]
    pub tracking_min_value: u8,

    #[clap(long, default_value = "8")]
    pub tolerance_min: f32,

    #[clap(long, default_value = "30")]
    pub tolerance_max: f32,

    /// Hue tolerance grows by this factor of the mean sample spread
    #[clap(long, default_value = "2.5")]
    pub tolerance_spread_gain: f32,

    #[clap(long, default_value = "6")]
    pub tolerance_offset: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            gate_radius: 120.,
            min_blob_area: 8.,
            min_blob_radius: 1.5,
            box_padding: 2.,
            morph_radius: 2,
            patch_radius: 4,
            min_calibration_samples: 10,
            calibration_min_saturation: 60,
            calibration_min_value: 40,
            tracking_min_saturation: 80,
            tracking_min_value: 60,
            tolerance_min: 8.,
            tolerance_max: 30.,
            tolerance_spread_gain: 2.5,
            tolerance_offset: 6.,
        }
    }
}

impl TrackerConfig {
    /// Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open config {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}
