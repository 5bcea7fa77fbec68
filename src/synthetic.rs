use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context as AnyhowContext, Result};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::image::{ColorImage, PixelFormat};
use crate::my_types::*;

/// A colored disk moving at constant velocity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub rgb: [u8; 3],
    pub radius: f32,
    pub start: [f32; 2],
    /// Pixels per frame
    pub velocity: [f32; 2],
}

impl SceneObject {
    pub fn position(&self, frame_index: usize) -> Vector2f {
        let t = frame_index as f32;
        Vector2f::new(
            self.start[0] + t * self.velocity[0],
            self.start[1] + t * self.velocity[1],
        )
    }

    /// Tight box around the disk
    pub fn bounding_box(&self, frame_index: usize) -> Rect {
        let p = self.position(frame_index);
        let r = self.radius.ceil() as i32;
        Rect::new(
            p.x.round() as i32 - r,
            p.y.round() as i32 - r,
            2 * r + 1,
            2 * r + 1,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub background: [u8; 3],
    /// Max per-channel deviation of the background
    pub noise: u8,
    pub seed: u64,
    pub objects: Vec<SceneObject>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            background: [40, 40, 40],
            noise: 6,
            seed: 0,
            objects: vec![
                SceneObject {
                    rgb: [220, 30, 30],
                    radius: 9.,
                    start: [60., 60.],
                    velocity: [1.5, 0.5],
                },
                SceneObject {
                    rgb: [30, 200, 40],
                    radius: 11.,
                    start: [250., 80.],
                    velocity: [-1., 1.],
                },
                SceneObject {
                    rgb: [40, 60, 230],
                    radius: 8.,
                    start: [160., 190.],
                    velocity: [0.5, -1.2],
                },
            ],
        }
    }
}

impl SceneConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open scene {}", path.display()))?;
        let scene: SceneConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("invalid scene {}", path.display()))?;
        if scene.width == 0 || scene.height == 0 {
            bail!("scene {} has no pixels", path.display());
        }
        Ok(scene)
    }
}

/// Renders the frames of a scene, the same index always gives the same frame
pub struct SyntheticScene {
    pub config: SceneConfig,
}

impl SyntheticScene {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, frame_index: usize) -> ColorImage {
        let c = &self.config;
        let mut frame = ColorImage::filled(c.width, c.height, PixelFormat::Rgba, c.background);
        if c.noise > 0 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(c.seed ^ frame_index as u64);
            let noise = c.noise as i16;
            for y in 0..c.height {
                for x in 0..c.width {
                    let rgb = c.background.map(|v| {
                        (v as i16 + rng.gen_range(-noise..=noise)).clamp(0, 255) as u8
                    });
                    frame.set_rgb(x, y, rgb);
                }
            }
        }

        for object in &c.objects {
            let center = object.position(frame_index);
            let r2 = object.radius * object.radius;
            let area = object.bounding_box(frame_index).intersect(&frame.bounds());
            for y in area.y..area.bottom() {
                for x in area.x..area.right() {
                    let d = Vector2f::new(x as f32, y as f32) - center;
                    if d.norm_squared() <= r2 {
                        frame.set_rgb(x as usize, y as usize, object.rgb);
                    }
                }
            }
        }
        frame
    }
}
