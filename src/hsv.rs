use crate::geometry::Rect;
use crate::image::ColorImage;

/// Size of the hue circle. Hue degrees are halved so they fit a byte.
pub const HUE_RANGE: i32 = 180;

/// Interleaved `h, s, v` bytes, `h` in `[0, 180)`
#[derive(Clone, Debug, PartialEq)]
pub struct HsvImage {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl HsvImage {
    /// Convert the part of `frame` covered by `rect`. The rect must lie inside the frame.
    pub fn from_region(frame: &ColorImage, rect: Rect) -> HsvImage {
        let rect = rect.intersect(&frame.bounds());
        let width = rect.width.max(0) as usize;
        let height = rect.height.max(0) as usize;
        let mut data = Vec::with_capacity(width * height * 3);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                data.extend_from_slice(&rgb_to_hsv(frame.rgb(x as usize, y as usize)));
            }
        }
        HsvImage {
            data,
            width,
            height,
        }
    }

    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

/// 8-bit RGB to HSV: `v = max`, `s = 255 (max - min) / max`, hue in half degrees.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as i32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0 {
        0
    } else {
        ((255 * delta) as f32 / max as f32).round() as i32
    };

    let h = if delta == 0 {
        0.
    } else {
        let delta = delta as f32;
        let mut degrees = if max == r {
            60. * (g - b) as f32 / delta
        } else if max == g {
            120. + 60. * (b - r) as f32 / delta
        } else {
            240. + 60. * (r - g) as f32 / delta
        };
        if degrees < 0. {
            degrees += 360.;
        }
        degrees / 2.
    };
    let mut h = h.round() as i32;
    if h >= HUE_RANGE {
        h -= HUE_RANGE;
    }

    [h as u8, s as u8, max as u8]
}
