use ndarray as nd;

use crate::geometry::Rect;

/// Row-major single channel storage, used for binary masks (0 or 255)
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Image {
    /// Create an empty image
    pub fn empty() -> Image {
        Image {
            data: vec![],
            width: 0,
            height: 0,
        }
    }

    /// All-zero image of the given shape
    pub fn zeros(width: usize, height: usize) -> Image {
        Image {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    /// Clear the image storage
    pub fn clear(&mut self) {
        self.data.clear();
        self.width = 0;
        self.height = 0;
    }

    #[inline(always)]
    pub fn value(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline(always)]
    pub fn set_value(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Foreground test that treats everything outside the image as background
    #[inline(always)]
    pub fn is_set_i32(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && self.data[y as usize * self.width + x as usize] != 0
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Row-major interleaved color frame
#[derive(Clone, Debug, PartialEq)]
pub struct ColorImage {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
}

impl ColorImage {
    /// Frame filled with one color; alpha is opaque for RGBA
    pub fn filled(width: usize, height: usize, format: PixelFormat, rgb: [u8; 3]) -> ColorImage {
        let pixel: Vec<u8> = match format {
            PixelFormat::Rgb => rgb.to_vec(),
            PixelFormat::Rgba => vec![rgb[0], rgb[1], rgb[2], 255],
        };
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width * height * format.channels())
            .collect();
        ColorImage {
            data,
            width,
            height,
            format,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    #[inline(always)]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.format.channels()
    }

    #[inline(always)]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Writes the color channels, alpha is left as is
    #[inline(always)]
    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Paint a rectangle, clipped to the frame
    pub fn fill_rect(&mut self, rect: Rect, rgb: [u8; 3]) {
        let r = rect.intersect(&self.bounds());
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                self.set_rgb(x as usize, y as usize, rgb);
            }
        }
    }

    /// `(height, width, 3)` RGB copy, the layout image viewers expect
    pub fn to_array3(&self) -> nd::Array3<u8> {
        nd::Array3::from_shape_fn((self.height, self.width, 3), |(y, x, c)| {
            self.data[self.offset(x, y) + c]
        })
    }
}
