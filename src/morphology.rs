use crate::image::Image;

/// Structuring element stored as one horizontal run per row: `[dy, half]`
/// covers the cells `dx in -half..=half`. Every kernel here is symmetric.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    pub rows: Vec<[i32; 2]>,
}

impl Kernel {
    /// Ellipse inscribed in a `(2r+1) x (2r+1)` square. For r = 2:
    ///
    /// ```text
    /// . . x . .
    /// x x x x x
    /// x x x x x
    /// x x x x x
    /// . . x . .
    /// ```
    pub fn ellipse(radius: usize) -> Kernel {
        let r = radius as i32;
        if r == 0 {
            return Kernel { rows: vec![[0, 0]] };
        }
        let inv_r2 = 1. / (r * r) as f64;
        let rows = (-r..=r)
            .map(|dy| {
                let half = (r as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
                [dy, half]
            })
            .collect();
        Kernel { rows }
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|[_, half]| 2 * *half as usize + 1).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rule {
    Erode,
    Dilate,
}

/// Erosion and dilation with a fixed kernel. The intermediate image of
/// open/close and the per-row prefix counts are kept between calls.
#[derive(Clone, Debug)]
pub struct Morphology {
    kernel: Kernel,
    tmp: Image,
    prefix: Vec<u32>,
}

impl Morphology {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            tmp: Image::empty(),
            prefix: vec![],
        }
    }

    /// Pixels outside the image are ignored, so the border never erodes.
    pub fn erode(&mut self, src: &Image, dst: &mut Image) {
        apply(src, &self.kernel, &mut self.prefix, dst, Rule::Erode)
    }

    /// Pixels outside the image are ignored, so nothing grows in from the border.
    pub fn dilate(&mut self, src: &Image, dst: &mut Image) {
        apply(src, &self.kernel, &mut self.prefix, dst, Rule::Dilate)
    }

    /// Erode then dilate, removes specks smaller than the kernel
    pub fn open(&mut self, mask: &mut Image) {
        apply(mask, &self.kernel, &mut self.prefix, &mut self.tmp, Rule::Erode);
        apply(&self.tmp, &self.kernel, &mut self.prefix, mask, Rule::Dilate);
    }

    /// Dilate then erode, fills holes smaller than the kernel
    pub fn close(&mut self, mask: &mut Image) {
        apply(mask, &self.kernel, &mut self.prefix, &mut self.tmp, Rule::Dilate);
        apply(&self.tmp, &self.kernel, &mut self.prefix, mask, Rule::Erode);
    }
}

/// `prefix[y * (w + 1) + x]` counts the set pixels of row `y` left of `x`, so
/// every kernel row costs one subtraction per pixel.
fn apply(src: &Image, kernel: &Kernel, prefix: &mut Vec<u32>, dst: &mut Image, rule: Rule) {
    let (w, h) = (src.width, src.height);
    let stride = w + 1;

    prefix.clear();
    prefix.reserve(stride * h);
    for row in src.data.chunks_exact(w.max(1)).take(h) {
        let mut count = 0;
        prefix.push(0);
        for &v in row {
            count += (v != 0) as u32;
            prefix.push(count);
        }
    }

    dst.data.clear();
    dst.data.reserve(w * h);
    dst.width = w;
    dst.height = h;

    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let mut hit = rule == Rule::Erode;
            for &[dy, half] in &kernel.rows {
                let ny = y + dy;
                if ny < 0 || ny >= h as i32 {
                    continue;
                }
                let x0 = (x - half).max(0) as usize;
                let x1 = (x + half).min(w as i32 - 1) as usize;
                let row = &prefix[ny as usize * stride..(ny as usize + 1) * stride];
                let set = row[x1 + 1] - row[x0];
                match rule {
                    Rule::Erode if set as usize != x1 - x0 + 1 => {
                        hit = false;
                        break;
                    }
                    Rule::Dilate if set > 0 => {
                        hit = true;
                        break;
                    }
                    _ => {}
                }
            }
            dst.data.push(if hit { 255 } else { 0 });
        }
    }
}
