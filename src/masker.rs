use crate::hsv::HsvImage;
use crate::hue::HueModel;
use crate::image::Image;
use crate::morphology::{Kernel, Morphology};

/// Turns an hsv image into a per-object binary mask. Scratch buffers are
/// kept, so masking the same roi size again does not allocate.
#[derive(Clone, Debug)]
pub struct HueMasker {
    morphology: Morphology,
}

impl HueMasker {
    pub fn new(morph_radius: usize) -> Self {
        Self {
            morphology: Morphology::new(Kernel::ellipse(morph_radius)),
        }
    }

    /// Threshold, then one opening and one closing. Opening goes first so
    /// speckle is gone before closing could merge it into a blob.
    pub fn mask(&mut self, hsv: &HsvImage, model: &HueModel, out: &mut Image) {
        threshold(hsv, model, out);
        self.morphology.open(out);
        self.morphology.close(out);
    }
}

/// Raw in-range test, 255 where the pixel fits the model
pub fn threshold(hsv: &HsvImage, model: &HueModel, out: &mut Image) {
    let ranges = model.hue_ranges();
    out.data.clear();
    out.data.extend(
        hsv.pixels()
            .map(|p| if model.matches(&ranges, p) { 255 } else { 0 }),
    );
    out.width = hsv.width;
    out.height = hsv.height;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hue_strip() -> HsvImage {
        HsvImage {
            data: (0..180u8).flat_map(|h| [h, 255, 255]).collect(),
            width: 180,
            height: 1,
        }
    }

    fn selected(mask: &Image) -> Vec<u8> {
        (0..180u8).filter(|&h| mask.value(h as usize, 0) != 0).collect()
    }

    fn model(center: u8, tolerance: u8) -> HueModel {
        HueModel {
            center,
            tolerance,
            min_saturation: 80,
            min_value: 60,
        }
    }

    #[test]
    fn test_threshold_low_wrap() {
        let mut mask = Image::empty();
        threshold(&hue_strip(), &model(5, 12), &mut mask);
        let expected: Vec<u8> = (0..=17).chain(173..=179).collect();
        assert_eq!(selected(&mask), expected);
    }

    #[test]
    fn test_threshold_high_wrap() {
        let mut mask = Image::empty();
        threshold(&hue_strip(), &model(175, 10), &mut mask);
        let expected: Vec<u8> = (0..=5).chain(165..=179).collect();
        assert_eq!(selected(&mask), expected);
    }

    #[test]
    fn test_mask_drops_speckle_keeps_object() {
        let (w, h) = (40, 30);
        let mut hsv = HsvImage {
            data: vec![0; w * h * 3],
            width: w,
            height: h,
        };
        let mut paint = |x: usize, y: usize, px: [u8; 3]| {
            let i = (y * w + x) * 3;
            hsv.data[i..i + 3].copy_from_slice(&px);
        };
        for y in 10..22 {
            for x in 15..27 {
                paint(x, y, [60, 255, 255]);
            }
        }
        paint(3, 3, [60, 255, 255]);
        // right hue but too dark
        for y in 2..8 {
            for x in 30..36 {
                paint(x, y, [60, 255, 20]);
            }
        }

        let mut mask = Image::empty();
        let mut masker = HueMasker::new(2);
        masker.mask(&hsv, &model(60, 8), &mut mask);
        assert_eq!(mask.value(3, 3), 0);
        assert_eq!(mask.value(32, 4), 0);
        assert_eq!(mask.value(20, 15), 255);
        assert_eq!(mask.value(15, 15), 255);

        // scratch state does not leak from one model into the next
        let first = mask.clone();
        masker.mask(&hsv, &model(120, 8), &mut mask);
        assert_eq!(mask.count_nonzero(), 0);
        masker.mask(&hsv, &model(60, 8), &mut mask);
        assert_eq!(mask, first);
    }
}
