#[cfg(feature = "opencv")]
use cv2::prelude::*;
#[cfg(feature = "opencv")]
use opencv as cv2;

#[cfg(feature = "opencv")]
use anyhow::{bail, Result};

use ::image::{ImageBuffer, Rgb, Rgba};
use imageproc::drawing::{draw_hollow_rect_mut, Canvas};
use imageproc::rect::Rect as PixelRect;

use crate::geometry::Rect;
use crate::image::{ColorImage, PixelFormat};

pub const OUTLINE_COLOR: [u8; 3] = [255, 0, 0];
pub const OUTLINE_THICKNESS: i32 = 2;

/// Rectangle outline growing inwards from `rect`. The rect is clipped to the
/// frame first, so a box hanging over the border gets an edge along it.
pub fn draw_rect(frame: &mut ColorImage, rect: Rect, rgb: [u8; 3], thickness: i32) {
    let rect = rect.intersect(&frame.bounds());
    if rect.is_empty() {
        return;
    }
    let (width, height) = (frame.width as u32, frame.height as u32);
    let data = frame.data.as_mut_slice();
    match frame.format {
        PixelFormat::Rgb => {
            if let Some(mut canvas) = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data) {
                draw_nested(&mut canvas, rect, Rgb(rgb), thickness);
            }
        }
        PixelFormat::Rgba => {
            if let Some(mut canvas) = ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data) {
                draw_nested(&mut canvas, rect, Rgba([rgb[0], rgb[1], rgb[2], 255]), thickness);
            }
        }
    }
}

fn draw_nested<C>(canvas: &mut C, rect: Rect, color: C::Pixel, thickness: i32)
where
    C: Canvas,
    C::Pixel: 'static,
{
    for t in 0..thickness {
        let r = Rect::new(rect.x + t, rect.y + t, rect.width - 2 * t, rect.height - 2 * t);
        if r.is_empty() {
            break;
        }
        let outline = PixelRect::at(r.x, r.y).of_size(r.width as u32, r.height as u32);
        draw_hollow_rect_mut(canvas, outline, color);
    }
}

/// Outline the roi and every box that still overlaps the frame
pub fn annotate_frame(frame: &mut ColorImage, roi: Rect, boxes: &[Rect]) {
    draw_rect(frame, roi, OUTLINE_COLOR, OUTLINE_THICKNESS);
    for b in boxes {
        draw_rect(frame, *b, OUTLINE_COLOR, OUTLINE_THICKNESS);
    }
}

/// Owned BGR copy of the frame, the channel order opencv writes
#[cfg(feature = "opencv")]
pub fn color_to_cv_bgr(img: &ColorImage) -> Result<cv2::core::Mat> {
    if img.is_empty() {
        bail!("cannot convert an empty frame");
    }
    let (typ, code) = match img.format {
        PixelFormat::Rgb => (cv2::core::CV_8UC3, cv2::imgproc::COLOR_RGB2BGR),
        PixelFormat::Rgba => (cv2::core::CV_8UC4, cv2::imgproc::COLOR_RGBA2BGR),
    };
    // the borrowed header only lives until cvt_color has copied the pixels
    let view = unsafe {
        cv2::core::Mat::new_rows_cols_with_data(
            img.height as i32,
            img.width as i32,
            typ,
            img.data.as_ptr() as *mut std::ffi::c_void,
            cv2::core::Mat_AUTO_STEP,
        )?
    };
    let mut bgr = cv2::core::Mat::default();
    cv2::imgproc::cvt_color(&view, &mut bgr, code, 0)?;
    Ok(bgr)
}

#[cfg(feature = "opencv")]
pub fn write_png(img: &ColorImage, path: &std::path::Path) -> Result<()> {
    let bgr = color_to_cv_bgr(img)?;
    let path = path.to_string_lossy();
    if !cv2::imgcodecs::imwrite(&path, &bgr, &cv2::core::Vector::new())? {
        bail!("failed to write {path}");
    }
    Ok(())
}
