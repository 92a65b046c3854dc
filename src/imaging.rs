//! Image I/O, annotation and display scaling.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detect::Detection;

/// File extensions offered when picking an input image.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

const DEFAULT_SAVE_EXTENSION: &str = "jpg";
const BOX_THICKNESS: i32 = 2;

const PALETTE: [[u8; 3]; 10] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 212, 187],
    [52, 69, 147],
    [203, 56, 255],
];

/// Decode an image file into RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(image.into_rgb8())
}

/// Dimensions that fit `width` x `height` inside the bounds.
///
/// Never upscales; the aspect ratio is preserved up to integer truncation.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return (width, height);
    }
    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);
    // integer form of scale = min(max_w / w, max_h / h)
    let (new_w, new_h) = if max_w * h <= max_h * w {
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };
    (
        (new_w as u32).clamp(1, width),
        (new_h as u32).clamp(1, height),
    )
}

/// Scale `image` down to fit the display bounds using area averaging.
pub fn resize_for_display(
    image: &RgbImage,
    max_width: u32,
    max_height: u32,
) -> Cow<'_, RgbImage> {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = fit_within(width, height, max_width, max_height);
    if (new_width, new_height) == (width, height) {
        return Cow::Borrowed(image);
    }
    Cow::Owned(imageops::thumbnail(image, new_width, new_height))
}

/// Draw each detection's box in a per-class colour.
pub fn annotate(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut annotated = image.clone();
    let (width, height) = annotated.dimensions();
    for detection in detections {
        let bbox = detection.bbox.clamped(width, height);
        let color = Rgb(PALETTE[detection.class_id % PALETTE.len()]);
        for inset in 0..BOX_THICKNESS {
            let x = bbox.x1.round() as i32 + inset;
            let y = bbox.y1.round() as i32 + inset;
            let w = bbox.width().round() as i32 - 2 * inset;
            let h = bbox.height().round() as i32 - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x, y).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut annotated, rect, color);
        }
    }
    annotated
}

/// Save `image`, picking the format from the extension.
///
/// A `.jpg` extension is appended when the path has none. Returns the path
/// actually written.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<PathBuf> {
    let path = if path.extension().is_none() {
        path.with_extension(DEFAULT_SAVE_EXTENSION)
    } else {
        path.to_path_buf()
    };
    if path.as_os_str().is_empty() {
        return Err(anyhow!("empty output path"));
    }
    image
        .save(&path)
        .with_context(|| format!("failed to save image to {}", path.display()))?;
    Ok(path)
}

/// True when `path` has one of the supported input extensions.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
