//! Picon compositing
//!
//! A picon is produced by trimming the transparent padding off a logo, scaling
//! it to fit inside a margin proportional to the background width and blending
//! it over a copy of the background.

use anyhow::{anyhow, Context, Result};
use image::{
    imageops::{self, FilterType},
    DynamicImage, RgbaImage,
};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// Margin around the logo as a fraction of the background width. This magic
/// number comes from the picons specification at
/// https://github.com/ocram/picons/blob/35d2094d277b5c59818f64d5dbeb66a5076a6c58/README.md
const BORDER_RATIO_NUMERATOR: u64 = 15;
const BORDER_RATIO_DENOMINATOR: u64 = 256;

/// An image file that is decoded on demand and can be released again.
#[derive(Debug)]
pub struct ImageHandle {
    path: PathBuf,
    image: Option<DynamicImage>,
}

impl ImageHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    /// Decode the image unless it is already loaded.
    pub fn open(&mut self) -> Result<&DynamicImage> {
        let image = match self.image.take() {
            Some(image) => image,
            None => image::open(&self.path)
                .with_context(|| format!("Failed to load image {}", self.path.display()))?,
        };
        Ok(self.image.insert(image))
    }

    /// The decoded image, which must have been opened before.
    pub fn image(&self) -> Result<&DynamicImage> {
        self.image
            .as_ref()
            .ok_or_else(|| anyhow!("Image {} not open", self.path.display()))
    }

    /// Drop the decoded pixels, keeping only the path.
    pub fn close(&mut self) {
        self.image = None;
    }
}

/// A source channel logo.
#[derive(Debug)]
pub struct Logo {
    handle: ImageHandle,
}

impl Logo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            handle: ImageHandle::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.handle.path().file_name()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    pub fn close(&mut self) {
        self.handle.close();
    }
}

/// A background template belonging to a type (its directory) and a
/// variation (its file stem).
#[derive(Debug)]
pub struct Background {
    kind: String,
    variation: String,
    handle: ImageHandle,
}

impl Background {
    pub fn new(path: impl Into<PathBuf>, kind: &str, variation: &str) -> Self {
        Self {
            kind: kind.to_string(),
            variation: variation.to_string(),
            handle: ImageHandle::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn variation(&self) -> &str {
        &self.variation
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    pub fn close(&mut self) {
        self.handle.close();
    }

    /// Resize and merge a logo over this background.
    ///
    /// Both images are opened if needed and stay open afterwards; the caller
    /// decides when to release them. The background pixels are not modified.
    pub fn merge_overlay(&mut self, logo: &mut Logo) -> Result<RgbaImage> {
        self.handle.open()?;
        logo.handle.open()?;
        let logo_image = logo.handle.image()?;
        overlay_logo(self.handle.image()?, logo_image)
            .with_context(|| format!("Failed to merge {}", logo.path().display()))
    }
}

/// Composite `logo` over a copy of `background` following the picon layout.
///
/// The result is always 8-bit RGBA. Backgrounds with 16-bit channels or
/// without colour lose that depth.
pub fn overlay_logo(background: &DynamicImage, logo: &DynamicImage) -> Result<RgbaImage> {
    let mut picon = background.to_rgba8();
    let (bg_width, bg_height) = picon.dimensions();

    // Centre the logo on a canvas with a 1px transparent frame before trimming
    let logo = logo.to_rgba8();
    let mut padded = RgbaImage::new(logo.width() + 2, logo.height() + 2);
    imageops::overlay(&mut padded, &logo, 1, 1);
    let trimmed = trim_transparent(&padded).context("Logo is fully transparent")?;

    let border = border_width(bg_width);
    let max_width = bg_width
        .checked_sub(2 * border)
        .filter(|w| *w > 0)
        .with_context(|| format!("Background width {bg_width} leaves no room for the logo"))?;
    let max_height = bg_height
        .checked_sub(2 * border)
        .filter(|h| *h > 0)
        .with_context(|| format!("Background height {bg_height} leaves no room for the logo"))?;

    let (width, height) = fit_within(trimmed.width(), trimmed.height(), max_width, max_height);
    let scaled = if (width, height) == trimmed.dimensions() {
        trimmed
    } else {
        imageops::resize(&trimmed, width, height, FilterType::Lanczos3)
    };

    let (x, y) = placement(bg_width, bg_height, width, height, border);
    imageops::overlay(&mut picon, &scaled, x.into(), y.into());

    Ok(picon)
}

/// Border width in pixels for a background of the given width, rounded up.
pub fn border_width(background_width: u32) -> u32 {
    let scaled = u64::from(background_width) * BORDER_RATIO_NUMERATOR;
    ((scaled + BORDER_RATIO_DENOMINATOR - 1) / BORDER_RATIO_DENOMINATOR) as u32
}

/// Largest size with the aspect ratio of `width`x`height` that fits inside
/// `max_width`x`max_height`. Images smaller than the box are scaled up.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let ratio = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let new_width = (f64::from(width) * ratio).round() as u32;
    let new_height = (f64::from(height) * ratio).round() as u32;
    (new_width.max(1), new_height.max(1))
}

/// Top-left corner of a scaled logo on the background.
///
/// A logo limited by the width sits on the left border and is centred
/// vertically, otherwise it sits on the top border and is centred
/// horizontally. Odd remainders are rounded up.
pub fn placement(
    bg_width: u32,
    bg_height: u32,
    logo_width: u32,
    logo_height: u32,
    border: u32,
) -> (u32, u32) {
    if logo_width + 2 * border == bg_width {
        (border, half_rounded_up(bg_height.saturating_sub(logo_height)))
    } else {
        (half_rounded_up(bg_width.saturating_sub(logo_width)), border)
    }
}

fn half_rounded_up(value: u32) -> u32 {
    value / 2 + value % 2
}

/// Crop away all fully transparent rows and columns around the content.
/// Returns `None` when no pixel has any opacity.
pub fn trim_transparent(image: &RgbaImage) -> Option<RgbaImage> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    let (min_x, min_y, max_x, max_y) = bounds?;
    Some(
        imageops::crop_imm(image, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1).to_image(),
    )
}
