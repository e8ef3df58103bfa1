//! QR codes pointing at the card page.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use qrcode::render::unicode;
use qrcode::{Color, EcLevel, QrCode};

use crate::config::{QrConfig, RgbColor};
use crate::error::QrError;

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Largest side, in pixels, of any image allocated while rendering.
const MAX_IMAGE_SIDE: u32 = 8192;

/// Settings for a single PNG render.
#[derive(Debug, Clone)]
pub struct QrSettings {
    pub data: String,
    pub box_size: u32,
    pub border: u32,
    pub logo: Option<PathBuf>,
    pub logo_scale: f32,
    pub white_pad: u32,
    pub rounded_white_box: bool,
    pub white_box_radius: u32,
    pub recolor: Option<(RgbColor, RgbColor)>,
}

impl QrSettings {
    pub fn from_config(data: String, config: &QrConfig) -> Self {
        Self {
            data,
            box_size: config.box_size.max(1),
            border: config.border,
            logo: config.logo.clone(),
            logo_scale: config.logo_scale,
            white_pad: config.white_pad,
            rounded_white_box: config.rounded_white_box,
            white_box_radius: config.white_box_radius,
            recolor: config
                .recolor
                .then_some((config.color_top, config.color_bottom)),
        }
    }
}

/// Render the QR code as an RGBA image.
pub fn render_png(settings: &QrSettings) -> Result<RgbaImage, QrError> {
    let code = QrCode::with_error_correction_level(settings.data.as_bytes(), EcLevel::H)?;
    let mut img = modules_to_image(&code, settings.box_size, settings.border)?;

    if let Some((top, bottom)) = settings.recolor {
        recolor_vertical(&mut img, top, bottom);
    }

    if let Some(logo) = &settings.logo {
        paste_logo_center(&mut img, logo, settings)?;
    }

    Ok(img)
}

/// Render the QR code with Unicode half blocks for terminal display.
pub fn render_terminal(data: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Dark)
        .light_color(unicode::Dense1x2::Light)
        .build())
}

/// `(inner + 2 * pad) * scale`, rejected when it overflows or exceeds
/// [`MAX_IMAGE_SIDE`].
fn padded_side(inner: u32, pad: u32, scale: u32) -> Result<u32, QrError> {
    pad.checked_mul(2)
        .and_then(|pad| inner.checked_add(pad))
        .and_then(|side| side.checked_mul(scale))
        .filter(|side| *side <= MAX_IMAGE_SIDE)
        .ok_or(QrError::TooLarge {
            limit: MAX_IMAGE_SIDE,
        })
}

fn modules_to_image(code: &QrCode, box_size: u32, border: u32) -> Result<RgbaImage, QrError> {
    let width = code.width() as u32;
    let side = padded_side(width, border, box_size)?;
    let colors = code.to_colors();

    let mut img = RgbaImage::from_pixel(side, side, LIGHT);
    for (idx, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = idx as u32 % width + border;
        let my = idx as u32 / width + border;
        for y in my * box_size..(my + 1) * box_size {
            for x in mx * box_size..(mx + 1) * box_size {
                img.put_pixel(x, y, DARK);
            }
        }
    }
    Ok(img)
}

/// Recolour pure black pixels with a top-to-bottom gradient.
fn recolor_vertical(img: &mut RgbaImage, top: RgbColor, bottom: RgbColor) {
    let height = img.height();
    let span = height.saturating_sub(1).max(1) as f32;
    for y in 0..height {
        let t = y as f32 / span;
        let lerp = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t) as u8;
        let shade = [lerp(top.r, bottom.r), lerp(top.g, bottom.g), lerp(top.b, bottom.b)];
        for x in 0..img.width() {
            let px = img.get_pixel_mut(x, y);
            if px.0[..3] == [0, 0, 0] {
                px.0 = [shade[0], shade[1], shade[2], px.0[3]];
            }
        }
    }
}

fn paste_logo_center(base: &mut RgbaImage, logo_path: &Path, settings: &QrSettings) -> Result<(), QrError> {
    if !logo_path.exists() {
        return Err(QrError::LogoMissing(logo_path.to_path_buf()));
    }
    let logo = image::open(logo_path).map_err(|source| QrError::Logo {
        path: logo_path.to_path_buf(),
        source,
    })?;

    let (bw, bh) = base.dimensions();
    let target_side = ((bw.min(bh) as f32) * settings.logo_scale) as u32;
    let logo = logo
        .resize(target_side.max(1), target_side.max(1), FilterType::Lanczos3)
        .to_rgba8();
    let (lw, lh) = logo.dimensions();

    let box_w = padded_side(lw, settings.white_pad, 1)?;
    let box_h = padded_side(lh, settings.white_pad, 1)?;
    let radius = if settings.rounded_white_box {
        settings.white_box_radius
    } else {
        0
    };
    let white_box = white_box(box_w, box_h, radius);

    let cx = (i64::from(bw) - i64::from(box_w)) / 2;
    let cy = (i64::from(bh) - i64::from(box_h)) / 2;
    imageops::overlay(base, &white_box, cx, cy);

    let lx = cx + (i64::from(box_w) - i64::from(lw)) / 2;
    let ly = cy + (i64::from(box_h) - i64::from(lh)) / 2;
    imageops::overlay(base, &logo, lx, ly);
    Ok(())
}

/// Opaque white rectangle; corners outside `radius` are left transparent.
fn white_box(width: u32, height: u32, radius: u32) -> RgbaImage {
    let radius = radius.min(width / 2).min(height / 2);
    let mut img = RgbaImage::from_pixel(width, height, LIGHT);
    if radius == 0 {
        return img;
    }

    let r = radius as f32;
    for y in 0..height {
        for x in 0..width {
            let dx = corner_distance(x, width, radius);
            let dy = corner_distance(y, height, radius);
            if dx > 0.0 && dy > 0.0 && dx * dx + dy * dy > r * r {
                img.put_pixel(x, y, Rgba([255, 255, 255, 0]));
            }
        }
    }
    img
}

/// Distance past the corner-circle centre along one axis, 0 inside the
/// straight edge region.
fn corner_distance(pos: u32, len: u32, radius: u32) -> f32 {
    let p = pos as f32 + 0.5;
    let r = radius as f32;
    let far = len as f32 - r;
    if p < r {
        r - p
    } else if p > far {
        p - far
    } else {
        0.0
    }
}
