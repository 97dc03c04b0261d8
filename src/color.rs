//! Colour-mode conversion
//!
//! Merging a document whose pixel format differs from the destination's
//! converts the source sprite in place first. The conversion itself sits
//! behind [`ColorConverter`]; [`BasicConverter`] is a straightforward
//! nearest-colour implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::doc::{Image, Palette, PixelFormat, Rgba, Sprite};
use crate::error::{Result, SpriteError};

/// Dithering applied when reducing colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitheringAlgorithm {
    #[default]
    None,
    Ordered,
    Old,
}

/// Strategy used to map RGB values onto palette entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RgbMapAlgorithm {
    #[default]
    Default,
    RgbTable,
    Octree,
}

/// Distance metric used to pick the closest palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitCriteria {
    #[default]
    Default,
    Rgb,
    LinearizedRgb,
}

impl fmt::Display for FitCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitCriteria::Default => write!(f, "default"),
            FitCriteria::Rgb => write!(f, "rgb"),
            FitCriteria::LinearizedRgb => write!(f, "linearized-rgb"),
        }
    }
}

/// Parameters handed to the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub dithering: DitheringAlgorithm,
    pub rgbmap_algorithm: RgbMapAlgorithm,
    pub fit_criteria: FitCriteria,
}

/// Converts a sprite and all of its cels to another pixel format
pub trait ColorConverter: Send + Sync {
    fn convert(
        &self,
        sprite: &mut Sprite,
        target: PixelFormat,
        options: &ConversionOptions,
    ) -> Result<()>;
}

/// Nearest-colour converter without error diffusion.
///
/// Dithering and the RGB-map strategy are accepted for interface
/// compatibility; every mode maps each pixel on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicConverter;

impl ColorConverter for BasicConverter {
    fn convert(
        &self,
        sprite: &mut Sprite,
        target: PixelFormat,
        options: &ConversionOptions,
    ) -> Result<()> {
        let source = sprite.pixel_format();
        if source == target {
            return Ok(());
        }
        log::debug!(
            "converting sprite {} from {} to {} (dithering {:?}, rgbmap {:?}, fit {})",
            sprite.id(),
            source,
            target,
            options.dithering,
            options.rgbmap_algorithm,
            options.fit_criteria
        );

        let palette = match (source, target) {
            (PixelFormat::Indexed, _) | (_, PixelFormat::Indexed) => Some(
                sprite
                    .palette()
                    .cloned()
                    .unwrap_or_else(|| Palette::grayscale(256)),
            ),
            _ => None,
        };

        let mut failure = None;
        sprite.for_each_image_mut(|image| {
            for cel in image.cels_mut() {
                if failure.is_some() {
                    return;
                }
                if let Err(err) =
                    convert_image(cel.image_mut(), target, palette.as_ref(), options.fit_criteria)
                {
                    failure = Some(err);
                }
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }

        if target == PixelFormat::Indexed && sprite.palette().is_none() {
            sprite.set_palette(palette);
        }
        sprite.set_pixel_format(target);
        Ok(())
    }
}

fn convert_image(
    image: &mut Image,
    target: PixelFormat,
    palette: Option<&Palette>,
    fit: FitCriteria,
) -> Result<()> {
    let source = image.format();
    if source == target {
        return Ok(());
    }
    let mut out = Vec::with_capacity(image.pixels().count() * target.bytes_per_pixel());
    for px in image.pixels() {
        let color = to_rgba(source, px, palette);
        match target {
            PixelFormat::Rgba => out.extend_from_slice(&[color.r, color.g, color.b, color.a]),
            PixelFormat::Grayscale => out.extend_from_slice(&[luma(color), color.a]),
            PixelFormat::Indexed => {
                let palette = palette.ok_or_else(|| SpriteError::ConversionFailed {
                    from: source,
                    to: target,
                    reason: "no palette available".to_string(),
                })?;
                out.push(if color.a == 0 {
                    0
                } else {
                    nearest_entry(palette, color, fit)
                });
            }
        }
    }
    image.replace(target, out)
}

fn to_rgba(format: PixelFormat, px: &[u8], palette: Option<&Palette>) -> Rgba {
    match format {
        PixelFormat::Rgba => Rgba::new(px[0], px[1], px[2], px[3]),
        PixelFormat::Grayscale => Rgba::new(px[0], px[0], px[0], px[1]),
        PixelFormat::Indexed => match palette {
            Some(palette) => palette.entry(px[0] as usize),
            None => Rgba::new(px[0], px[0], px[0], 255),
        },
    }
}

/// Rec. 601 luma
fn luma(c: Rgba) -> u8 {
    ((c.r as u32 * 299 + c.g as u32 * 587 + c.b as u32 * 114) / 1000) as u8
}

/// Index of the palette entry closest to `color`
pub fn nearest_entry(palette: &Palette, color: Rgba, fit: FitCriteria) -> u8 {
    let distance = |e: &Rgba| -> u64 {
        let channel = |a: u8, b: u8| -> u64 {
            match fit {
                FitCriteria::LinearizedRgb => {
                    let (a, b) = (a as i64 * a as i64, b as i64 * b as i64);
                    (a - b).unsigned_abs()
                }
                FitCriteria::Default | FitCriteria::Rgb => {
                    let d = a as i64 - b as i64;
                    (d * d) as u64
                }
            }
        };
        channel(e.r, color.r) + channel(e.g, color.g) + channel(e.b, color.b)
    };
    palette
        .entries()
        .iter()
        .enumerate()
        .take(256)
        .min_by_key(|(_, e)| distance(e))
        .map(|(i, _)| i as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{Cel, Layer};

    fn rgba_sprite(pixel: [u8; 4]) -> Sprite {
        let image = Image::filled(2, 1, PixelFormat::Rgba, &pixel).unwrap();
        Sprite::new(2, 1, PixelFormat::Rgba)
            .with_layer(Layer::new_image("a").with_cel(Cel::new(0, image)))
    }

    fn first_cel_data(sprite: &Sprite) -> Vec<u8> {
        let id = sprite.all_layers()[0];
        let layer = sprite.layer(id).unwrap();
        layer.as_image().unwrap().cel(0).unwrap().image().data().to_vec()
    }

    #[test]
    fn test_rgba_to_grayscale() {
        let mut sprite = rgba_sprite([255, 255, 255, 200]);
        BasicConverter
            .convert(&mut sprite, PixelFormat::Grayscale, &ConversionOptions::default())
            .unwrap();
        assert_eq!(sprite.pixel_format(), PixelFormat::Grayscale);
        assert_eq!(first_cel_data(&sprite), vec![255, 200, 255, 200]);
    }

    #[test]
    fn test_rgba_to_indexed_creates_palette() {
        let mut sprite = rgba_sprite([0, 0, 0, 255]);
        BasicConverter
            .convert(&mut sprite, PixelFormat::Indexed, &ConversionOptions::default())
            .unwrap();
        assert_eq!(sprite.pixel_format(), PixelFormat::Indexed);
        assert_eq!(sprite.palette().map(Palette::len), Some(256));
        assert_eq!(first_cel_data(&sprite), vec![0, 0]);
    }

    #[test]
    fn test_indexed_to_rgba_uses_palette() {
        let palette = Palette::from_entries(vec![Rgba::BLACK, Rgba::new(10, 20, 30, 255)]);
        let image = Image::filled(1, 1, PixelFormat::Indexed, &[1]).unwrap();
        let mut sprite = Sprite::new(1, 1, PixelFormat::Indexed)
            .with_palette(palette)
            .with_layer(Layer::new_image("a").with_cel(Cel::new(0, image)));

        BasicConverter
            .convert(&mut sprite, PixelFormat::Rgba, &ConversionOptions::default())
            .unwrap();
        assert_eq!(first_cel_data(&sprite), vec![10, 20, 30, 255]);
    }

    #[test]
    fn test_nearest_entry() {
        let palette = Palette::from_entries(vec![
            Rgba::new(0, 0, 0, 255),
            Rgba::new(250, 0, 0, 255),
            Rgba::new(0, 0, 250, 255),
        ]);
        let red = Rgba::new(200, 10, 10, 255);
        assert_eq!(nearest_entry(&palette, red, FitCriteria::Rgb), 1);
        assert_eq!(nearest_entry(&palette, red, FitCriteria::LinearizedRgb), 1);
    }
}
