//! Rendering surfaces, figure styling and image output.

use crate::error::{Error, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use serde::Deserialize;
use std::{
    cell::Cell,
    fmt,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Figure geometry, resolution and colors shared by every plot of a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FigureStyle {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub font_family: String,
    pub primary_color: Rgb,
    pub secondary_color: Rgb,
}

impl Default for FigureStyle {
    fn default() -> Self {
        Self {
            width_in: 10.0,
            height_in: 6.0,
            dpi: 300,
            font_family: "sans-serif".to_owned(),
            primary_color: Rgb::BLUE,
            secondary_color: Rgb::RED,
        }
    }
}

impl FigureStyle {
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        (
            (self.width_in * dpi).round().max(1.0) as u32,
            (self.height_in * dpi).round().max(1.0) as u32,
        )
    }

    /// Convert a length in points to pixels at the figure resolution.
    pub fn px(&self, points: f64) -> u32 {
        (points * f64::from(self.dpi) / 72.0).round().max(1.0) as u32
    }

    pub fn font(&self, points: f64) -> FontDesc<'_> {
        FontDesc::new(
            FontFamily::from(self.font_family.as_str()),
            f64::from(self.px(points)),
            FontStyle::Normal,
        )
    }
}

/// Plot color, given by name (`blue`, `red`, ...) or as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const BLUE: Self = Self(0, 0, 255);
    pub const RED: Self = Self(255, 0, 0);

    pub fn to_color(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let channel = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            };
            return match (hex.len(), channel(0), channel(2), channel(4)) {
                (6, Some(r), Some(g), Some(b)) => Ok(Self(r, g, b)),
                _ => Err(Error::invalid(format!("invalid hex color '{s}'"))),
            };
        }
        let rgb = match s.to_ascii_lowercase().as_str() {
            "black" | "k" => Self::BLACK,
            "blue" | "b" => Self::BLUE,
            "red" | "r" => Self::RED,
            "green" | "g" => Self(0, 128, 0),
            "orange" => Self(255, 165, 0),
            "purple" => Self(128, 0, 128),
            "gray" | "grey" => Self(128, 128, 128),
            "white" | "w" => Self(255, 255, 255),
            _ => return Err(Error::invalid(format!("unknown color '{s}'"))),
        };
        Ok(rgb)
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Result of a plotting call.
#[derive(Debug)]
pub enum Rendered {
    /// No output path was given; the raster is handed back instead of shown on screen.
    Displayed(Frame),
    Saved(PathBuf),
}

/// Raw RGB8 raster.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A figure that can draw itself on any plotters backend.
pub(crate) trait Draw {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>>;
}

thread_local! {
    static OPEN_CANVASES: Cell<usize> = const { Cell::new(0) };
}

/// Number of canvases currently held by this thread.
pub fn open_canvases() -> usize {
    OPEN_CANVASES.with(Cell::get)
}

enum Surface {
    Raster(Vec<u8>),
    Vector(String),
}

/// Drawing surface for one figure, released when dropped.
pub(crate) struct Canvas {
    width: u32,
    height: u32,
    dpi: u32,
    save_path: Option<PathBuf>,
    surface: Surface,
}

impl Canvas {
    /// SVG when `save_path` ends in `.svg`, raster otherwise.
    pub fn new(style: &FigureStyle, save_path: Option<&Path>) -> Self {
        let (width, height) = style.pixel_size();
        let is_svg = save_path
            .and_then(Path::extension)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        let surface = if is_svg {
            Surface::Vector(String::new())
        } else {
            Surface::Raster(vec![255; width as usize * height as usize * 3])
        };

        OPEN_CANVASES.with(|open| open.set(open.get() + 1));
        log::debug!("acquired {width}x{height} canvas");

        Self {
            width,
            height,
            dpi: style.dpi,
            save_path: save_path.map(Path::to_path_buf),
            surface,
        }
    }

    pub fn render<F: Draw>(&mut self, figure: &F) -> Result<()> {
        let size = (self.width, self.height);
        match &mut self.surface {
            Surface::Raster(buf) => {
                let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();
                figure.draw(&root).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
            Surface::Vector(svg) => {
                let root = SVGBackend::with_string(svg, size).into_drawing_area();
                figure.draw(&root).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
        }
        Ok(())
    }

    /// Write the figure to its path, or hand the raster back when there is none.
    pub fn finish(mut self) -> Result<Rendered> {
        let surface = std::mem::replace(&mut self.surface, Surface::Raster(Vec::new()));
        match (self.save_path.take(), surface) {
            (None, Surface::Raster(rgb)) => Ok(Rendered::Displayed(Frame {
                width: self.width,
                height: self.height,
                rgb,
            })),
            (Some(path), Surface::Raster(rgb)) => {
                write_png(&path, self.width, self.height, self.dpi, &rgb)?;
                Ok(Rendered::Saved(path))
            }
            (Some(path), Surface::Vector(svg)) => {
                fs::write(&path, svg).map_err(|err| Error::io(&path, err))?;
                Ok(Rendered::Saved(path))
            }
            (None, Surface::Vector(_)) => Err(Error::Render(
                "vector figures can only be saved to a file".to_owned(),
            )),
        }
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        OPEN_CANVASES.with(|open| open.set(open.get().saturating_sub(1)));
        log::debug!("released {}x{} canvas", self.width, self.height);
    }
}

fn render_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
    Error::Render(err.to_string())
}

fn write_png(path: &Path, width: u32, height: u32, dpi: u32, rgb: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    // pHYs is expressed per metre.
    let ppm = (f64::from(dpi) / 0.0254).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let encode_error = |err: png::EncodingError| match err {
        png::EncodingError::IoError(err) => Error::io(path, err),
        other => Error::Render(other.to_string()),
    };
    let mut writer = encoder.write_header().map_err(encode_error)?;
    writer.write_image_data(rgb).map_err(encode_error)?;
    writer.finish().map_err(encode_error)?;
    Ok(())
}

/// Padded y range over the finite values, or `fixed` when given.
pub(crate) fn value_range(
    vals: impl IntoIterator<Item = f64>,
    fixed: Option<(f64, f64)>,
) -> std::ops::Range<f64> {
    if let Some((lo, hi)) = fixed {
        return lo..hi;
    }
    let (lo, hi) = vals
        .into_iter()
        .filter(|val| val.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), val| {
            (lo.min(val), hi.max(val))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}
