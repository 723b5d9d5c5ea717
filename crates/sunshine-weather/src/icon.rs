//! Condition artwork, rasterized and scaled down for the watch.
//!
//! Art is drawn once at [`ART_SIZE`] and resized to the requested edge
//! length, then shipped to the wearable as PNG bytes.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, Polyline, PrimitiveStyle, Rectangle};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::convert::Infallible;
use std::io::Cursor;

use crate::types::WeatherArt;

pub const ART_SIZE: u32 = 96;

const SUN: Rgb888 = Rgb888::new(255, 193, 7);
const CLOUD: Rgb888 = Rgb888::new(236, 239, 241);
const DARK_CLOUD: Rgb888 = Rgb888::new(120, 144, 156);
const RAIN: Rgb888 = Rgb888::new(79, 195, 247);
const SNOW: Rgb888 = Rgb888::new(255, 255, 255);
const FOG: Rgb888 = Rgb888::new(176, 190, 197);
const BOLT: Rgb888 = Rgb888::new(255, 235, 59);

/// Transparent RGBA canvas that embedded-graphics primitives draw onto.
/// Everything drawn is opaque; pixels outside the image are clipped.
struct Canvas(RgbaImage);

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < width && y < height {
                    self.0
                        .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
                }
            }
        }
        Ok(())
    }
}

/// Render `art` as a square RGBA icon of `size` pixels.
pub fn render_icon(art: WeatherArt, size: u32) -> RgbaImage {
    let full = match render_art(art) {
        Ok(img) => img,
        Err(never) => match never {},
    };
    if size == ART_SIZE {
        return full;
    }
    imageops::resize(&full, size, size, FilterType::Triangle)
}

pub fn encode_png(icon: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    icon.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

fn render_art(art: WeatherArt) -> Result<RgbaImage, Infallible> {
    let mut canvas = Canvas(RgbaImage::new(ART_SIZE, ART_SIZE));

    match art {
        WeatherArt::Clear => {
            sun(&mut canvas, Point::new(48, 48), 22)?;
        }
        WeatherArt::LightClouds => {
            sun(&mut canvas, Point::new(36, 34), 16)?;
            cloud(&mut canvas, CLOUD, 8)?;
        }
        WeatherArt::Clouds => {
            cloud(&mut canvas, DARK_CLOUD, -4)?;
            cloud(&mut canvas, CLOUD, 6)?;
        }
        WeatherArt::LightRain => {
            cloud(&mut canvas, CLOUD, -8)?;
            for x in [36, 56] {
                Line::new(Point::new(x, 70), Point::new(x - 4, 82))
                    .into_styled(PrimitiveStyle::with_stroke(RAIN, 4))
                    .draw(&mut canvas)?;
            }
        }
        WeatherArt::Rain => {
            cloud(&mut canvas, DARK_CLOUD, -8)?;
            for x in [30, 44, 58, 72] {
                Line::new(Point::new(x, 68), Point::new(x - 6, 88))
                    .into_styled(PrimitiveStyle::with_stroke(RAIN, 4))
                    .draw(&mut canvas)?;
            }
        }
        WeatherArt::Snow => {
            cloud(&mut canvas, CLOUD, -8)?;
            for (x, y) in [(32, 74), (48, 82), (64, 74), (40, 90), (56, 90)] {
                Circle::with_center(Point::new(x, y), 7)
                    .into_styled(PrimitiveStyle::with_fill(SNOW))
                    .draw(&mut canvas)?;
            }
        }
        WeatherArt::Fog => {
            for (i, y) in [28, 44, 60, 76].into_iter().enumerate() {
                let inset = if i % 2 == 0 { 12 } else { 20 };
                Rectangle::with_corners(
                    Point::new(inset, y),
                    Point::new(ART_SIZE as i32 - inset - 1, y + 5),
                )
                .into_styled(PrimitiveStyle::with_fill(FOG))
                .draw(&mut canvas)?;
            }
        }
        WeatherArt::Storm => {
            cloud(&mut canvas, DARK_CLOUD, -10)?;
            let bolt = [
                Point::new(52, 62),
                Point::new(42, 76),
                Point::new(54, 76),
                Point::new(44, 92),
            ];
            Polyline::new(&bolt)
                .into_styled(PrimitiveStyle::with_stroke(BOLT, 6))
                .draw(&mut canvas)?;
        }
    }

    Ok(canvas.0)
}

fn sun(canvas: &mut Canvas, center: Point, radius: i32) -> Result<(), Infallible> {
    Circle::with_center(center, (radius * 2 + 1) as u32)
        .into_styled(PrimitiveStyle::with_fill(SUN))
        .draw(canvas)?;

    let rays = PrimitiveStyle::with_stroke(SUN, 4);
    let reach = radius + radius / 2;
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, -1), (1, -1), (-1, 1)] {
        let start = center + Point::new(dx * (radius + 4), dy * (radius + 4));
        let end = center + Point::new(dx * reach, dy * reach);
        Line::new(start, end).into_styled(rays).draw(canvas)?;
    }
    Ok(())
}

fn cloud(canvas: &mut Canvas, color: Rgb888, dy: i32) -> Result<(), Infallible> {
    let fill = PrimitiveStyle::with_fill(color);
    Circle::with_center(Point::new(34, 54 + dy), 29)
        .into_styled(fill)
        .draw(canvas)?;
    Circle::with_center(Point::new(52, 44 + dy), 41)
        .into_styled(fill)
        .draw(canvas)?;
    Circle::with_center(Point::new(68, 54 + dy), 27)
        .into_styled(fill)
        .draw(canvas)?;
    Rectangle::with_corners(Point::new(34, 54 + dy), Point::new(67, 67 + dy))
        .into_styled(fill)
        .draw(canvas)?;
    Ok(())
}
