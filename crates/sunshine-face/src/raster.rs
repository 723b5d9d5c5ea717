//! Paint a display list onto any embedded-graphics target.
//!
//! Monochrome bitmap fonts are never anti-aliased, so the paint's
//! `anti_alias` flag only matters to hosts that rasterize on their own.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use crate::render::{Align, DrawCommand};

/// Alpha below this is treated as transparent when blitting icons
const ALPHA_CUTOFF: u8 = 128;

pub fn rasterize<D>(commands: &[DrawCommand], target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    for command in commands {
        match command {
            DrawCommand::FillRect { area, paint } => {
                (*area)
                    .into_styled(PrimitiveStyle::with_fill(paint.color))
                    .draw(target)?;
            }
            DrawCommand::Text {
                text,
                origin,
                font,
                align,
                paint,
            } => {
                let character_style = MonoTextStyle::new(font.mono_font(), paint.color);
                let alignment = match align {
                    Align::Left => Alignment::Left,
                    Align::Center => Alignment::Center,
                };
                let text_style = TextStyleBuilder::new()
                    .alignment(alignment)
                    .baseline(Baseline::Alphabetic)
                    .build();
                Text::with_text_style(text, *origin, character_style, text_style).draw(target)?;
            }
            DrawCommand::Line { start, end, paint } => {
                Line::new(*start, *end)
                    .into_styled(PrimitiveStyle::with_stroke(paint.color, 1))
                    .draw(target)?;
            }
            DrawCommand::Bitmap {
                image, top_left, ..
            } => {
                let origin = *top_left;
                target.draw_iter(
                    image
                        .enumerate_pixels()
                        .filter(|(_, _, p)| p[3] >= ALPHA_CUTOFF)
                        .map(|(x, y, p)| {
                            Pixel(
                                origin + Point::new(x as i32, y as i32),
                                Rgb888::new(p[0], p[1], p[2]),
                            )
                        }),
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render, FaceLayout, AMBIENT_BACKGROUND, BACKGROUND, TEXT};
    use crate::state::RenderState;
    use chrono::{FixedOffset, TimeZone};
    use image::{Rgba, RgbaImage};
    use std::convert::Infallible;
    use sunshine_core::FaceConfig;

    struct Framebuffer {
        size: Size,
        pixels: Vec<Rgb888>,
    }

    impl Framebuffer {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: Size::new(width, height),
                pixels: vec![Rgb888::new(1, 2, 3); (width * height) as usize],
            }
        }

        fn at(&self, x: i32, y: i32) -> Rgb888 {
            self.pixels[(y as u32 * self.size.width + x as u32) as usize]
        }

        fn count_in_rows(&self, rows: std::ops::Range<i32>, color: Rgb888) -> usize {
            rows.flat_map(|y| (0..self.size.width as i32).map(move |x| (x, y)))
                .filter(|&(x, y)| self.at(x, y) == color)
                .count()
        }
    }

    impl OriginDimensions for Framebuffer {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for Framebuffer {
        type Color = Rgb888;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if point.x >= 0
                    && point.y >= 0
                    && (point.x as u32) < self.size.width
                    && (point.y as u32) < self.size.height
                {
                    let idx = (point.y as u32 * self.size.width + point.x as u32) as usize;
                    self.pixels[idx] = color;
                }
            }
            Ok(())
        }
    }

    fn state() -> RenderState {
        let t = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 3, 10, 8, 0)
            .unwrap();
        RenderState::new(t)
    }

    fn layout() -> FaceLayout {
        FaceLayout::from(&FaceConfig::default())
    }

    #[test]
    fn test_background_fills_surface() {
        let list = render(&state(), &layout(), false, Size::new(320, 320));
        let mut fb = Framebuffer::new(320, 320);
        rasterize(&list, &mut fb).unwrap();

        assert_eq!(fb.at(0, 0), BACKGROUND);
        assert_eq!(fb.at(319, 319), BACKGROUND);
    }

    #[test]
    fn test_ambient_background() {
        let mut s = state();
        s.ambient = true;
        let list = render(&s, &layout(), true, Size::new(320, 320));
        let mut fb = Framebuffer::new(320, 320);
        rasterize(&list, &mut fb).unwrap();

        assert_eq!(fb.at(5, 5), AMBIENT_BACKGROUND);
    }

    #[test]
    fn test_time_and_separator_are_painted() {
        let list = render(&state(), &layout(), false, Size::new(320, 320));
        let mut fb = Framebuffer::new(320, 320);
        rasterize(&list, &mut fb).unwrap();

        // glyphs sit above the baseline at y=80
        assert!(fb.count_in_rows(66..82, TEXT) > 0);
        // separator at y=140..=141
        assert!(fb.count_in_rows(140..142, TEXT) >= 80);
    }

    #[test]
    fn test_icon_is_blitted_with_transparency() {
        let mut icon = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        icon.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let list = vec![DrawCommand::Bitmap {
            image: std::sync::Arc::new(icon),
            top_left: Point::new(10, 10),
            paint: crate::render::Paint {
                color: TEXT,
                anti_alias: true,
            },
        }];

        let mut fb = Framebuffer::new(20, 20);
        rasterize(&list, &mut fb).unwrap();

        assert_eq!(fb.at(11, 11), Rgb888::new(255, 0, 0));
        assert_eq!(fb.at(10, 10), Rgb888::new(1, 2, 3));
    }
}
