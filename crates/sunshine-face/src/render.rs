//! Watch face layout, expressed as a display list.
//!
//! [`render`] is a pure function of the render state, layout and surface
//! size. Drawing onto real pixels is left to [`crate::raster`] or the host.

use chrono::{Datelike, Timelike};
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::mono_font::iso_8859_1::{FONT_7X13_ITALIC, FONT_9X18, FONT_9X18_BOLD};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::primitives::Rectangle;
use image::RgbaImage;
use std::sync::Arc;
use sunshine_core::FaceConfig;

use crate::state::RenderState;

pub const BACKGROUND: Rgb888 = Rgb888::new(0x03, 0xA9, 0xF4);
pub const AMBIENT_BACKGROUND: Rgb888 = Rgb888::BLACK;
pub const TEXT: Rgb888 = Rgb888::WHITE;

/// Shown in place of a temperature that hasn't arrived yet
pub const PLACEHOLDER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFont {
    Hour,
    Minute,
    Date,
    MaxTemp,
    MinTemp,
}

impl TextFont {
    pub fn mono_font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Hour | Self::MaxTemp => &FONT_9X18_BOLD,
            Self::Minute | Self::MinTemp => &FONT_9X18,
            Self::Date => &FONT_7X13_ITALIC,
        }
    }
}

/// Advance width of `text` in `font`
pub fn text_width(text: &str, font: TextFont) -> i32 {
    let f = font.mono_font();
    let advance = (f.character_size.width + f.character_spacing) as i32;
    advance * text.chars().count() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    pub color: Rgb888,
    pub anti_alias: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        area: Rectangle,
        paint: Paint,
    },
    /// `origin.y` is the text baseline
    Text {
        text: String,
        origin: Point,
        font: TextFont,
        align: Align,
        paint: Paint,
    },
    Line {
        start: Point,
        end: Point,
        paint: Paint,
    },
    Bitmap {
        image: Arc<RgbaImage>,
        top_left: Point,
        paint: Paint,
    },
}

pub type DisplayList = Vec<DrawCommand>;

/// Fixed offsets of the face, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLayout {
    pub y_offset: i32,
    pub line_height: i32,
    pub line_width: i32,
}

impl From<&FaceConfig> for FaceLayout {
    fn from(config: &FaceConfig) -> Self {
        Self {
            y_offset: config.y_offset,
            line_height: config.line_height,
            line_width: config.line_width,
        }
    }
}

/// Hour and minute strings; seconds are dropped in ambient mode.
pub fn time_strings(state: &RenderState) -> (String, String) {
    let t = &state.current_time;
    let hour = t.hour().to_string();
    let minutes = if state.ambient {
        format!(":{:02}", t.minute())
    } else {
        format!(":{:02}:{:02}", t.minute(), t.second())
    };
    (hour, minutes)
}

pub fn date_string(state: &RenderState) -> String {
    let t = &state.current_time;
    format!(
        "{}, {} {} {}",
        t.format("%a"),
        t.format("%b"),
        t.day(),
        t.year()
    )
}

/// Build the display list for one frame.
pub fn render(
    state: &RenderState,
    layout: &FaceLayout,
    low_bit_ambient: bool,
    bounds: Size,
) -> DisplayList {
    let anti_alias = !(state.ambient && low_bit_ambient);
    let text = Paint {
        color: TEXT,
        anti_alias,
    };
    let background = Paint {
        color: if state.ambient {
            AMBIENT_BACKGROUND
        } else {
            BACKGROUND
        },
        anti_alias,
    };

    let middle_x = bounds.width as i32 / 2;
    let y = layout.y_offset;
    let lh = layout.line_height;
    let mut list = Vec::with_capacity(8);

    list.push(DrawCommand::FillRect {
        area: Rectangle::new(Point::zero(), bounds),
        paint: background,
    });

    let (hour, minutes) = time_strings(state);
    let hour_width = text_width(&hour, TextFont::Hour);
    let mut x = middle_x - (hour_width + text_width(&minutes, TextFont::Minute)) / 2;
    list.push(DrawCommand::Text {
        text: hour,
        origin: Point::new(x, y),
        font: TextFont::Hour,
        align: Align::Left,
        paint: text,
    });
    x += hour_width;
    list.push(DrawCommand::Text {
        text: minutes,
        origin: Point::new(x, y),
        font: TextFont::Minute,
        align: Align::Left,
        paint: text,
    });

    list.push(DrawCommand::Text {
        text: date_string(state),
        origin: Point::new(middle_x, y + lh * 2),
        font: TextFont::Date,
        align: Align::Center,
        paint: text,
    });

    list.push(DrawCommand::Line {
        start: Point::new(middle_x - layout.line_width / 2, y + lh * 3),
        end: Point::new(middle_x + layout.line_width / 2, y + lh * 3 + 1),
        paint: text,
    });

    let max_temp = state.high_temp.as_deref().unwrap_or(PLACEHOLDER);
    let min_temp = state.low_temp.as_deref().unwrap_or(PLACEHOLDER);
    let max_width = text_width(max_temp, TextFont::MaxTemp);

    list.push(DrawCommand::Text {
        text: max_temp.to_string(),
        origin: Point::new(middle_x, y + lh * 7),
        font: TextFont::MaxTemp,
        align: Align::Center,
        paint: text,
    });
    list.push(DrawCommand::Text {
        text: min_temp.to_string(),
        origin: Point::new(middle_x + max_width, y + lh * 7),
        font: TextFont::MinTemp,
        align: Align::Left,
        paint: text,
    });

    if let Some(icon) = &state.icon {
        list.push(DrawCommand::Bitmap {
            image: Arc::clone(icon),
            top_left: Point::new(middle_x - max_width * 2, y + lh * 4),
            paint: text,
        });
    }

    list
}
