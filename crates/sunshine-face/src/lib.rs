//! Wearable watch face: render state, layout, redraw scheduling and the
//! engine that ties them to the phone link.

pub mod engine;
pub mod error;
pub mod raster;
pub mod render;
pub mod state;
pub mod timer;

pub use engine::{forward_transport_events, FaceEvent, WatchFaceEngine};
pub use error::FaceError;
pub use raster::rasterize;
pub use render::{render, DisplayList, DrawCommand, FaceLayout};
pub use state::{Clock, RenderState, SystemClock};
pub use timer::{delay_to_next_boundary, AMBIENT_PERIOD, INTERACTIVE_PERIOD};
