//! Chart building and rendering.
//!
//! - `chart`: backend-free chart descriptions (windows, ticks, overlays)
//! - `render`: Plotters PNG/SVG output

pub mod chart;
pub mod render;

pub use chart::*;
pub use render::{ChartSink, FileRenderer, output_paths};
