//! Plotters rendering of `ChartSpec`s to PNG and SVG files.
//!
//! One drawing routine is shared by both formats; it is generic over the
//! Plotters backend. The raster output is drawn at three times the vector size
//! (a 10x5 inch figure at 300 dpi), with fonts and strokes scaled to match.
//!
//! The vector output keeps a transparent background. The bitmap backend has
//! no alpha channel, so the raster output is filled white.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::coord::combinators::BindKeyPoints;
use plotters::coord::ranged1d::{DefaultFormatting, Ranged};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::info;

use crate::error::AppError;
use crate::plot::chart::ChartSpec;

/// Anything that can persist a chart. The pipeline only talks to this trait.
pub trait ChartSink {
    /// Write every output format for `spec`, returning the paths written.
    fn write_chart(&mut self, spec: &ChartSpec) -> Result<Vec<PathBuf>, AppError>;
}

/// Vector canvas size; the raster canvas is `RASTER_SCALE` times larger.
const BASE_SIZE: (u32, u32) = (1000, 500);
const RASTER_SCALE: u32 = 3;

/// Default line colour cycle (blue, orange, green, red, purple).
const PALETTE: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
];
const GRID: RGBColor = RGBColor(176, 176, 176);

/// Writes `<stem>.png` and `<stem>.svg` into a directory.
pub struct FileRenderer {
    output_dir: PathBuf,
}

impl FileRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Create the output directory on first write, so a failed ingest leaves nothing behind.
    fn ensure_output_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            AppError::render(format!(
                "Failed to create output directory '{}': {e}",
                self.output_dir.display()
            ))
        })
    }
}

impl ChartSink for FileRenderer {
    fn write_chart(&mut self, spec: &ChartSpec) -> Result<Vec<PathBuf>, AppError> {
        self.ensure_output_dir()?;
        let [png, svg] = output_paths(&self.output_dir, &spec.file_stem);

        let size = (BASE_SIZE.0 * RASTER_SCALE, BASE_SIZE.1 * RASTER_SCALE);
        let root = BitMapBackend::new(&png, size).into_drawing_area();
        draw_chart(root, spec, RASTER_SCALE, true)
            .map_err(|e| AppError::render(format!("Failed to render '{}': {e}", png.display())))?;
        info!(path = %png.display(), "wrote chart");

        let root = SVGBackend::new(&svg, BASE_SIZE).into_drawing_area();
        draw_chart(root, spec, 1, false)
            .map_err(|e| AppError::render(format!("Failed to render '{}': {e}", svg.display())))?;
        info!(path = %svg.display(), "wrote chart");

        Ok(vec![png, svg])
    }
}

/// Date x axis whose labelled key points are the chart's Sunday major ticks.
fn date_axis(spec: &ChartSpec) -> impl Ranged<ValueType = NaiveDate, FormatOption = DefaultFormatting> {
    (spec.window.start..spec.window.end).with_key_points(spec.major_ticks.clone())
}

/// Raster and vector paths for a chart stem.
pub fn output_paths(dir: &Path, stem: &str) -> [PathBuf; 2] {
    [dir.join(format!("{stem}.png")), dir.join(format!("{stem}.svg"))]
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    scale: u32,
    fill_background: bool,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if fill_background {
        root.fill(&WHITE)?;
    }

    let px = |v: u32| v * scale;
    let font = |size: u32| ("sans-serif", f64::from(px(size))).into_font();

    // Plotters captions are single-line; stack one titled area per line.
    let mut area = root.margin(px(8), px(4), px(12), px(16));
    for line in &spec.title {
        area = area.titled(line, font(14))?;
    }

    let (y0, y1) = spec.y_range;
    let mut chart = ChartBuilder::on(&area)
        .margin(px(8))
        .x_label_area_size(px(40))
        .y_label_area_size(px(70))
        .build_cartesian_2d(date_axis(spec), y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(GRID.mix(0.9).stroke_width(scale))
        .light_line_style(&WHITE.mix(0.0))
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(spec.major_ticks.len().max(2))
        .x_label_formatter(&|d: &NaiveDate| d.format("%b %d").to_string())
        .y_label_formatter(&|v: &f64| format!("{v:.0}"))
        .label_style(font(11))
        .axis_desc_style(font(12))
        .draw()?;

    // Vertical date grid: faint daily lines under bold weekly ones.
    chart.draw_series(spec.minor_ticks.iter().map(|&d| {
        PathElement::new(vec![(d, y0), (d, y1)], GRID.mix(0.2).stroke_width(scale))
    }))?;
    chart.draw_series(spec.major_ticks.iter().map(|&d| {
        PathElement::new(vec![(d, y0), (d, y1)], GRID.mix(0.9).stroke_width(scale))
    }))?;

    // Plotters does not clip to the plotting area; cut lines at the window edges.
    let visible = |pts: &[(NaiveDate, f64)]| -> Vec<(NaiveDate, f64)> {
        spec.window
            .clip(pts)
            .into_iter()
            .filter(|(_, y)| (y0..=y1).contains(y))
            .collect()
    };

    let line_color = PALETTE[0];
    let marker_color = PALETTE[1];
    let observed = visible(&spec.observed);

    let line_style = line_color.stroke_width(px(spec.observed_width));
    let series = chart.draw_series(LineSeries::new(observed.iter().copied(), line_style))?;
    if let Some(label) = &spec.observed_label {
        series
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20 * scale as i32, y)], line_style));
    }
    chart.draw_series(
        observed
            .iter()
            .map(|&p| Circle::new(p, px(2), marker_color.filled())),
    )?;

    for (i, overlay) in spec.overlays.iter().enumerate() {
        let color = PALETTE[(i + 2) % PALETTE.len()];
        let style = color.stroke_width(px(2));
        let points = visible(&overlay.points);
        chart
            .draw_series(DashedLineSeries::new(points, px(2), px(4), style))?
            .label(overlay.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20 * scale as i32, y)], style));
    }

    if spec.show_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .label_font(font(11))
            .draw()?;
    }

    root.present()?;
    Ok(())
}
