//! Render-independent chart descriptions.
//!
//! Every output image is described by a `ChartSpec` built from the series and
//! fit results. All windows, ticks, labels, and sampled curves are computed
//! here, so the renderer only draws and the layout can be tested without a
//! drawing backend.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::domain::{DATA_CREDIT, DailySeries, ExponentialFit, LogisticFit};

/// `[today - back, today + forward]` windows per chart.
pub const BASELINE_WINDOW: (i64, i64) = (45, 2);
pub const EXPONENTIAL_WINDOW: (i64, i64) = (25, 6);
pub const LOGISTIC_WINDOW: (i64, i64) = (30, 15);

/// Days past today that each fitted curve is extended.
pub const EXPONENTIAL_HORIZON: i64 = 4;
pub const LOGISTIC_HORIZON: i64 = 15;

pub const BASELINE_STEM: &str = "covid19";
pub const EXPONENTIAL_STEM: &str = "covid19-fit";
pub const LOGISTIC_STEMS: [&str; 2] = ["covid19-logistic-fit", "covid19-logistic-fit2"];

/// Inclusive x-axis date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn around(today: NaiveDate, (back, forward): (i64, i64)) -> Self {
        Self {
            start: today - Duration::days(back),
            end: today + Duration::days(forward),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clip a date-ordered polyline to the window.
    ///
    /// A segment crossing an edge is cut there with a linearly interpolated
    /// value, so the line reaches the axis instead of starting at the first
    /// point inside.
    pub fn clip(&self, points: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
        let mut out = Vec::with_capacity(points.len());
        let mut prev: Option<(NaiveDate, f64)> = None;
        for &(date, y) in points {
            if let Some(p) = prev {
                for edge in [self.start, self.end] {
                    if p.0 < edge && edge < date {
                        out.push((edge, interpolate(p, (date, y), edge)));
                    }
                }
            }
            if self.contains(date) {
                out.push((date, y));
            }
            prev = Some((date, y));
        }
        out
    }
}

fn interpolate((d0, y0): (NaiveDate, f64), (d1, y1): (NaiveDate, f64), at: NaiveDate) -> f64 {
    let span = (d1 - d0).num_days() as f64;
    let offset = (at - d0).num_days() as f64;
    y0 + (y1 - y0) * offset / span
}

/// A fitted curve drawn dotted over the observed series.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// File name without extension; one file per output format.
    pub file_stem: String,
    pub title: Vec<String>,
    pub x_label: String,
    pub y_label: String,
    pub window: DateWindow,
    pub observed: Vec<(NaiveDate, f64)>,
    pub observed_label: Option<String>,
    /// Stroke width of the observed line, before output scaling.
    pub observed_width: u32,
    pub overlays: Vec<Overlay>,
    /// Week boundaries (Sundays).
    pub major_ticks: Vec<NaiveDate>,
    /// Day boundaries.
    pub minor_ticks: Vec<NaiveDate>,
    pub y_range: (f64, f64),
}

impl ChartSpec {
    pub fn show_legend(&self) -> bool {
        self.observed_label.is_some() || !self.overlays.is_empty()
    }
}

/// Per-run values shared by every chart.
#[derive(Debug, Clone)]
pub struct ChartContext {
    pub country_name: String,
    pub today: NaiveDate,
    /// Preformatted generation timestamp (`%Y-%m-%d @ %H:%M %Z`).
    pub generated: String,
}

impl ChartContext {
    fn title(&self, headline: String) -> Vec<String> {
        vec![
            headline,
            format!("Generated on {}", self.generated),
            format!("Data From: {DATA_CREDIT}"),
        ]
    }

    fn y_label(&self) -> String {
        format!("Cases in {}", self.country_name)
    }
}

/// Raw cumulative cases over the last six weeks.
pub fn baseline_chart(series: &DailySeries, ctx: &ChartContext) -> ChartSpec {
    let window = DateWindow::around(ctx.today, BASELINE_WINDOW);
    build(
        BASELINE_STEM,
        ctx.title(format!("Cases of COVID-19 in {}", ctx.country_name)),
        ctx,
        series,
        window,
        None,
        2,
        Vec::new(),
    )
}

/// Observed series with the fitted exponential curve.
pub fn exponential_chart(series: &DailySeries, fit: &ExponentialFit, ctx: &ChartContext) -> ChartSpec {
    let window = DateWindow::around(ctx.today, EXPONENTIAL_WINDOW);
    let overlay = Overlay {
        label: format!(
            "Exponential Curve Fit (Factor = {:.2}, Start = {})",
            fit.a,
            series.date_at(fit.b).format("%Y-%m-%d")
        ),
        points: sample_curve(series, ctx.today + Duration::days(EXPONENTIAL_HORIZON), |t| fit.predict(t)),
    };
    build(
        EXPONENTIAL_STEM,
        ctx.title(format!("Exponential Curve Fit for COVID-19 Cases in {}", ctx.country_name)),
        ctx,
        series,
        window,
        None,
        2,
        vec![overlay],
    )
}

/// Observed series with one overlay per logistic fit, in the given order.
pub fn logistic_chart(
    file_stem: &str,
    series: &DailySeries,
    fits: &[&LogisticFit],
    ctx: &ChartContext,
) -> ChartSpec {
    let window = DateWindow::around(ctx.today, LOGISTIC_WINDOW);
    let horizon = ctx.today + Duration::days(LOGISTIC_HORIZON);
    let overlays = fits
        .iter()
        .map(|fit| Overlay {
            label: logistic_label(series, fit),
            points: sample_curve(series, horizon, |t| fit.predict(t)),
        })
        .collect();
    build(
        file_stem,
        ctx.title(format!("Hypothetical Logistic Fit for COVID-19 Cases in {}", ctx.country_name)),
        ctx,
        series,
        window,
        Some("Actual Data".to_string()),
        1,
        overlays,
    )
}

pub fn logistic_label(series: &DailySeries, fit: &LogisticFit) -> String {
    format!(
        "Logistic Fit ({:.2}, L={}, Assuming Inflection ~{})",
        fit.a,
        fit.l.trunc(),
        series.date_at(fit.b).format("%Y-%m-%d")
    )
}

#[allow(clippy::too_many_arguments)]
fn build(
    file_stem: &str,
    title: Vec<String>,
    ctx: &ChartContext,
    series: &DailySeries,
    window: DateWindow,
    observed_label: Option<String>,
    observed_width: u32,
    overlays: Vec<Overlay>,
) -> ChartSpec {
    let (major_ticks, minor_ticks) = date_ticks(series.origin(), window);
    let observed = series.points().to_vec();
    let y_range = y_range(&observed, &overlays, window);
    ChartSpec {
        file_stem: file_stem.to_string(),
        title,
        x_label: "Date".to_string(),
        y_label: ctx.y_label(),
        window,
        observed,
        observed_label,
        observed_width,
        overlays,
        major_ticks,
        minor_ticks,
        y_range,
    }
}

/// Evaluate `f` at every day index from the origin through `last`.
///
/// Non-finite values are dropped so a diverging fit cannot poison the axes.
pub fn sample_curve(series: &DailySeries, last: NaiveDate, f: impl Fn(f64) -> f64) -> Vec<(NaiveDate, f64)> {
    let n = series.day_index(last);
    (0..=n)
        .filter_map(|t| {
            let y = f(t as f64);
            y.is_finite().then(|| (series.origin() + Duration::days(t), y))
        })
        .collect()
}

/// Weekly (Sunday) major and daily minor ticks, starting no earlier than the
/// series origin and clipped to the window.
pub fn date_ticks(origin: NaiveDate, window: DateWindow) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    let first = origin.max(window.start);
    let minor: Vec<NaiveDate> = first
        .iter_days()
        .take_while(|d| *d <= window.end)
        .collect();
    let major = minor
        .iter()
        .copied()
        .filter(|d| d.weekday() == Weekday::Sun)
        .collect();
    (major, minor)
}

/// Y bounds over the lines as clipped to the window, padded by 5% of the span.
///
/// Falls back to every value when nothing lands in the window.
pub fn y_range(observed: &[(NaiveDate, f64)], overlays: &[Overlay], window: DateWindow) -> (f64, f64) {
    let lines = || std::iter::once(observed).chain(overlays.iter().map(|o| o.points.as_slice()));

    let mut bounds = min_max(
        lines()
            .flat_map(|pts| window.clip(pts))
            .map(|(_, v)| v)
            .filter(|v| v.is_finite()),
    );
    if bounds.is_none() {
        bounds = min_max(
            lines()
                .flat_map(|pts| pts.iter().map(|&(_, v)| v))
                .filter(|v| v.is_finite()),
        );
    }

    let (lo, hi) = bounds.unwrap_or((0.0, 1.0));
    let span = hi - lo;
    if span <= 0.0 {
        return (lo - 1.0, hi + 1.0);
    }
    (lo - 0.05 * span, hi + 0.05 * span)
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
