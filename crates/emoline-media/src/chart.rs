//! Emotion timeline chart rendering.
//!
//! Draws one line per label over time on a 0–100 confidence axis. Adjacent
//! rows are joined only when the label is present in both; a missing value
//! breaks the line. A point with no neighbour is drawn as a marker.
//!
//! Text (title, axis labels, tick values, legend names) uses the embedded
//! 8x8 bitmap font, so no font file is needed at render time.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};
use crate::timeline::TimeSeries;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

pub const CHART_TITLE: &str = "Emotion Timeline";
pub const X_AXIS_LABEL: &str = "Time (seconds)";
pub const Y_AXIS_LABEL: &str = "Confidence (%)";

/// Glyph cell size of the bitmap font before scaling.
const GLYPH: i64 = 8;
/// Number of value labels along the time axis.
const X_TICKS: usize = 5;

/// Series colours, assigned to labels in sorted order.
const PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

/// Chart dimensions and margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    /// Space right of the plot reserved for the legend
    pub legend_width: u32,
    /// Horizontal grid lines every this many confidence points
    pub grid_step: u32,
    /// Integer scale of the 8px bitmap font
    pub text_scale: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            margin: 60,
            legend_width: 180,
            grid_step: 20,
            text_scale: 2,
        }
    }
}

/// Renders a [`TimeSeries`] to a PNG line chart.
#[derive(Debug, Clone, Default)]
pub struct TimelineChartExporter {
    config: ChartConfig,
}

impl TimelineChartExporter {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    /// Colour used for each label, in legend order.
    pub fn legend(&self, series: &TimeSeries) -> Vec<(String, Rgb<u8>)> {
        series
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), PALETTE[i % PALETTE.len()]))
            .collect()
    }

    /// Render the chart to an in-memory image.
    pub fn render(&self, series: &TimeSeries) -> RgbImage {
        let ChartConfig { width, height, .. } = self.config;
        let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
        let frame = PlotFrame::new(&self.config, series);

        self.draw_grid(&mut img, &frame);
        self.draw_labels(&mut img, &frame);

        for (label, color) in self.legend(series) {
            let column = series.column(&label);
            let points: Vec<Option<(i64, i64)>> = series
                .rows
                .iter()
                .zip(&column)
                .map(|(row, value)| value.map(|v| frame.project(row.timestamp, v * 100.0)))
                .collect();

            for (i, point) in points.iter().enumerate() {
                let Some(p) = point else { continue };
                let next = points.get(i + 1).copied().flatten();
                let prev = if i > 0 { points[i - 1] } else { None };

                if let Some(n) = next {
                    draw_line(&mut img, *p, n, color);
                }
                if next.is_none() && prev.is_none() {
                    draw_marker(&mut img, *p, color);
                }
            }
        }

        self.draw_legend(&mut img, &frame, series);
        img
    }

    /// Render and write the chart to `path` as PNG, atomically.
    pub async fn export(&self, series: &TimeSeries, path: impl AsRef<Path>) -> MediaResult<()> {
        let path = path.as_ref();
        if series.is_empty() {
            warn!("Time series is empty; writing an empty chart");
        }

        let img = self.render(series);
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .map_err(|e| MediaError::ChartFailed(e.to_string()))?;

        crate::fs_utils::write_atomic(path, &buf).await?;

        info!(
            path = %path.display(),
            labels = series.labels.len(),
            rows = series.rows.len(),
            "Wrote emotion chart"
        );
        Ok(())
    }

    fn draw_grid(&self, img: &mut RgbImage, frame: &PlotFrame) {
        for level in self.grid_levels() {
            let (_, y) = frame.project(frame.t_min, level as f64);
            draw_line(img, (frame.left, y), (frame.right, y), GRID);
        }

        draw_line(img, (frame.left, frame.top), (frame.left, frame.bottom), AXIS);
        draw_line(img, (frame.left, frame.bottom), (frame.right, frame.bottom), AXIS);
    }

    fn grid_levels(&self) -> impl Iterator<Item = u32> {
        (0..=100).step_by(self.config.grid_step.max(1) as usize)
    }

    /// Title, axis names and tick values.
    fn draw_labels(&self, img: &mut RgbImage, frame: &PlotFrame) {
        let big = self.config.text_scale.max(1) as i64;
        let small = (big / 2).max(1);

        let title_x = (frame.left + frame.right) / 2 - text_width(CHART_TITLE, big) / 2;
        let title_y = (frame.top - GLYPH * big) / 2;
        draw_text(img, (title_x, title_y), CHART_TITLE, AXIS, big);

        for level in self.grid_levels() {
            let (_, y) = frame.project(frame.t_min, level as f64);
            let text = level.to_string();
            let x = frame.left - 6 - text_width(&text, small);
            draw_text(img, (x, y - GLYPH * small / 2), &text, AXIS, small);
        }

        for i in 0..X_TICKS {
            let t = frame.t_min + (frame.t_max - frame.t_min) * i as f64 / (X_TICKS - 1) as f64;
            let (x, _) = frame.project(t, 0.0);
            draw_line(img, (x, frame.bottom), (x, frame.bottom + 4), AXIS);
            let text = format!("{:.1}", t);
            draw_text(img, (x - text_width(&text, small) / 2, frame.bottom + 8), &text, AXIS, small);
        }

        let x_label_x = (frame.left + frame.right) / 2 - text_width(X_AXIS_LABEL, big) / 2;
        draw_text(img, (x_label_x, frame.bottom + 8 + GLYPH * small + 6), X_AXIS_LABEL, AXIS, big);

        let y_label_y = (frame.top + frame.bottom) / 2 + text_width(Y_AXIS_LABEL, big) / 2;
        draw_text_vertical(img, (6, y_label_y), Y_AXIS_LABEL, AXIS, big);
    }

    fn draw_legend(&self, img: &mut RgbImage, frame: &PlotFrame, series: &TimeSeries) {
        let scale = self.config.text_scale.max(1) as i64;
        let swatch = GLYPH * scale;
        let x = frame.right + 16;
        for (i, (label, color)) in self.legend(series).into_iter().enumerate() {
            let y = frame.top + i as i64 * (swatch + 8);
            for dy in 0..swatch {
                for dx in 0..swatch {
                    put(img, x + dx, y + dy, color);
                }
            }
            draw_text(img, (x + swatch + 6, y), &label, AXIS, scale);
        }
    }
}

/// Plot area and data ranges.
struct PlotFrame {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
    t_min: f64,
    t_max: f64,
}

impl PlotFrame {
    fn new(config: &ChartConfig, series: &TimeSeries) -> Self {
        let margin = config.margin as i64;
        let (mut t_min, mut t_max) = series
            .rows
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| {
                (lo.min(row.timestamp), hi.max(row.timestamp))
            });
        if !t_min.is_finite() {
            t_min = 0.0;
            t_max = 1.0;
        } else if t_max - t_min < f64::EPSILON {
            t_min -= 0.5;
            t_max += 0.5;
        }

        Self {
            left: margin,
            right: config.width as i64 - margin - config.legend_width as i64,
            top: margin,
            bottom: config.height as i64 - margin,
            t_min,
            t_max,
        }
    }

    /// Map (seconds, confidence 0–100) to pixel coordinates.
    fn project(&self, t: f64, confidence: f64) -> (i64, i64) {
        let fx = (t - self.t_min) / (self.t_max - self.t_min);
        let fy = confidence.clamp(0.0, 100.0) / 100.0;
        let x = self.left as f64 + fx * (self.right - self.left) as f64;
        let y = self.bottom as f64 - fy * (self.bottom - self.top) as f64;
        (x.round() as i64, y.round() as i64)
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, two pixels thick.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(img, x0, y0, color);
        put(img, x0, y0 + 1, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn text_width(text: &str, scale: i64) -> i64 {
    text.chars().count() as i64 * GLYPH * scale
}

/// Left-to-right text with its top-left corner at `at`. Characters outside
/// the basic Latin set advance without drawing.
fn draw_text(img: &mut RgbImage, at: (i64, i64), text: &str, color: Rgb<u8>, scale: i64) {
    for (k, c) in text.chars().enumerate() {
        let origin = at.0 + k as i64 * GLYPH * scale;
        for_each_glyph_pixel(c, |gx, gy| {
            fill(img, (origin + gx * scale, at.1 + gy * scale), scale, color);
        });
    }
}

/// Text rotated a quarter turn counter-clockwise, reading bottom to top
/// from `at`.
fn draw_text_vertical(img: &mut RgbImage, at: (i64, i64), text: &str, color: Rgb<u8>, scale: i64) {
    for (k, c) in text.chars().enumerate() {
        let origin = at.1 - k as i64 * GLYPH * scale;
        for_each_glyph_pixel(c, |gx, gy| {
            fill(img, (at.0 + gy * scale, origin - (gx + 1) * scale), scale, color);
        });
    }
}

fn for_each_glyph_pixel(c: char, mut f: impl FnMut(i64, i64)) {
    let Some(rows) = BASIC_FONTS.get(c) else { return };
    for (gy, bits) in rows.iter().enumerate() {
        for gx in 0..8 {
            if bits & (1 << gx) != 0 {
                f(gx as i64, gy as i64);
            }
        }
    }
}

fn fill(img: &mut RgbImage, at: (i64, i64), size: i64, color: Rgb<u8>) {
    for dy in 0..size {
        for dx in 0..size {
            put(img, at.0 + dx, at.1 + dy, color);
        }
    }
}

fn draw_marker(img: &mut RgbImage, at: (i64, i64), color: Rgb<u8>) {
    for dy in -3..=3 {
        for dx in -3..=3 {
            put(img, at.0 + dx, at.1 + dy, color);
        }
    }
}
