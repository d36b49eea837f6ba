//! Per-frame diagnostic figure rendering.
//!
//! Renders a two-panel PNG (sagittal left, frontal right) with the landmark
//! scatter, the fitted spine curve and the per-landmark normal lines. All
//! rendering state is carried by [`RenderOptions`]; nothing ambient is
//! touched besides the output file.

use crate::error::SpineError;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BORDER: Rgb<u8> = Rgb([200, 200, 200]);
const CURVE: Rgb<u8> = Rgb([30, 80, 200]);
const POINT: Rgb<u8> = Rgb([180, 30, 30]);
const NORMAL: Rgb<u8> = Rgb([130, 130, 130]);

/// Rendering configuration injected into the analyzer.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// When false, no figures are produced.
    pub save_plots: bool,
    /// Pixel width of each panel.
    pub panel_width: u32,
    /// Pixel height of each panel.
    pub panel_height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            save_plots: false,
            panel_width: 450,
            panel_height: 450,
        }
    }
}

/// Geometry for one plane panel, in plane coordinates (lateral, height).
pub struct PanelData<'a> {
    pub points: &'a [[f64; 2]],
    pub curve: &'a [[f64; 2]],
    pub normal_slopes: &'a [f64],
}

/// Renders the two-panel figure for one frame to `path`.
pub fn render_frame(
    path: &Path,
    sagittal: &PanelData<'_>,
    frontal: &PanelData<'_>,
    opts: &RenderOptions,
) -> Result<(), SpineError> {
    let (pw, ph) = (opts.panel_width, opts.panel_height);
    let mut img = RgbImage::from_pixel(pw * 2, ph, BACKGROUND);

    draw_panel(&mut img, 0, pw, ph, sagittal);
    draw_panel(&mut img, pw, pw, ph, frontal);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SpineError::Io {
                path: parent.to_path_buf(),
                detail: e.to_string(),
            })?;
        }
    }
    img.save(path).map_err(|e| SpineError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

struct Viewport {
    x_off: f64,
    y_off: f64,
    scale_x: f64,
    scale_y: f64,
    min: [f64; 2],
    max: [f64; 2],
}

impl Viewport {
    /// Fits the data bounds into the panel with a 10% margin; height grows
    /// upward in data space, downward in pixel space.
    fn fit(x_off: u32, width: u32, height: u32, data: &PanelData<'_>) -> Option<Self> {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in data.points.iter().chain(data.curve.iter()) {
            for a in 0..2 {
                if p[a].is_finite() {
                    min[a] = min[a].min(p[a]);
                    max[a] = max[a].max(p[a]);
                }
            }
        }
        if !(min[0].is_finite() && max[1].is_finite()) {
            return None;
        }
        let span = |a: usize| (max[a] - min[a]).max(1e-9);
        let margin = 0.1;
        let scale_x = width as f64 * (1.0 - 2.0 * margin) / span(0);
        let scale_y = height as f64 * (1.0 - 2.0 * margin) / span(1);
        Some(Self {
            x_off: x_off as f64 + width as f64 * margin,
            y_off: height as f64 * margin,
            scale_x,
            scale_y,
            min,
            max,
        })
    }

    fn map(&self, p: [f64; 2]) -> (f64, f64) {
        let x = self.x_off + (p[0] - self.min[0]) * self.scale_x;
        let y = self.y_off + (self.max[1] - p[1]) * self.scale_y;
        (x, y)
    }

    /// Normal-line half-length in data units (lateral axis).
    fn normal_reach(&self) -> f64 {
        (self.max[0] - self.min[0]).max(self.max[1] - self.min[1]) * 0.08
    }
}

fn draw_panel(img: &mut RgbImage, x_off: u32, width: u32, height: u32, data: &PanelData<'_>) {
    draw_border(img, x_off, width, height);
    let Some(view) = Viewport::fit(x_off, width, height, data) else {
        return;
    };

    for pair in data.curve.windows(2) {
        let (x0, y0) = view.map(pair[0]);
        let (x1, y1) = view.map(pair[1]);
        draw_line(img, x0, y0, x1, y1, CURVE);
    }

    let reach = view.normal_reach();
    for (p, &slope) in data.points.iter().zip(data.normal_slopes) {
        if slope.is_nan() {
            continue;
        }
        // Unit direction of the normal line; vertical when the slope is ±inf.
        let (dx, dy) = if slope.is_infinite() {
            (0.0, 1.0)
        } else {
            let norm = (1.0 + slope * slope).sqrt();
            (1.0 / norm, slope / norm)
        };
        let a = view.map([p[0] - dx * reach, p[1] - dy * reach]);
        let b = view.map([p[0] + dx * reach, p[1] + dy * reach]);
        draw_line(img, a.0, a.1, b.0, b.1, NORMAL);
    }

    for p in data.points {
        let (x, y) = view.map(*p);
        draw_square(img, x, y, 2, POINT);
    }
}

fn draw_border(img: &mut RgbImage, x_off: u32, width: u32, height: u32) {
    for x in x_off..x_off + width {
        put(img, x as i64, 0, BORDER);
        put(img, x as i64, height as i64 - 1, BORDER);
    }
    for y in 0..height {
        put(img, x_off as i64, y as i64, BORDER);
        put(img, (x_off + width) as i64 - 1, y as i64, BORDER);
    }
}

/// DDA line draw; endpoints outside the image are clipped per pixel.
fn draw_line(img: &mut RgbImage, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb<u8>) {
    if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
        return;
    }
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0);
    let n = steps as usize;
    for i in 0..=n {
        let t = i as f64 / steps;
        let x = x0 + (x1 - x0) * t;
        let y = y0 + (y1 - y0) * t;
        put(img, x.round() as i64, y.round() as i64, color);
    }
}

fn draw_square(img: &mut RgbImage, cx: f64, cy: f64, half: i64, color: Rgb<u8>) {
    let (cx, cy) = (cx.round() as i64, cy.round() as i64);
    for dy in -half..=half {
        for dx in -half..=half {
            put(img, cx + dx, cy + dy, color);
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}
