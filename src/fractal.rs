// Escape-time iteration for Mandelbrot and Julia sets.

use std::f64::consts::LN_2;

const BAILOUT_SQ: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscapeSample {
    pub iterations: u32,
    pub escaped: bool,
    /// Continuous iteration count; equals `iterations` when not escaped.
    pub smooth: f64,
}

impl EscapeSample {
    /// Position in [0, 1] relative to the iteration cap.
    pub fn ratio(&self, max_iter: u32) -> f64 {
        if !self.escaped || max_iter == 0 {
            return 1.0;
        }
        (self.smooth / max_iter as f64).clamp(0.0, 1.0)
    }
}

/// Iterate `z <- z^2 + c` until `|z|^2 > 4` or `max_iter` steps.
///
/// Mandelbrot starts at `z = c`, which is the first step taken from `z = 0`
/// already applied; Julia starts at `z = (x0, y0)` with `c = julia`.
pub fn escape_time(x0: f64, y0: f64, max_iter: u32, julia_mode: bool, julia: (f64, f64)) -> EscapeSample {
    let (mut zr, mut zi, cr, ci) = if julia_mode {
        (x0, y0, julia.0, julia.1)
    } else {
        (x0, y0, x0, y0)
    };

    let mut iterations = 0u32;
    let mut mag_sq = zr * zr + zi * zi;
    while iterations < max_iter && mag_sq <= BAILOUT_SQ {
        let nr = zr * zr - zi * zi + cr;
        zi = 2.0 * zr * zi + ci;
        zr = nr;
        mag_sq = zr * zr + zi * zi;
        iterations += 1;
    }

    let escaped = iterations < max_iter;
    let smooth = if escaped && iterations > 0 {
        let log_zn = mag_sq.ln() / 2.0;
        let nu = (log_zn / LN_2).ln() / LN_2;
        iterations as f64 + 1.0 - nu
    } else {
        iterations as f64
    };

    EscapeSample {
        iterations,
        escaped,
        smooth,
    }
}

/// Window onto the complex plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub center: (f64, f64),
    pub zoom: f64,
}

pub const MIN_ZOOM: f64 = 0.1;
pub const ZOOM_STEP: f64 = 1.5;
pub const PAN_STEP: f64 = 0.5;
// Imaginary span visible at zoom 1.
const BASE_SPAN: f64 = 3.0;

impl Default for View {
    fn default() -> Self {
        Self {
            center: (-0.5, 0.0),
            zoom: 1.0,
        }
    }
}

impl View {
    pub fn julia_default() -> Self {
        Self {
            center: (0.0, 0.0),
            zoom: 1.0,
        }
    }

    /// Pan by whole steps; one step moves `0.5 / zoom` in the plane.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let step = PAN_STEP / self.zoom;
        self.center.0 += dx as f64 * step;
        self.center.1 += dy as f64 * step;
    }

    pub fn zoom_in(&mut self) {
        self.zoom *= ZOOM_STEP;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Map cell `(col, row)` of a `w x h` grid into the plane. `cell_aspect` is
    /// cell height over width; the horizontal span is widened by
    /// `w / (h * cell_aspect)` so circles stay round.
    pub fn to_plane(&self, col: usize, row: usize, w: usize, h: usize, cell_aspect: f64) -> (f64, f64) {
        let w = w.max(1) as f64;
        let h = h.max(1) as f64;
        let span_y = BASE_SPAN / self.zoom;
        let span_x = span_y * w / (h * cell_aspect);
        let fx = (col as f64 + 0.5) / w - 0.5;
        let fy = (row as f64 + 0.5) / h - 0.5;
        (self.center.0 + fx * span_x, self.center.1 + fy * span_y)
    }
}

/// Named Julia constants.
pub const JULIA_PRESETS: [(&str, (f64, f64)); 5] = [
    ("dendrite", (0.0, 1.0)),
    ("rabbit", (-0.123, 0.745)),
    ("spiral", (-0.8, 0.156)),
    ("seahorse", (-0.75, 0.11)),
    ("siegel", (-0.391, -0.587)),
];
