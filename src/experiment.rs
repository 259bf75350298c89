// The four visualizations and their per-cell sampling passes.
//
// Every pass reads an immutable parameter snapshot and writes one quantized
// cell per grid position; nothing here touches the terminal.

use crate::fractal::{escape_time, View, JULIA_PRESETS};
use crate::frame::Frame;
use crate::life::{Grid, RULES};
use crate::noise::NoiseField;
use crate::palette::{arrow_glyph, line_glyph, to_color_index, to_glyph, Library};
use crate::params::{CycleKey, FlagKey, ParameterSet, Slider, SliderKey};
use crate::plasma::plasma_value;
use crate::segment::Quantized;
use std::f64::consts::{PI, TAU};

// Noise z advances this much per unit of simulated time.
const NOISE_TIME_RATE: f64 = 0.35;
const FBM_OCTAVES: u32 = 4;
// Fractal band palette rotates this many entries per unit of simulated time.
const BAND_CYCLE_RATE: f64 = 2.0;
const SOLID: char = '█';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExperimentKind {
    Noise,
    Plasma,
    Fractal,
    Life,
}

impl ExperimentKind {
    pub const ALL: [ExperimentKind; 4] = [
        ExperimentKind::Noise,
        ExperimentKind::Plasma,
        ExperimentKind::Fractal,
        ExperimentKind::Life,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ExperimentKind::Noise => "Simplex noise",
            ExperimentKind::Plasma => "Plasma",
            ExperimentKind::Fractal => "Mandelbrot / Julia",
            ExperimentKind::Life => "Game of Life",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            ExperimentKind::Noise => "3D gradient noise sliced through time",
            ExperimentKind::Plasma => "five interfering sine waves",
            ExperimentKind::Fractal => "escape-time iteration, smooth colored",
            ExperimentKind::Life => "B3/S23 and friends on a torus",
        }
    }

    pub fn modes(self) -> &'static [&'static str] {
        match self {
            ExperimentKind::Noise => &["shade", "arrows", "lines", "turbulence"],
            ExperimentKind::Plasma => &["shade", "solid", "mono"],
            ExperimentKind::Fractal => &["smooth", "banded"],
            ExperimentKind::Life => &["neighbors", "flat"],
        }
    }

    /// Parameter surface with declared ranges and steps.
    pub fn default_params(self, seed: u64, lib: &Library, patterns: usize) -> ParameterSet {
        let base = ParameterSet::new(seed)
            .with_cycle(CycleKey::Mode, self.modes().len())
            .with_cycle(CycleKey::Palette, lib.palettes.len())
            .with_cycle(CycleKey::Ramp, lib.ramps.len())
            .with_flag(FlagKey::Color, true);

        match self {
            ExperimentKind::Noise | ExperimentKind::Plasma => base
                .with_slider(Slider::new(SliderKey::Scale, 8.0, 1.0, 20.0, 1.0))
                .with_slider(Slider::new(SliderKey::Speed, 100.0, 10.0, 200.0, 10.0)),
            ExperimentKind::Fractal => base
                .with_slider(Slider::new(SliderKey::MaxIter, 100.0, 20.0, 500.0, 20.0))
                .with_slider(Slider::new(SliderKey::JuliaRe, JULIA_PRESETS[0].1 .0, -2.0, 2.0, 0.05))
                .with_slider(Slider::new(SliderKey::JuliaIm, JULIA_PRESETS[0].1 .1, -2.0, 2.0, 0.05))
                .with_slider(Slider::new(SliderKey::Speed, 100.0, 10.0, 200.0, 10.0))
                .with_cycle(CycleKey::JuliaPreset, JULIA_PRESETS.len())
                .with_flag(FlagKey::Julia, false),
            ExperimentKind::Life => base
                .with_slider(Slider::new(SliderKey::TickMs, 100.0, 25.0, 500.0, 25.0))
                .with_slider(Slider::new(SliderKey::Density, 30.0, 10.0, 90.0, 5.0))
                .with_cycle(CycleKey::Pattern, patterns)
                .with_cycle(CycleKey::Rule, RULES.len())
                .with_flag(FlagKey::Wrap, true),
        }
    }
}

/// Read-only inputs shared by one frame's sampling pass.
pub struct SampleCtx<'a> {
    pub params: &'a ParameterSet,
    pub lib: &'a Library,
    pub time: f64,
    /// Cell height over width.
    pub cell_aspect: f64,
}

impl SampleCtx<'_> {
    fn color_on(&self) -> bool {
        self.params.flag(FlagKey::Color)
    }

    fn palette_len(&self) -> usize {
        if self.color_on() {
            self.lib.palette(self.params.cycle(CycleKey::Palette)).len()
        } else {
            1
        }
    }

    fn color(&self, value: f64) -> u8 {
        if self.color_on() {
            to_color_index(value, self.palette_len())
        } else {
            0
        }
    }

    fn glyph(&self, value: f64) -> char {
        to_glyph(value, self.lib.ramp(self.params.cycle(CycleKey::Ramp)))
    }
}

pub fn sample_noise(noise: &NoiseField, ctx: &SampleCtx<'_>, frame: &mut Frame) {
    let freq = 0.5 / ctx.params.get(SliderKey::Scale).max(1.0);
    let z = ctx.time * NOISE_TIME_RATE;
    let mode = ctx.params.cycle(CycleKey::Mode);

    for y in 0..frame.height() {
        let ny = y as f64 * ctx.cell_aspect * freq;
        for (x, cell) in frame.row_mut(y).iter_mut().enumerate() {
            let nx = x as f64 * freq;
            *cell = match mode {
                1 => {
                    let n = noise.sample3(nx, ny, z).clamp(-1.0, 1.0);
                    Quantized::new(arrow_glyph(n * TAU), ctx.color((n + 1.0) * 0.5))
                }
                2 => {
                    let n = noise.sample3(nx, ny, z).clamp(-1.0, 1.0);
                    Quantized::new(line_glyph(n * PI), ctx.color((n + 1.0) * 0.5))
                }
                3 => {
                    let v = noise.fbm3(nx, ny, z, FBM_OCTAVES).abs().min(1.0);
                    Quantized::new(ctx.glyph(v), ctx.color(v))
                }
                _ => {
                    let v = ((noise.sample3(nx, ny, z) + 1.0) * 0.5).clamp(0.0, 1.0);
                    Quantized::new(ctx.glyph(v), ctx.color(v))
                }
            };
        }
    }
}

/// `origin` shifts the sampled window so reseeding shows a different region.
pub fn sample_plasma(origin: (f64, f64), ctx: &SampleCtx<'_>, frame: &mut Frame) {
    let scale = ctx.params.get(SliderKey::Scale).max(1.0);
    let mode = ctx.params.cycle(CycleKey::Mode);
    let top = ctx.palette_len().saturating_sub(1) as u8;

    for y in 0..frame.height() {
        let py = origin.1 + y as f64 * ctx.cell_aspect;
        for (x, cell) in frame.row_mut(y).iter_mut().enumerate() {
            let v = plasma_value(origin.0 + x as f64, py, ctx.time, scale);
            *cell = match mode {
                1 => Quantized::new(SOLID, ctx.color(v)),
                2 => Quantized::new(ctx.glyph(v), if ctx.color_on() { top } else { 0 }),
                _ => Quantized::new(ctx.glyph(v), ctx.color(v)),
            };
        }
    }
}

pub fn sample_fractal(view: &View, ctx: &SampleCtx<'_>, frame: &mut Frame) {
    let max_iter = ctx.params.get(SliderKey::MaxIter).round().max(1.0) as u32;
    let julia_mode = ctx.params.flag(FlagKey::Julia);
    let c = (ctx.params.get(SliderKey::JuliaRe), ctx.params.get(SliderKey::JuliaIm));
    let banded = ctx.params.cycle(CycleKey::Mode) == 1;
    let len = ctx.palette_len();
    let shift = (ctx.time * BAND_CYCLE_RATE).floor().max(0.0) as usize;
    let (w, h) = (frame.width(), frame.height());
    let inside = Quantized::new(' ', 0);

    for y in 0..h {
        for (x, cell) in frame.row_mut(y).iter_mut().enumerate() {
            let (re, im) = view.to_plane(x, y, w, h, ctx.cell_aspect);
            let s = escape_time(re, im, max_iter, julia_mode, c);
            if !s.escaped {
                *cell = inside;
                continue;
            }
            let v = s.ratio(max_iter).sqrt();
            let color = if banded && ctx.color_on() {
                ((s.iterations as usize + shift) % len) as u8
            } else {
                ctx.color(v)
            };
            *cell = Quantized::new(ctx.glyph(v.max(0.12)), color);
        }
    }
}

pub fn sample_life(grid: &Grid, ctx: &SampleCtx<'_>, frame: &mut Frame) {
    let flat = ctx.params.cycle(CycleKey::Mode) == 1;
    let full = ctx.lib.ramp(ctx.params.cycle(CycleKey::Ramp)).full();
    let top = ctx.palette_len().saturating_sub(1) as u8;
    let dead = Quantized::new(' ', 0);

    for y in 0..frame.height() {
        for (x, cell) in frame.row_mut(y).iter_mut().enumerate() {
            *cell = if !grid.get(x, y) {
                dead
            } else if flat || !ctx.color_on() {
                Quantized::new(full, if ctx.color_on() { top } else { 0 })
            } else {
                let n = grid.neighbors(x, y) as f64 / 8.0;
                Quantized::new(full, ctx.color(n))
            };
        }
    }
}
