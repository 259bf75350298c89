use anyhow::{ensure, Result};
use crossterm::style::Color;
use std::f64::consts::{PI, TAU};

// Keeps value 1.0 inside the last bucket.
const BUCKET_EPS: f64 = 1e-9;

/// Ordered characters from "empty" to "full".
#[derive(Clone, Debug)]
pub struct GlyphRamp {
    pub name: &'static str,
    glyphs: Vec<char>,
}

impl GlyphRamp {
    pub fn new(name: &'static str, glyphs: &str) -> Result<Self> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        ensure!(!glyphs.is_empty(), "glyph ramp `{name}` is empty");
        Ok(Self { name, glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, i: usize) -> char {
        self.glyphs[i.min(self.glyphs.len() - 1)]
    }

    pub fn full(&self) -> char {
        self.glyphs[self.glyphs.len() - 1]
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }
}

#[derive(Clone, Debug)]
pub struct Palette {
    pub name: &'static str,
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(name: &'static str, colors: Vec<Color>) -> Result<Self> {
        ensure!(!colors.is_empty(), "palette `{name}` has no colors");
        Ok(Self { name, colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Out-of-range indices resolve to the last entry.
    pub fn color(&self, index: u8) -> Color {
        self.colors[(index as usize).min(self.colors.len() - 1)]
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

/// Linear bucketing of a normalized value into `len` slots.
pub fn bucket(value: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    let i = (v * (len as f64 - BUCKET_EPS)).floor() as usize;
    i.min(len - 1)
}

pub fn to_glyph(value: f64, ramp: &GlyphRamp) -> char {
    ramp.get(bucket(value, ramp.len()))
}

pub fn to_color_index(value: f64, palette_size: usize) -> u8 {
    bucket(value, palette_size).min(u8::MAX as usize) as u8
}

/// Nearest of `sectors` equal slices of the full circle (or half circle when
/// `symmetric`, for glyphs that look the same pointing either way).
pub fn angle_sector(angle: f64, sectors: usize, symmetric: bool) -> usize {
    if sectors == 0 {
        return 0;
    }
    let range = if symmetric { PI } else { TAU };
    let a = if angle.is_finite() { angle.rem_euclid(range) } else { 0.0 };
    let s = (a / range * sectors as f64).round() as usize;
    s % sectors
}

// Terminal rows grow downward, so positive angles turn clockwise on screen.
pub const ARROWS_8: [char; 8] = ['→', '↘', '↓', '↙', '←', '↖', '↑', '↗'];
pub const LINES_4: [char; 4] = ['─', '╲', '│', '╱'];

pub fn arrow_glyph(angle: f64) -> char {
    ARROWS_8[angle_sector(angle, ARROWS_8.len(), false)]
}

pub fn line_glyph(angle: f64) -> char {
    LINES_4[angle_sector(angle, LINES_4.len(), true)]
}

/* -----------------------------
   Generators
------------------------------ */

pub const PALETTE_SIZE: usize = 6;

fn to_rgb(c: (f64, f64, f64)) -> Color {
    let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    Color::Rgb {
        r: q(c.0),
        g: q(c.1),
        b: q(c.2),
    }
}

fn hsv(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

/// `n` colors sweeping hue from `from` to `to` degrees, brightening as they go.
pub fn hue_ramp(from: f64, to: f64, n: usize) -> Vec<Color> {
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            to_rgb(hsv(from + (to - from) * t, 0.85, 0.45 + 0.55 * t))
        })
        .collect()
}

/// `n` shades of one base color from dim to full.
pub fn brightness_ramp(base: (u8, u8, u8), n: usize) -> Vec<Color> {
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 1.0 };
            let k = 0.25 + 0.75 * t;
            to_rgb((
                base.0 as f64 / 255.0 * k,
                base.1 as f64 / 255.0 * k,
                base.2 as f64 / 255.0 * k,
            ))
        })
        .collect()
}

/// Palettes and ramps built once at startup; read-only afterwards.
pub struct Library {
    pub palettes: Vec<Palette>,
    pub ramps: Vec<GlyphRamp>,
    pub mono: Palette,
}

impl Library {
    pub fn builtin() -> Result<Self> {
        let palettes = vec![
            Palette::new("fire", hue_ramp(0.0, 55.0, PALETTE_SIZE))?,
            Palette::new("ocean", hue_ramp(230.0, 170.0, PALETTE_SIZE))?,
            Palette::new("aurora", hue_ramp(140.0, 290.0, PALETTE_SIZE))?,
            Palette::new("rainbow", hue_ramp(0.0, 300.0, PALETTE_SIZE))?,
            Palette::new("matrix", brightness_ramp((60, 255, 90), PALETTE_SIZE))?,
            Palette::new("amber", brightness_ramp((255, 176, 0), PALETTE_SIZE))?,
        ];
        let ramps = vec![
            GlyphRamp::new("ascii", " .:-=+*#%@")?,
            GlyphRamp::new("blocks", " ░▒▓█")?,
            GlyphRamp::new("dots", " ·•●")?,
            GlyphRamp::new("braille", " ⠁⠉⠋⠛⠟⠿⡿⣿")?,
        ];
        let mono = Palette::new("mono", vec![Color::Grey])?;
        Ok(Self {
            palettes,
            ramps,
            mono,
        })
    }

    pub fn palette(&self, index: usize) -> &Palette {
        &self.palettes[index % self.palettes.len()]
    }

    pub fn ramp(&self, index: usize) -> &GlyphRamp {
        &self.ramps[index % self.ramps.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_rejected_at_construction() {
        assert!(GlyphRamp::new("none", "").is_err());
        assert!(Palette::new("none", Vec::new()).is_err());
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(bucket(0.0, 5), 0);
        assert_eq!(bucket(1.0, 5), 4);
        assert_eq!(bucket(0.199, 5), 0);
        assert_eq!(bucket(0.21, 5), 1);
        assert_eq!(bucket(-3.0, 5), 0);
        assert_eq!(bucket(7.0, 5), 4);
        assert_eq!(bucket(f64::NAN, 5), 0);
        assert_eq!(bucket(0.5, 0), 0);
    }

    #[test]
    fn glyph_and_color_use_independent_lengths() {
        let ramp = GlyphRamp::new("t", "abcdefghij").unwrap();
        assert_eq!(to_glyph(0.95, &ramp), 'j');
        assert_eq!(to_glyph(0.0, &ramp), 'a');
        assert_eq!(to_color_index(0.95, 6), 5);
        assert_eq!(to_color_index(0.55, 6), 3);
    }

    #[test]
    fn eight_way_sectors_round_to_nearest() {
        assert_eq!(arrow_glyph(0.0), '→');
        assert_eq!(arrow_glyph(PI / 2.0), '↓');
        assert_eq!(arrow_glyph(PI), '←');
        assert_eq!(arrow_glyph(-PI / 2.0), '↑');
        // 0.1 rad off still snaps back
        assert_eq!(arrow_glyph(PI / 4.0 + 0.1), '↘');
        // just under a full turn wraps to sector 0
        assert_eq!(arrow_glyph(TAU - 0.01), '→');
    }

    #[test]
    fn four_way_lines_are_direction_symmetric() {
        assert_eq!(line_glyph(0.0), '─');
        assert_eq!(line_glyph(PI), '─');
        assert_eq!(line_glyph(PI / 2.0), '│');
        assert_eq!(line_glyph(3.0 * PI / 2.0), '│');
        assert_eq!(line_glyph(PI / 4.0), '╲');
        assert_eq!(line_glyph(3.0 * PI / 4.0), '╱');
    }

    #[test]
    fn builtin_library_shapes() {
        let lib = Library::builtin().unwrap();
        for p in &lib.palettes {
            assert!((5..=8).contains(&p.len()), "{} has {}", p.name, p.len());
        }
        assert!(lib.ramps.iter().all(|r| r.len() >= 2));
        assert_eq!(lib.palette(lib.palettes.len()).name, lib.palettes[0].name);
        assert_eq!(lib.mono.len(), 1);
    }

    #[test]
    fn ramps_are_monotone_in_brightness() {
        let dims = brightness_ramp((200, 100, 50), 4);
        let lum = |c: &Color| match c {
            Color::Rgb { r, g, b } => *r as u32 + *g as u32 + *b as u32,
            _ => 0,
        };
        for w in dims.windows(2) {
            assert!(lum(&w[0]) < lum(&w[1]));
        }
        assert_eq!(hue_ramp(0.0, 60.0, 1).len(), 1);
    }

    #[test]
    fn out_of_range_color_index_clamps() {
        let p = Palette::new("p", vec![Color::Red, Color::Blue]).unwrap();
        assert_eq!(p.color(9), Color::Blue);
    }
}
