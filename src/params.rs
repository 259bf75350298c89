// Per-experiment parameter state: bounded sliders, cyclic choices, flags.
//
// Out-of-range writes clamp to the nearest bound; nothing here fails.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliderKey {
    Scale,
    Speed,
    MaxIter,
    JuliaRe,
    JuliaIm,
    TickMs,
    Density,
}

impl SliderKey {
    pub fn label(self) -> &'static str {
        match self {
            SliderKey::Scale => "scale",
            SliderKey::Speed => "speed%",
            SliderKey::MaxIter => "iter",
            SliderKey::JuliaRe => "c.re",
            SliderKey::JuliaIm => "c.im",
            SliderKey::TickMs => "tick ms",
            SliderKey::Density => "density%",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slider {
    pub key: SliderKey,
    value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Slider {
    pub fn new(key: SliderKey, value: f64, min: f64, max: f64, step: f64) -> Self {
        let mut s = Self {
            key,
            value: min,
            min,
            max,
            step,
        };
        s.set(value);
        s
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set(&mut self, v: f64) {
        self.value = if v.is_nan() { self.min } else { v.clamp(self.min, self.max) };
    }

    /// Move by whole steps, clamped (never wraps).
    pub fn nudge(&mut self, steps: i32) {
        let v = self.value + self.step * steps as f64;
        // Snap away float drift like 0.30000000000000004.
        let on_grid = (v / self.step).round() * self.step;
        let snapped = (on_grid * 1e9).round() / 1e9;
        self.set(if (snapped - v).abs() < 1e-6 { snapped } else { v });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CycleKey {
    Mode,
    Palette,
    Ramp,
    Pattern,
    Rule,
    JuliaPreset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cycle {
    pub key: CycleKey,
    index: usize,
    len: usize,
}

impl Cycle {
    pub fn new(key: CycleKey, len: usize) -> Self {
        Self {
            key,
            index: 0,
            len: len.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.len;
    }

    pub fn set(&mut self, index: usize) {
        self.index = index % self.len;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagKey {
    Color,
    Wrap,
    Julia,
}

/// Live parameters of one experiment. Cloned into a snapshot at the start of
/// every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSet {
    sliders: Vec<Slider>,
    cycles: Vec<Cycle>,
    flags: Vec<(FlagKey, bool)>,
    focus: usize,
    pub seed: u64,
    pub playing: bool,
}

impl ParameterSet {
    pub fn new(seed: u64) -> Self {
        Self {
            sliders: Vec::new(),
            cycles: Vec::new(),
            flags: Vec::new(),
            focus: 0,
            seed,
            playing: true,
        }
    }

    pub fn with_slider(mut self, slider: Slider) -> Self {
        self.sliders.push(slider);
        self
    }

    pub fn with_cycle(mut self, key: CycleKey, len: usize) -> Self {
        self.cycles.push(Cycle::new(key, len));
        self
    }

    pub fn with_flag(mut self, key: FlagKey, on: bool) -> Self {
        self.flags.push((key, on));
        self
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    pub fn slider(&self, key: SliderKey) -> Option<&Slider> {
        self.sliders.iter().find(|s| s.key == key)
    }

    /// Current value, or 0.0 when this set has no such slider.
    pub fn get(&self, key: SliderKey) -> f64 {
        self.slider(key).map(Slider::value).unwrap_or_default()
    }

    pub fn set(&mut self, key: SliderKey, value: f64) {
        if let Some(s) = self.sliders.iter_mut().find(|s| s.key == key) {
            s.set(value);
        }
    }

    pub fn focused(&self) -> Option<&Slider> {
        self.sliders.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.sliders.is_empty() {
            self.focus = (self.focus + 1) % self.sliders.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.sliders.is_empty() {
            self.focus = (self.focus + self.sliders.len() - 1) % self.sliders.len();
        }
    }

    pub fn nudge_focused(&mut self, steps: i32) {
        if let Some(s) = self.sliders.get_mut(self.focus) {
            s.nudge(steps);
        }
    }

    pub fn cycle(&self, key: CycleKey) -> usize {
        self.cycles
            .iter()
            .find(|c| c.key == key)
            .map(Cycle::index)
            .unwrap_or(0)
    }

    pub fn has_cycle(&self, key: CycleKey) -> bool {
        self.cycles.iter().any(|c| c.key == key)
    }

    pub fn advance(&mut self, key: CycleKey) {
        if let Some(c) = self.cycles.iter_mut().find(|c| c.key == key) {
            c.advance();
        }
    }

    pub fn set_cycle(&mut self, key: CycleKey, index: usize) {
        if let Some(c) = self.cycles.iter_mut().find(|c| c.key == key) {
            c.set(index);
        }
    }

    pub fn flag(&self, key: FlagKey) -> bool {
        self.flags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, on)| *on)
            .unwrap_or(false)
    }

    pub fn has_flag(&self, key: FlagKey) -> bool {
        self.flags.iter().any(|(k, _)| *k == key)
    }

    pub fn toggle(&mut self, key: FlagKey) {
        if let Some((_, on)) = self.flags.iter_mut().find(|(k, _)| *k == key) {
            *on = !*on;
        }
    }

    pub fn set_flag(&mut self, key: FlagKey, value: bool) {
        if let Some((_, on)) = self.flags.iter_mut().find(|(k, _)| *k == key) {
            *on = value;
        }
    }
}
