// Per-experiment state machine: live parameters, clocks, and the key → command
// table. Every key either has one deterministic effect or does nothing.

use crate::clock::{AnimationClock, GenerationClock, TimerId};
use crate::experiment::{sample_fractal, sample_life, sample_noise, sample_plasma, ExperimentKind, SampleCtx};
use crate::fractal::{View, JULIA_PRESETS};
use crate::frame::Frame;
use crate::life::{Grid, Pattern, RULES};
use crate::noise::NoiseField;
use crate::palette::{Library, Palette};
use crate::params::{CycleKey, FlagKey, ParameterSet, SliderKey};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info};

/// Input keys the core understands, independent of any terminal library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Tab,
    BackTab,
    Esc,
    Backspace,
    Enter,
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    TogglePlay,
    FocusNext,
    FocusPrev,
    Adjust(i32),
    Cycle(CycleKey),
    Toggle(FlagKey),
    Reseed,
    Pan(i32, i32),
    ZoomIn,
    ZoomOut,
    ResetView,
    Randomize,
    Clear,
    StepOnce,
    Leave,
    Quit,
}

/// Key table; `None` means the key is ignored by this experiment.
pub fn keymap(kind: ExperimentKind, key: Key) -> Option<Command> {
    let common = match key {
        Key::Space => Some(Command::TogglePlay),
        Key::Tab => Some(Command::FocusNext),
        Key::BackTab => Some(Command::FocusPrev),
        Key::Left | Key::Char('-') | Key::Char('_') => Some(Command::Adjust(-1)),
        Key::Right | Key::Char('+') | Key::Char('=') => Some(Command::Adjust(1)),
        Key::Char('m') => Some(Command::Cycle(CycleKey::Mode)),
        Key::Char('c') => Some(Command::Cycle(CycleKey::Palette)),
        Key::Char('g') => Some(Command::Cycle(CycleKey::Ramp)),
        Key::Char('o') => Some(Command::Toggle(FlagKey::Color)),
        Key::Char('r') => Some(Command::Reseed),
        Key::Esc | Key::Backspace => Some(Command::Leave),
        Key::Char('q') => Some(Command::Quit),
        _ => None,
    };
    if common.is_some() {
        return common;
    }

    match (kind, key) {
        (ExperimentKind::Fractal, Key::Up | Key::Char('w')) => Some(Command::Pan(0, -1)),
        (ExperimentKind::Fractal, Key::Down | Key::Char('s')) => Some(Command::Pan(0, 1)),
        (ExperimentKind::Fractal, Key::Char('a')) => Some(Command::Pan(-1, 0)),
        (ExperimentKind::Fractal, Key::Char('d')) => Some(Command::Pan(1, 0)),
        (ExperimentKind::Fractal, Key::Char('z')) => Some(Command::ZoomIn),
        (ExperimentKind::Fractal, Key::Char('x')) => Some(Command::ZoomOut),
        (ExperimentKind::Fractal, Key::Char('j')) => Some(Command::Toggle(FlagKey::Julia)),
        (ExperimentKind::Fractal, Key::Char('p')) => Some(Command::Cycle(CycleKey::JuliaPreset)),
        (ExperimentKind::Fractal, Key::Char('0')) => Some(Command::ResetView),

        (ExperimentKind::Life, Key::Char('n')) => Some(Command::Randomize),
        (ExperimentKind::Life, Key::Char('x')) => Some(Command::Clear),
        (ExperimentKind::Life, Key::Char('p')) => Some(Command::Cycle(CycleKey::Pattern)),
        (ExperimentKind::Life, Key::Char('t')) => Some(Command::Toggle(FlagKey::Wrap)),
        (ExperimentKind::Life, Key::Char('u')) => Some(Command::Cycle(CycleKey::Rule)),
        (ExperimentKind::Life, Key::Char('.')) => Some(Command::StepOnce),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Leave,
    Quit,
}

pub struct ExperimentController {
    kind: ExperimentKind,
    params: ParameterSet,
    clock: AnimationClock,
    generations: GenerationClock,
    noise: NoiseField,
    plasma_origin: (f64, f64),
    view: View,
    grid: Grid,
    patterns: Vec<Pattern>,
    rng: StdRng,
}

impl ExperimentController {
    /// `width`/`height` size the automaton grid; other kinds ignore them.
    pub fn new(
        kind: ExperimentKind,
        seed: u64,
        lib: &Library,
        time_step: f64,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        let patterns = Pattern::library()?;
        let params = kind.default_params(seed, lib, patterns.len());
        let grid = Grid::new(width.max(1), height.max(1), params.flag(FlagKey::Wrap))?;

        let mut ctl = Self {
            kind,
            params,
            clock: AnimationClock::new(time_step),
            generations: GenerationClock::default(),
            noise: NoiseField::new(seed),
            plasma_origin: plasma_origin(seed),
            view: View::default(),
            grid,
            patterns,
            rng: StdRng::seed_from_u64(seed),
        };
        if kind == ExperimentKind::Life {
            ctl.randomize();
        }
        info!(experiment = kind.title(), seed, "experiment entered");
        Ok(ctl)
    }

    pub fn kind(&self) -> ExperimentKind {
        self.kind
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn generation(&self) -> u64 {
        self.generations.generation()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn handle_key(&mut self, key: Key) -> Outcome {
        match keymap(self.kind, key) {
            Some(cmd) => self.apply(cmd),
            None => Outcome::Continue,
        }
    }

    pub fn apply(&mut self, cmd: Command) -> Outcome {
        match cmd {
            Command::TogglePlay => self.params.playing = !self.params.playing,
            Command::FocusNext => self.params.focus_next(),
            Command::FocusPrev => self.params.focus_prev(),
            Command::Adjust(steps) => {
                self.params.nudge_focused(steps);
                if let Some(s) = self.params.focused() {
                    debug!(slider = s.key.label(), value = s.value(), "slider adjusted");
                }
            }
            Command::Cycle(key) => {
                self.params.advance(key);
                self.after_cycle(key);
            }
            Command::Toggle(key) => {
                self.params.toggle(key);
                self.after_toggle(key);
            }
            Command::Reseed => {
                let seed: u64 = self.rng.gen();
                self.reseed(seed);
            }
            Command::Pan(dx, dy) => self.view.pan(dx, dy),
            Command::ZoomIn => self.view.zoom_in(),
            Command::ZoomOut => self.view.zoom_out(),
            Command::ResetView => self.reset_view(),
            Command::Randomize => self.randomize(),
            Command::Clear => {
                self.grid.clear();
                self.generations.reset();
            }
            Command::StepOnce => {
                if !self.params.playing {
                    self.generations.step_once(&mut self.grid);
                }
            }
            Command::Leave => return Outcome::Leave,
            Command::Quit => return Outcome::Quit,
        }
        Outcome::Continue
    }

    fn after_cycle(&mut self, key: CycleKey) {
        let index = self.params.cycle(key);
        match key {
            CycleKey::Pattern => {
                if let Some(p) = self.patterns.get(index) {
                    self.grid.place_centered(p);
                    debug!(pattern = p.name, "pattern stamped");
                }
            }
            CycleKey::Rule => {
                self.grid.rule = RULES[index % RULES.len()];
                debug!(rule = self.grid.rule.name, "rule changed");
            }
            CycleKey::JuliaPreset => {
                let (_, (re, im)) = JULIA_PRESETS[index % JULIA_PRESETS.len()];
                self.params.set(SliderKey::JuliaRe, re);
                self.params.set(SliderKey::JuliaIm, im);
            }
            CycleKey::Mode | CycleKey::Palette | CycleKey::Ramp => {
                debug!(?key, index, "cycled");
            }
        }
    }

    fn after_toggle(&mut self, key: FlagKey) {
        match key {
            FlagKey::Wrap => self.grid.wrap = self.params.flag(FlagKey::Wrap),
            FlagKey::Julia => self.reset_view(),
            FlagKey::Color => {}
        }
    }

    fn reset_view(&mut self) {
        self.view = if self.params.flag(FlagKey::Julia) {
            View::julia_default()
        } else {
            View::default()
        };
    }

    fn randomize(&mut self) {
        let density = self.params.get(SliderKey::Density) / 100.0;
        self.grid.randomize(density, &mut self.rng);
        self.generations.reset();
    }

    /// New seed; simulated time and generation restart at zero.
    pub fn reseed(&mut self, seed: u64) {
        self.params.seed = seed;
        self.noise.reseed(seed);
        self.plasma_origin = plasma_origin(seed);
        self.rng = StdRng::seed_from_u64(seed);
        self.clock.reset();
        self.generations.reset();
        if self.kind == ExperimentKind::Life {
            self.randomize();
        }
        info!(seed, "reseeded");
    }

    /// Timers this experiment needs besides rendering.
    pub fn timers(&self, frame_interval: Duration) -> Vec<(TimerId, Duration)> {
        match self.kind {
            ExperimentKind::Life => vec![(TimerId::Generation, self.generation_interval())],
            _ => vec![(TimerId::Advance, frame_interval)],
        }
    }

    pub fn generation_interval(&self) -> Duration {
        Duration::from_millis(self.params.get(SliderKey::TickMs).round().max(1.0) as u64)
    }

    pub fn on_tick(&mut self, id: TimerId) -> bool {
        match id {
            TimerId::Advance => {
                let speed = self.params.get(SliderKey::Speed);
                self.clock.tick(self.params.playing, speed)
            }
            TimerId::Generation => self.generations.tick(self.params.playing, &mut self.grid),
            TimerId::Render => false,
        }
    }

    /// Full re-computation at the new size; the automaton restarts.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let (width, height) = (width.max(1), height.max(1));
        if self.kind == ExperimentKind::Life && (width, height) != (self.grid.width(), self.grid.height()) {
            let mut grid = Grid::new(width, height, self.params.flag(FlagKey::Wrap))?;
            grid.rule = self.grid.rule;
            self.grid = grid;
            self.randomize();
            info!(width, height, "grid rebuilt");
        }
        Ok(())
    }

    /// Sample one frame from a snapshot of the current parameters.
    pub fn render(&self, frame: &mut Frame, lib: &Library, cell_aspect: f64) {
        let snapshot = self.params.clone();
        let ctx = SampleCtx {
            params: &snapshot,
            lib,
            time: self.clock.time(),
            cell_aspect,
        };
        match self.kind {
            ExperimentKind::Noise => sample_noise(&self.noise, &ctx, frame),
            ExperimentKind::Plasma => sample_plasma(self.plasma_origin, &ctx, frame),
            ExperimentKind::Fractal => sample_fractal(&self.view, &ctx, frame),
            ExperimentKind::Life => sample_life(&self.grid, &ctx, frame),
        }
    }

    pub fn active_palette<'a>(&self, lib: &'a Library) -> &'a Palette {
        if self.params.flag(FlagKey::Color) {
            lib.palette(self.params.cycle(CycleKey::Palette))
        } else {
            &lib.mono
        }
    }

    pub fn status_line(&self, lib: &Library) -> String {
        let p = &self.params;
        let mut s = format!(
            " {} [{}] {} | ",
            self.kind.title(),
            if p.playing { "run" } else { "pause" },
            self.kind.modes()[p.cycle(CycleKey::Mode) % self.kind.modes().len()],
        );
        let focus = p.focused().map(|f| f.key);
        for sl in p.sliders() {
            let mark = if Some(sl.key) == focus { ">" } else { "" };
            s.push_str(&format!("{mark}{} {} ", sl.key.label(), fmt_value(sl.value())));
        }
        s.push_str(&format!(
            "| {} {} ",
            self.active_palette(lib).name,
            lib.ramp(p.cycle(CycleKey::Ramp)).name
        ));
        match self.kind {
            ExperimentKind::Life => s.push_str(&format!(
                "| gen {} live {} {} {}",
                self.generations.generation(),
                self.grid.count_live(),
                self.grid.rule.name,
                if self.grid.wrap { "wrap" } else { "walls" },
            )),
            ExperimentKind::Fractal => s.push_str(&format!(
                "| {} zoom {:.2}",
                if p.flag(FlagKey::Julia) { "julia" } else { "mandelbrot" },
                self.view.zoom
            )),
            _ => s.push_str(&format!("| t {:.2} seed {}", self.clock.time(), p.seed)),
        }
        s
    }
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

// Plasma is periodic-free but symmetric around its ring centres; the seed
// picks which window of the plane is shown.
fn plasma_origin(seed: u64) -> (f64, f64) {
    let mut rng = StdRng::seed_from_u64(seed);
    (rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> Library {
        Library::builtin().unwrap()
    }

    fn ctl(kind: ExperimentKind) -> ExperimentController {
        ExperimentController::new(kind, 7, &lib(), 0.1, 20, 10).unwrap()
    }

    #[test]
    fn unknown_keys_are_noops() {
        let mut c = ctl(ExperimentKind::Noise);
        let before = c.params().clone();
        assert_eq!(c.handle_key(Key::Char('k')), Outcome::Continue);
        assert_eq!(c.handle_key(Key::Char('z')), Outcome::Continue);
        assert_eq!(c.params(), &before);
    }

    #[test]
    fn shared_keys_differ_by_experiment() {
        assert_eq!(keymap(ExperimentKind::Fractal, Key::Char('x')), Some(Command::ZoomOut));
        assert_eq!(keymap(ExperimentKind::Life, Key::Char('x')), Some(Command::Clear));
        assert_eq!(keymap(ExperimentKind::Plasma, Key::Char('x')), None);
        assert_eq!(keymap(ExperimentKind::Plasma, Key::Esc), Some(Command::Leave));
        assert_eq!(keymap(ExperimentKind::Life, Key::Char('q')), Some(Command::Quit));
    }

    #[test]
    fn play_pause_freezes_time() {
        let mut c = ctl(ExperimentKind::Plasma);
        c.on_tick(TimerId::Advance);
        let t = c.time();
        assert!(t > 0.0);
        c.handle_key(Key::Space);
        c.on_tick(TimerId::Advance);
        assert_eq!(c.time(), t);
    }

    #[test]
    fn adjust_is_clamped_and_held_keys_are_safe() {
        let mut c = ctl(ExperimentKind::Noise);
        for _ in 0..100 {
            c.handle_key(Key::Right);
        }
        assert_eq!(c.params().get(SliderKey::Scale), 20.0);
        c.handle_key(Key::Tab);
        for _ in 0..100 {
            c.handle_key(Key::Left);
        }
        assert_eq!(c.params().get(SliderKey::Speed), 10.0);
    }

    #[test]
    fn reseed_resets_time_and_generation() {
        let mut c = ctl(ExperimentKind::Life);
        c.on_tick(TimerId::Generation);
        c.on_tick(TimerId::Generation);
        assert_eq!(c.generation(), 2);
        c.reseed(99);
        assert_eq!(c.generation(), 0);
        assert_eq!(c.params().seed, 99);

        let mut n = ctl(ExperimentKind::Noise);
        n.on_tick(TimerId::Advance);
        n.handle_key(Key::Char('r'));
        assert_eq!(n.time(), 0.0);
    }

    #[test]
    fn step_once_only_while_paused() {
        let mut c = ctl(ExperimentKind::Life);
        c.handle_key(Key::Char('.'));
        assert_eq!(c.generation(), 0);
        c.handle_key(Key::Space);
        c.handle_key(Key::Char('.'));
        assert_eq!(c.generation(), 1);
    }

    #[test]
    fn life_commands_reach_the_grid() {
        let mut c = ctl(ExperimentKind::Life);
        c.handle_key(Key::Char('x'));
        assert_eq!(c.grid().count_live(), 0);
        // first press moves from index 0 to the block
        c.handle_key(Key::Char('p'));
        assert_eq!(c.grid().count_live(), 4);
        c.handle_key(Key::Char('t'));
        assert!(!c.grid().wrap);
        c.handle_key(Key::Char('u'));
        assert_eq!(c.grid().rule, RULES[1]);
    }

    #[test]
    fn fractal_view_and_presets() {
        let mut c = ctl(ExperimentKind::Fractal);
        c.handle_key(Key::Char('z'));
        assert!((c.view().zoom - 1.5).abs() < 1e-12);
        for _ in 0..20 {
            c.handle_key(Key::Char('x'));
        }
        assert!((c.view().zoom - 0.1).abs() < 1e-12);
        c.handle_key(Key::Char('0'));
        assert_eq!(c.view(), &View::default());

        c.handle_key(Key::Char('p'));
        let (_, (re, im)) = JULIA_PRESETS[1];
        assert!((c.params().get(SliderKey::JuliaRe) - re).abs() < 1e-12);
        assert!((c.params().get(SliderKey::JuliaIm) - im).abs() < 1e-12);

        c.handle_key(Key::Char('j'));
        assert!(c.params().flag(FlagKey::Julia));
        assert_eq!(c.view(), &View::julia_default());
    }

    #[test]
    fn generation_timer_follows_tick_slider() {
        let mut c = ctl(ExperimentKind::Life);
        let frame = Duration::from_millis(16);
        assert_eq!(c.timers(frame), vec![(TimerId::Generation, Duration::from_millis(100))]);
        c.handle_key(Key::Right);
        assert_eq!(c.generation_interval(), Duration::from_millis(125));
        assert_eq!(ctl(ExperimentKind::Plasma).timers(frame), vec![(TimerId::Advance, frame)]);
    }

    #[test]
    fn render_reads_a_snapshot_of_params() {
        let lib = lib();
        let c = ctl(ExperimentKind::Plasma);
        let mut a = Frame::new(20, 6);
        let mut b = Frame::new(20, 6);
        c.render(&mut a, &lib, 2.0);
        c.render(&mut b, &lib, 2.0);
        assert_eq!(a, b);
        assert!(c.status_line(&lib).contains("Plasma"));
    }

    #[test]
    fn resize_rebuilds_grid() {
        let mut c = ctl(ExperimentKind::Life);
        c.resize(30, 12).unwrap();
        assert_eq!((c.grid().width(), c.grid().height()), (30, 12));
    }
}
