use crate::clock::{Scheduler, TimerId};
use crate::config::Settings;
use crate::controller::{Command, ExperimentController, Key, Outcome};
use crate::experiment::ExperimentKind;
use crate::frame::{deliver, Frame};
use crate::input::{collect_input, InputEvent};
use crate::palette::Library;
use crate::params::FlagKey;
use crate::render::{draw_text, Terminal, BG, FG};
use anyhow::{Context, Result};
use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info};

// The field starts below the status row.
const HUD_ROWS: u16 = 1;
const FPS_WINDOW: Duration = Duration::from_millis(500);

enum Scene {
    Menu { cursor: usize },
    Running(Box<ExperimentController>),
}

pub struct App {
    settings: Settings,
    lib: Library,
    term: Terminal,
    sched: Scheduler,
    frame: Frame,
    scene: Scene,
    rng: StdRng,
    frame_dt: Duration,
    should_quit: bool,
    frames: u32,
    fps_timer: Instant,
    fps: f32,
}

impl App {
    fn init(settings: Settings) -> Result<Self> {
        let lib = Library::builtin().context("building palettes")?;
        let rng = match settings.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let frame_dt = Duration::from_secs_f64(1.0 / settings.fps as f64);
        let term = Terminal::begin().context("entering alternate screen")?;

        let mut sched = Scheduler::new();
        sched.every(TimerId::Render, frame_dt, Instant::now());

        Ok(Self {
            settings,
            lib,
            term,
            sched,
            frame: Frame::new(0, 0),
            scene: Scene::Menu { cursor: 0 },
            rng,
            frame_dt,
            should_quit: false,
            frames: 0,
            fps_timer: Instant::now(),
            fps: 0.0,
        })
    }

    fn field_size(&self) -> (usize, usize) {
        (
            self.term.cols as usize,
            self.term.rows.saturating_sub(HUD_ROWS) as usize,
        )
    }

    fn enter(&mut self, kind: ExperimentKind) -> Result<()> {
        // The first entry honours a configured seed; later ones draw from it.
        let seed = match self.settings.seed.take() {
            Some(s) => s,
            None => self.rng.gen(),
        };
        let (w, h) = self.field_size();
        let mut ctl = ExperimentController::new(
            kind,
            seed,
            &self.lib,
            self.settings.base_time_step,
            w,
            h,
        )?;
        if !self.settings.color {
            ctl.apply(Command::Toggle(FlagKey::Color));
        }

        let now = Instant::now();
        self.sched.cancel_all();
        self.sched.every(TimerId::Render, self.frame_dt, now);
        for (id, interval) in ctl.timers(self.frame_dt) {
            self.sched.every(id, interval, now);
        }
        self.scene = Scene::Running(Box::new(ctl));
        Ok(())
    }

    fn leave(&mut self) {
        if let Scene::Running(ctl) = &self.scene {
            info!(experiment = ctl.kind().title(), "experiment left");
            let cursor = ExperimentKind::ALL
                .iter()
                .position(|k| *k == ctl.kind())
                .unwrap_or(0);
            self.sched.cancel_all();
            self.sched.every(TimerId::Render, self.frame_dt, Instant::now());
            self.scene = Scene::Menu { cursor };
        }
    }

    fn handle_key(&mut self, key: Key) -> Result<()> {
        match &mut self.scene {
            Scene::Menu { cursor } => {
                let n = ExperimentKind::ALL.len();
                match key {
                    Key::Up | Key::Char('k') => *cursor = (*cursor + n - 1) % n,
                    Key::Down | Key::Char('j') => *cursor = (*cursor + 1) % n,
                    Key::Enter | Key::Space => {
                        let kind = ExperimentKind::ALL[*cursor];
                        self.enter(kind)?;
                    }
                    Key::Char(c @ '1'..='4') => {
                        let kind = ExperimentKind::ALL[(c as u8 - b'1') as usize];
                        self.enter(kind)?;
                    }
                    Key::Char('q') | Key::Esc => self.should_quit = true,
                    _ => {}
                }
            }
            Scene::Running(ctl) => match ctl.handle_key(key) {
                Outcome::Continue => {}
                Outcome::Leave => self.leave(),
                Outcome::Quit => self.should_quit = true,
            },
        }
        Ok(())
    }

    fn on_resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        self.term.resize(cols, rows);
        let (w, h) = self.field_size();
        self.frame.resize(w, h);
        if let Scene::Running(ctl) = &mut self.scene {
            ctl.resize(w, h)?;
        }
        info!(cols, rows, "terminal resized");
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        while !self.should_quit {
            let now = Instant::now();
            let timeout = self.sched.until_next(now).unwrap_or(self.frame_dt);

            // Input lands before the next frame's parameter snapshot.
            for ev in collect_input(timeout)? {
                match ev {
                    InputEvent::Interrupt => self.should_quit = true,
                    InputEvent::Resize(c, r) => self.on_resize(c, r)?,
                    InputEvent::Key(k) => self.handle_key(k)?,
                }
                if self.should_quit {
                    break;
                }
            }
            if self.should_quit {
                break;
            }
            if self.term.resize_if_needed()? {
                let (c, r) = (self.term.cols, self.term.rows);
                self.on_resize(c, r)?;
            }

            let now = Instant::now();
            let mut redraw = false;
            for id in self.sched.due(now) {
                match (&mut self.scene, id) {
                    (_, TimerId::Render) => redraw = true,
                    (Scene::Running(ctl), id) => {
                        ctl.on_tick(id);
                    }
                    (Scene::Menu { .. }, _) => {}
                }
            }
            if let Scene::Running(ctl) = &self.scene {
                if ctl.kind() == ExperimentKind::Life {
                    self.sched.retime(TimerId::Generation, ctl.generation_interval(), now);
                }
            }

            if redraw {
                self.render_frame()?;
            }
        }

        self.sched.cancel_all();
        self.term.end()?;
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        self.term.begin_frame()?;
        let (w, h) = self.field_size();

        match &self.scene {
            Scene::Menu { cursor } => draw_menu(&mut self.term, *cursor),
            Scene::Running(ctl) => {
                self.frame.resize(w, h);
                ctl.render(&mut self.frame, &self.lib, self.settings.cell_aspect);
                let palette = ctl.active_palette(&self.lib);
                deliver(
                    &self.frame,
                    palette,
                    BG,
                    (0, HUD_ROWS),
                    self.settings.sink,
                    &mut self.term,
                )?;

                let mut hud = format!("{} | {:>5.1} fps", ctl.status_line(&self.lib), self.fps);
                let cols = self.term.cols as usize;
                let len = hud.chars().count();
                if len < cols {
                    hud.push_str(&" ".repeat(cols - len));
                }
                draw_text(&mut self.term.cur, 0, 0, &hud, Color::Black, false);
                for x in 0..self.term.cols {
                    let i = self.term.cur.idx(x, 0);
                    if let Some(c) = self.term.cur.cells.get_mut(i) {
                        c.bg = Color::Grey;
                    }
                }
            }
        }

        self.term.present()?;

        self.frames += 1;
        let elapsed = self.fps_timer.elapsed();
        if elapsed >= FPS_WINDOW {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.fps_timer = Instant::now();
        }
        Ok(())
    }
}

fn draw_menu(term: &mut Terminal, cursor: usize) {
    let x = 2;
    draw_text(&mut term.cur, x, 1, "termfield", Color::Cyan, true);
    draw_text(&mut term.cur, x, 2, "generative fields for the terminal", FG, false);

    for (i, kind) in ExperimentKind::ALL.iter().enumerate() {
        let y = 4 + 2 * i as u16;
        let selected = i == cursor;
        let marker = if selected { '>' } else { ' ' };
        let line = format!("{marker} {}  {}", i + 1, kind.title());
        let fg = if selected { Color::Yellow } else { FG };
        draw_text(&mut term.cur, x, y, &line, fg, selected);
        draw_text(&mut term.cur, x + 6, y + 1, kind.blurb(), Color::DarkGrey, false);
    }

    let help_y = term.rows.saturating_sub(2);
    draw_text(
        &mut term.cur,
        x,
        help_y,
        "up/down select | enter start | 1-4 jump | q quit",
        Color::DarkGrey,
        false,
    );
    draw_text(
        &mut term.cur,
        x,
        help_y + 1,
        "in a field: space pause | tab/shift-tab focus | left/right adjust | m mode | c palette | g glyphs | o color | r reseed | esc back",
        Color::DarkGrey,
        false,
    );
}

/// Enter the terminal, run until quit, and restore it on every exit path.
pub fn run(settings: Settings, start: Option<ExperimentKind>) -> Result<()> {
    let mut app = App::init(settings)?;
    info!(fps = app.settings.fps, sink = ?app.settings.sink, "started");
    if let Some(kind) = start {
        app.enter(kind)?;
    }
    let result = app.run();
    debug!(ok = result.is_ok(), "loop finished");
    result
}
