use crate::experiment::ExperimentKind;
use crate::frame::SinkStyle;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const FPS_RANGE: (u32, u32) = (10, 240);
pub const ASPECT_RANGE: (f64, f64) = (0.5, 4.0);

/// Animated generative fields in the terminal.
#[derive(Parser, Debug, Default)]
#[command(name = "termfield", version)]
pub struct Args {
    /// start directly in one experiment instead of the menu
    #[arg(long, value_enum)]
    pub experiment: Option<ExperimentKind>,

    /// seed for noise tables, plasma window and automaton fill
    #[arg(long)]
    pub seed: Option<u64>,

    /// frames per second (10..=240)
    #[arg(long)]
    pub fps: Option<u32>,

    /// character cell height over width
    #[arg(long)]
    pub cell_aspect: Option<f64>,

    /// how frames reach the terminal
    #[arg(long, value_enum)]
    pub sink: Option<SinkStyle>,

    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// write tracing output to this file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// start with color off
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps: u32,
    pub cell_aspect: f64,
    pub sink: SinkStyle,
    pub seed: Option<u64>,
    pub color: bool,
    /// Simulated seconds per tick at 100% speed.
    pub base_time_step: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: 60,
            cell_aspect: 2.0,
            sink: SinkStyle::default(),
            seed: None,
            color: true,
            base_time_step: 1.0 / 60.0,
        }
    }
}

impl Settings {
    /// CLI flags win over the file.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps = fps;
        }
        if let Some(a) = args.cell_aspect {
            self.cell_aspect = a;
        }
        if let Some(s) = args.sink {
            self.sink = s;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if args.no_color {
            self.color = false;
        }
        self.clamped()
    }

    pub fn clamped(mut self) -> Self {
        self.fps = self.fps.clamp(FPS_RANGE.0, FPS_RANGE.1);
        self.cell_aspect = if self.cell_aspect.is_finite() {
            self.cell_aspect.clamp(ASPECT_RANGE.0, ASPECT_RANGE.1)
        } else {
            Settings::default().cell_aspect
        };
        if !(self.base_time_step.is_finite() && self.base_time_step > 0.0) {
            self.base_time_step = Settings::default().base_time_step;
        }
        self
    }
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v.clamped();
        }
    }
    Settings::default()
}

pub fn resolve(args: &Args) -> Settings {
    let base = match &args.config {
        Some(p) => load_settings(p),
        None => Settings::default(),
    };
    base.merge_args(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, body: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("termfield-{}-{name}", std::process::id()));
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = load_settings(Path::new("/definitely/not/here.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let p = temp_file("bad.json", "{ fps: nope");
        assert_eq!(load_settings(&p), Settings::default());
        let _ = fs::remove_file(p);
    }

    #[test]
    fn partial_file_fills_and_clamps() {
        let p = temp_file("partial.json", r#"{ "fps": 1000, "sink": "cells" }"#);
        let s = load_settings(&p);
        assert_eq!(s.fps, 240);
        assert_eq!(s.sink, SinkStyle::Cells);
        assert_eq!(s.cell_aspect, 2.0);
        let _ = fs::remove_file(p);
    }

    #[test]
    fn args_override_file() {
        let args = Args::parse_from([
            "termfield",
            "--fps",
            "5",
            "--cell-aspect",
            "9",
            "--seed",
            "42",
            "--no-color",
            "--experiment",
            "life",
        ]);
        let s = resolve(&args);
        assert_eq!(s.fps, 10);
        assert_eq!(s.cell_aspect, 4.0);
        assert_eq!(s.seed, Some(42));
        assert!(!s.color);
        assert_eq!(args.experiment, Some(ExperimentKind::Life));
    }
}
