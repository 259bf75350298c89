//! Animated generative fields for character grids: simplex noise, plasma,
//! escape-time fractals and cellular automata, quantized to glyphs and
//! palette indices and batched into same-color runs.

pub mod app;
pub mod clock;
pub mod config;
pub mod controller;
pub mod experiment;
pub mod fractal;
pub mod frame;
pub mod input;
pub mod life;
pub mod noise;
pub mod palette;
pub mod params;
pub mod plasma;
pub mod render;
pub mod segment;
