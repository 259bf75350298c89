// Quantized frame buffer and delivery to a rendering sink.

use crate::palette::Palette;
use crate::segment::{batch_row_into, expand_segments, Quantized, Segment};
use anyhow::Result;
use crossterm::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<Quantized>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Quantized::new(' ', 0); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Quantized {
        self.cells[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[Quantized] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [Quantized] {
        &mut self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Segments of every row, top to bottom.
    pub fn segment_rows(&self) -> Vec<Vec<Segment>> {
        (0..self.height)
            .map(|y| {
                let mut segs = Vec::new();
                batch_row_into(self.row(y), &mut segs);
                segs
            })
            .collect()
    }
}

/// How the frame reaches the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkStyle {
    /// One write per cell.
    Cells,
    /// Row-wise runs of same-colored text.
    #[default]
    Segments,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellWrite {
    pub x: u16,
    pub y: u16,
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSegment {
    pub text: String,
    pub fg: Color,
}

/// External collaborator that puts pixels, or characters, somewhere.
pub trait RenderSink {
    fn write_cells(&mut self, cells: &[CellWrite]) -> Result<()>;

    /// Segments laid out left to right starting at `(x, y)`.
    fn write_segments(&mut self, x: u16, y: u16, segments: &[StyledSegment]) -> Result<()>;
}

/// Hand `frame` to `sink` at `origin`, resolving palette indices to colors.
/// Returns the number of segments produced.
pub fn deliver<S: RenderSink + ?Sized>(
    frame: &Frame,
    palette: &Palette,
    bg: Color,
    origin: (u16, u16),
    style: SinkStyle,
    sink: &mut S,
) -> Result<usize> {
    let mut segs: Vec<Segment> = Vec::new();
    let mut styled: Vec<StyledSegment> = Vec::new();
    let mut writes: Vec<CellWrite> = Vec::with_capacity(frame.width());
    let mut total = 0;

    for y in 0..frame.height() {
        batch_row_into(frame.row(y), &mut segs);
        total += segs.len();
        let sy = origin.1.saturating_add(y as u16);

        match style {
            SinkStyle::Segments => {
                styled.clear();
                styled.extend(segs.drain(..).map(|s| StyledSegment {
                    fg: palette.color(s.color),
                    text: s.text,
                }));
                sink.write_segments(origin.0, sy, &styled)?;
            }
            SinkStyle::Cells => {
                writes.clear();
                writes.extend(expand_segments(&segs).into_iter().enumerate().map(|(x, q)| {
                    CellWrite {
                        x: origin.0.saturating_add(x as u16),
                        y: sy,
                        glyph: q.glyph,
                        fg: palette.color(q.color),
                        bg,
                    }
                }));
                sink.write_cells(&writes)?;
            }
        }
    }
    Ok(total)
}

/// In-memory sink; keeps the last glyph/color written to every position.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub width: usize,
    pub height: usize,
    pub glyphs: Vec<char>,
    pub colors: Vec<Color>,
    pub cell_writes: usize,
    pub segment_writes: usize,
}

impl RecordingSink {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            glyphs: vec![' '; width * height],
            colors: vec![Color::Reset; width * height],
            cell_writes: 0,
            segment_writes: 0,
        }
    }

    fn put(&mut self, x: usize, y: usize, glyph: char, fg: Color) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = glyph;
            self.colors[y * self.width + x] = fg;
        }
    }

    pub fn row_text(&self, y: usize) -> String {
        self.glyphs[y * self.width..(y + 1) * self.width].iter().collect()
    }
}

impl RenderSink for RecordingSink {
    fn write_cells(&mut self, cells: &[CellWrite]) -> Result<()> {
        for c in cells {
            self.put(c.x as usize, c.y as usize, c.glyph, c.fg);
            self.cell_writes += 1;
        }
        Ok(())
    }

    fn write_segments(&mut self, x: u16, y: u16, segments: &[StyledSegment]) -> Result<()> {
        let mut cx = x as usize;
        for s in segments {
            for g in s.text.chars() {
                self.put(cx, y as usize, g, s.fg);
                cx += 1;
            }
            self.segment_writes += 1;
        }
        Ok(())
    }
}
