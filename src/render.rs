use crate::frame::{CellWrite, RenderSink, StyledSegment};
use anyhow::Result;
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

pub const BG: Color = Color::Black;
pub const FG: Color = Color::White;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: FG,
            bg: BG,
            bold: false,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell { bg, ..Cell::default() });
    }
}

/// Write `s` from `(x, y)`, truncated at the right edge.
pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bold: bool) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg: BG, bold });
    }
}

/// Alternate-screen terminal. Cell writes land in a back buffer and reach the
/// screen as a diff on `present`; segment writes are printed immediately.
pub struct Terminal {
    out: io::Stdout,
    pub cols: u16,
    pub rows: u16,
    prev: CellBuffer,
    pub cur: CellBuffer,
    active: bool,
    full_redraw: bool,
}

impl Terminal {
    pub fn begin() -> Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            active: true,
            full_redraw: true,
        })
    }

    /// Restore the terminal. Safe to call more than once.
    pub fn end(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            EndSynchronizedUpdate,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        if cols == self.cols && rows == self.rows {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.prev = CellBuffer::new(cols, rows);
        self.cur = CellBuffer::new(cols, rows);
        self.full_redraw = true;
    }

    pub fn resize_if_needed(&mut self) -> Result<bool> {
        let (c, r) = terminal::size()?;
        let changed = c != self.cols || r != self.rows;
        self.resize(c, r);
        Ok(changed)
    }

    pub fn begin_frame(&mut self) -> Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, SetBackgroundColor(BG), Clear(ClearType::All))?;
            self.prev.clear(BG);
        }
        self.cur.clear(BG);
        Ok(())
    }

    pub fn present(&mut self) -> Result<()> {
        let diff_only = !self.full_redraw;
        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if c.bold != last_bold {
                    let attr = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}

impl RenderSink for Terminal {
    fn write_cells(&mut self, cells: &[CellWrite]) -> Result<()> {
        for c in cells {
            self.cur.set(
                c.x,
                c.y,
                Cell {
                    ch: c.glyph,
                    fg: c.fg,
                    bg: c.bg,
                    bold: false,
                },
            );
        }
        Ok(())
    }

    fn write_segments(&mut self, x: u16, y: u16, segments: &[StyledSegment]) -> Result<()> {
        if y >= self.rows {
            return Ok(());
        }
        queue!(self.out, cursor::MoveTo(x, y), SetBackgroundColor(BG))?;
        let mut cx = x;
        for s in segments {
            if cx >= self.cols {
                break;
            }
            queue!(self.out, SetForegroundColor(s.fg), Print(&s.text))?;
            // Mirror into both buffers so the diff pass leaves these cells alone.
            for ch in s.text.chars() {
                let c = Cell {
                    ch,
                    fg: s.fg,
                    bg: BG,
                    bold: false,
                };
                self.cur.set(cx, y, c);
                self.prev.set(cx, y, c);
                cx = cx.saturating_add(1);
            }
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_text_truncates_at_edge() {
        let mut b = CellBuffer::new(4, 2);
        draw_text(&mut b, 2, 1, "hello", Color::Red, true);
        assert_eq!(b.cells[b.idx(2, 1)].ch, 'h');
        assert_eq!(b.cells[b.idx(3, 1)].ch, 'e');
        assert!(b.cells[b.idx(3, 1)].bold);
        assert_eq!(b.cells[b.idx(0, 1)], Cell::default());
    }

    #[test]
    fn clear_resets_every_cell() {
        let mut b = CellBuffer::new(3, 3);
        b.set(1, 1, Cell { ch: 'x', ..Cell::default() });
        b.set(9, 9, Cell { ch: 'y', ..Cell::default() });
        b.clear(Color::Blue);
        assert!(b.cells.iter().all(|c| c.ch == ' ' && c.bg == Color::Blue));
    }
}
