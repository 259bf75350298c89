use anyhow::{ensure, Result};
use rand::Rng;

/// Birth/survival rule as neighbor-count bitmasks (bit n = count n).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    birth: u16,
    survive: u16,
}

impl Rule {
    pub const fn new(name: &'static str, birth: &[u8], survive: &[u8]) -> Self {
        Self {
            name,
            birth: mask(birth),
            survive: mask(survive),
        }
    }

    #[inline]
    pub fn next(&self, alive: bool, neighbors: u8) -> bool {
        let bit = 1u16 << neighbors;
        if alive {
            self.survive & bit != 0
        } else {
            self.birth & bit != 0
        }
    }
}

const fn mask(counts: &[u8]) -> u16 {
    let mut m = 0u16;
    let mut i = 0;
    while i < counts.len() {
        m |= 1 << counts[i];
        i += 1;
    }
    m
}

pub const CONWAY: Rule = Rule::new("conway B3/S23", &[3], &[2, 3]);

pub const RULES: [Rule; 4] = [
    CONWAY,
    Rule::new("highlife B36/S23", &[3, 6], &[2, 3]),
    Rule::new("day&night B3678/S34678", &[3, 6, 7, 8], &[3, 4, 6, 7, 8]),
    Rule::new("seeds B2/S", &[2], &[]),
];

impl Default for Rule {
    fn default() -> Self {
        CONWAY
    }
}

/// Small boolean stamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub width: usize,
    pub height: usize,
    cells: Vec<bool>,
}

impl Pattern {
    /// Rows of `O` (alive) and `.` (dead). Short rows are padded dead.
    pub fn parse(name: &'static str, rows: &[&str]) -> Result<Self> {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        ensure!(width > 0 && height > 0, "pattern `{name}` is empty");

        let mut cells = vec![false; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                cells[y * width + x] = matches!(ch, 'O' | 'o' | '#' | '*');
            }
        }
        Ok(Self {
            name,
            width,
            height,
            cells,
        })
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn library() -> Result<Vec<Pattern>> {
        Ok(vec![
            Pattern::parse("glider", &[".O.", "..O", "OOO"])?,
            Pattern::parse("block", &["OO", "OO"])?,
            Pattern::parse("blinker", &["OOO"])?,
            Pattern::parse("lwss", &[".O..O", "O....", "O...O", "OOOO."])?,
            Pattern::parse(
                "pulsar",
                &[
                    "..OOO...OOO..",
                    ".............",
                    "O....O.O....O",
                    "O....O.O....O",
                    "O....O.O....O",
                    "..OOO...OOO..",
                    ".............",
                    "..OOO...OOO..",
                    "O....O.O....O",
                    "O....O.O....O",
                    "O....O.O....O",
                    ".............",
                    "..OOO...OOO..",
                ],
            )?,
            Pattern::parse("r-pentomino", &[".OO", "OO.", ".O."])?,
            Pattern::parse("acorn", &[".O.....", "...O...", "OO..OOO"])?,
            Pattern::parse(
                "glider gun",
                &[
                    "........................O...........",
                    "......................O.O...........",
                    "............OO......OO............OO",
                    "...........O...O....OO............OO",
                    "OO........O.....O...OO..............",
                    "OO........O...O.OO....O.O...........",
                    "..........O.....O.......O...........",
                    "...........O...O....................",
                    "............OO......................",
                ],
            )?,
        ])
    }
}

/// Fixed-size row-major grid of live/dead cells.
#[derive(Clone, Debug)]
pub struct Grid {
    w: usize,
    h: usize,
    cells: Vec<bool>,
    scratch: Vec<bool>,
    pub wrap: bool,
    pub rule: Rule,
}

impl Grid {
    pub fn new(w: usize, h: usize, wrap: bool) -> Result<Self> {
        ensure!(w > 0 && h > 0, "grid must be non-empty, got {w}x{h}");
        let n = w * h;
        Ok(Self {
            w,
            h,
            cells: vec![false; n],
            scratch: vec![false; n],
            wrap,
            rule: Rule::default(),
        })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.w && y < self.h && self.cells[self.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = alive;
        }
    }

    // Off-grid reads are dead unless wrapping.
    #[inline]
    fn alive_at(&self, x: isize, y: isize) -> bool {
        if self.wrap {
            let xx = x.rem_euclid(self.w as isize) as usize;
            let yy = y.rem_euclid(self.h as isize) as usize;
            self.cells[self.idx(xx, yy)]
        } else if x < 0 || y < 0 || x >= self.w as isize || y >= self.h as isize {
            false
        } else {
            self.cells[self.idx(x as usize, y as usize)]
        }
    }

    /// Moore neighborhood count under the current boundary policy.
    pub fn neighbors(&self, x: usize, y: usize) -> u8 {
        let (x, y) = (x as isize, y as isize);
        let mut n = 0u8;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx != 0 || dy != 0) && self.alive_at(x + dx, y + dy) {
                    n += 1;
                }
            }
        }
        n
    }

    /// One generation. Reads only the current cells, writes the scratch
    /// buffer, then swaps.
    pub fn step(&mut self) {
        let mut next = std::mem::take(&mut self.scratch);
        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.idx(x, y);
                next[i] = self.rule.next(self.cells[i], self.neighbors(x, y));
            }
        }
        self.scratch = std::mem::replace(&mut self.cells, next);
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Each cell independently alive with probability `density` (clamped to [0, 1]).
    pub fn randomize<R: Rng + ?Sized>(&mut self, density: f64, rng: &mut R) {
        let p = density.clamp(0.0, 1.0);
        for c in &mut self.cells {
            *c = rng.gen_bool(p);
        }
    }

    /// Overlay live pattern cells at an offset. Parts outside the grid are
    /// dropped; cells outside the footprint are untouched.
    pub fn place_pattern(&mut self, pattern: &Pattern, ox: isize, oy: isize) {
        for py in 0..pattern.height {
            for px in 0..pattern.width {
                let x = ox + px as isize;
                let y = oy + py as isize;
                if x < 0 || y < 0 || x >= self.w as isize || y >= self.h as isize {
                    continue;
                }
                let i = self.idx(x as usize, y as usize);
                self.cells[i] = pattern.get(px, py);
            }
        }
    }

    pub fn place_centered(&mut self, pattern: &Pattern) {
        let ox = (self.w as isize - pattern.width as isize) / 2;
        let oy = (self.h as isize - pattern.height as isize) / 2;
        self.place_pattern(pattern, ox, oy);
    }

    pub fn count_live(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}
