// Row-wise run-length batching of quantized cells into same-color segments.

/// One quantized grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantized {
    pub glyph: char,
    pub color: u8,
}

impl Quantized {
    pub const fn new(glyph: char, color: u8) -> Self {
        Self { glyph, color }
    }
}

/// Maximal run of glyphs sharing a palette index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: u8,
}

impl Segment {
    /// Width in cells (one char per cell).
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// Single left-to-right pass; flushes on every color change.
pub fn batch_row(row: &[Quantized]) -> Vec<Segment> {
    let mut out = Vec::new();
    batch_row_into(row, &mut out);
    out
}

/// Same as [`batch_row`] but reuses `out` (cleared first).
pub fn batch_row_into(row: &[Quantized], out: &mut Vec<Segment>) {
    out.clear();
    let Some(first) = row.first() else {
        return;
    };

    let mut acc = String::with_capacity(row.len());
    let mut color = first.color;
    for cell in row {
        if cell.color != color {
            out.push(Segment {
                text: std::mem::take(&mut acc),
                color,
            });
            color = cell.color;
        }
        acc.push(cell.glyph);
    }
    out.push(Segment { text: acc, color });
}

/// Inverse of batching; used for direct cell writes.
pub fn expand_segments(segments: &[Segment]) -> Vec<Quantized> {
    segments
        .iter()
        .flat_map(|s| s.text.chars().map(move |g| Quantized::new(g, s.color)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(glyphs: &str, colors: &[u8]) -> Vec<Quantized> {
        glyphs
            .chars()
            .zip(colors.iter())
            .map(|(g, &c)| Quantized::new(g, c))
            .collect()
    }

    #[test]
    fn merges_runs() {
        let r = row("XXXYYZZZZ", &[0, 0, 0, 1, 1, 2, 2, 2, 2]);
        let segs = batch_row(&r);
        assert_eq!(
            segs,
            vec![
                Segment { text: "XXX".into(), color: 0 },
                Segment { text: "YY".into(), color: 1 },
                Segment { text: "ZZZZ".into(), color: 2 },
            ]
        );
    }

    #[test]
    fn color_not_glyph_drives_splits() {
        let r = row("abcd", &[3, 3, 3, 3]);
        let segs = batch_row(&r);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "abcd");
    }

    #[test]
    fn alternating_colors_give_one_segment_per_cell() {
        let r = row("abcdef", &[0, 1, 0, 1, 0, 1]);
        assert_eq!(batch_row(&r).len(), r.len());
    }

    #[test]
    fn empty_row() {
        assert!(batch_row(&[]).is_empty());
    }

    #[test]
    fn multibyte_glyphs_keep_width() {
        let r = row("░▒▓█", &[1, 1, 2, 2]);
        let segs = batch_row(&r);
        assert_eq!(segs.iter().map(Segment::width).sum::<usize>(), 4);
        assert_eq!(expand_segments(&segs), r);
    }

    #[test]
    fn into_reuses_buffer() {
        let mut out = vec![Segment { text: "stale".into(), color: 9 }];
        batch_row_into(&row("ab", &[1, 1]), &mut out);
        assert_eq!(out, vec![Segment { text: "ab".into(), color: 1 }]);
    }
}
