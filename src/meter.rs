/// a vertical bar, rasterized onto terminal cells.
///
/// the bar covers the pixel rows `top..bottom`. cells it only partly covers are drawn with the
/// eighth-block glyph closest to the covered fraction. those glyphs fill a cell from the bottom,
/// so `bottom` must lie on a cell boundary.
pub struct Meter {
    pub top: i32,
    pub bottom: i32,
}

/// === impl Meter ===

impl Meter {
    const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    /// returns the terminal row and glyph of every cell the bar shows up in.
    pub fn cells(&self, cell_height: u32) -> impl Iterator<Item = (i32, char)> {
        let Self { top, bottom } = *self;
        let cell_height = cell_height.max(1) as i32;

        let rows = if top < bottom {
            top.div_euclid(cell_height)..=(bottom - 1).div_euclid(cell_height)
        } else {
            // an empty range: flat bars occupy no cells.
            1..=0
        };

        rows.filter_map(move |row| {
            let cell_top = row * cell_height;
            let cell_bottom = cell_top + cell_height;
            let covered = bottom.min(cell_bottom) - top.max(cell_top);

            let level = (covered * 8 + cell_height / 2) / cell_height;
            let glyph = Self::LEVELS[level.clamp(0, 8) as usize];
            (level > 0).then_some((row, glyph))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(top: i32, bottom: i32, cell_height: u32) -> Vec<(i32, char)> {
        Meter { top, bottom }.cells(cell_height).collect()
    }

    #[test]
    fn flat_bar_is_invisible() {
        assert_eq!(cells(200, 200, 10), vec![]);
    }

    #[test]
    fn whole_cells() {
        assert_eq!(cells(180, 200, 10), vec![(18, '█'), (19, '█')]);
    }

    #[test]
    fn partial_top_cell() {
        assert_eq!(cells(195, 200, 10), vec![(19, '▄')]);
        assert_eq!(cells(172, 200, 8), vec![(21, '▄'), (22, '█'), (23, '█'), (24, '█')]);
    }

    #[test]
    fn slivers_round_away() {
        // a single pixel of a twenty pixel cell rounds down to nothing.
        assert_eq!(cells(199, 200, 20), vec![]);
        assert_eq!(cells(198, 200, 20), vec![(9, '▁')]);
    }

    #[test]
    fn one_pixel_per_row() {
        assert_eq!(cells(408, 410, 1), vec![(408, '█'), (409, '█')]);
    }
}
