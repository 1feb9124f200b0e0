/// maps sample values to column heights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scale {
    /// a constant number of bytes per pixel.
    Fixed { bytes_per_pixel: f64 },
    /// relative to the largest value currently shown in the row.
    ///
    /// heights are only comparable within one frame: a spike on any device shrinks every other
    /// device's columns.
    Adaptive { max: u64 },
}

impl Scale {
    /// the fixed scale at which `max_mb_per_sec` fills a row of `row_height` pixels.
    pub fn fixed(max_mb_per_sec: f64, row_height: u32) -> Self {
        Self::Fixed {
            bytes_per_pixel: max_mb_per_sec * 1024.0 * 1024.0 / f64::from(row_height),
        }
    }

    /// the adaptive scale for a row whose largest value is `max`.
    pub fn adaptive(max: u64) -> Self {
        Self::Adaptive { max: max.max(1) }
    }

    /// the height of a column showing `value` in a row of `row_height` pixels.
    ///
    /// heights are truncated to whole pixels and never exceed the row.
    pub fn height(&self, value: u64, row_height: u32) -> u32 {
        let row_height = f64::from(row_height);
        let height = match *self {
            Self::Fixed { bytes_per_pixel } => value as f64 / bytes_per_pixel,
            Self::Adaptive { max } => value as f64 / max.max(1) as f64 * row_height,
        };

        // `as` saturates, and maps NaN to zero.
        height.clamp(0.0, row_height) as u32
    }
}
