use crate::series::Metric;

/// pixel geometry of the graph.
///
/// devices are laid out left to right, each in a block one column wide per sample. the four
/// metric rows are stacked top to bottom: read, write, latency, queue. a margin at the bottom
/// holds the device labels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    /// samples shown per device.
    pub columns: u32,
    /// pixel width of one sample column.
    pub column_width: u32,
    /// height of the read and write rows.
    pub row_height: u32,
    /// height of the latency and queue rows.
    pub small_row_height: u32,
    /// space below the rows.
    pub margin: u32,
    /// number of device blocks.
    pub devices: u32,
}

impl Layout {
    /// the width of one device's block.
    pub fn block_width(&self) -> u32 {
        self.columns.saturating_mul(self.column_width)
    }

    pub fn width(&self) -> u32 {
        self.block_width().saturating_mul(self.devices)
    }

    pub fn height(&self) -> u32 {
        let rows = self.row_height.saturating_add(self.small_row_height);
        rows.saturating_mul(2).saturating_add(self.margin)
    }

    /// the height of a metric's row.
    pub fn row_height(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Read | Metric::Write => self.row_height,
            Metric::Latency | Metric::Queue => self.small_row_height,
        }
    }

    /// the y coordinate of the bottom edge of a metric's row.
    pub fn baseline(&self, metric: Metric) -> i32 {
        let (big, small) = (u64::from(self.row_height), u64::from(self.small_row_height));
        let y = match metric {
            Metric::Read => big,
            Metric::Write => 2 * big,
            Metric::Latency => 2 * big + small,
            Metric::Queue => 2 * big + 2 * small,
        };
        pixel(y)
    }

    /// the x coordinate of a device's column.
    pub fn column_x(&self, device: usize, column: usize) -> i32 {
        let x = (device as u64)
            .saturating_mul(self.block_width().into())
            .saturating_add((column as u64).saturating_mul(self.column_width.into()));
        pixel(x)
    }

    /// the y coordinates of the lines separating the rows.
    pub fn row_separators(&self) -> [i32; 4] {
        Metric::ALL.map(|metric| self.baseline(metric))
    }

    /// the x coordinates of the lines separating device blocks.
    pub fn block_separators(&self) -> impl Iterator<Item = i32> + '_ {
        (1..self.devices as usize).map(|device| self.column_x(device, 0))
    }

    /// where a device's label is drawn: centered in its block, halfway into the margin.
    pub fn label_anchor(&self, device: usize) -> (i32, i32) {
        let x = self.column_x(device, 0).saturating_add(pixel(self.block_width() / 2));
        let y = self.baseline(Metric::Queue).saturating_add(pixel(self.margin / 2));
        (x, y)
    }
}

/// converts a pixel offset to a coordinate, saturating at the edge of the coordinate space.
pub(crate) fn pixel(offset: impl Into<u64>) -> i32 {
    i32::try_from(offset.into()).unwrap_or(i32::MAX)
}
