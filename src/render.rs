//! draws the series store onto a surface.

use {
    crate::{
        diskstats::DeviceName,
        series::{Metric, SeriesStore},
    },
    log::debug,
};

pub use self::{
    layout::Layout,
    scale::Scale,
    surface::{
        Coords, Drawable, Handle, Line, Paint, RecordingSurface, Scene, Surface, SurfaceError,
        Text,
    },
};

mod layout;
mod scale;
mod surface;


/// how the graph is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub layout: Layout,
    /// the throughput, in MiB per interval, that fills the read and write rows.
    pub max_mb_per_sec: f64,
    /// whether device names are drawn below their blocks.
    pub labels: bool,
}

/// draws bar graphs of the series store, reusing one drawable per column.
pub struct Renderer<S> {
    surface: S,
    layout: Layout,
    /// the scale of the read and write rows.
    fixed: Scale,
    /// one line per (metric, device, column), in that order.
    columns: Vec<Handle>,
    /// the last height given to each line in `columns`.
    heights: Vec<u32>,
    /// separators and labels. these never move.
    statics: Vec<Handle>,
}

// === impl Renderer ===

impl<S: Surface> Renderer<S> {
    /// draws the static parts of the graph and creates every column.
    ///
    /// this is the only place drawables are created. the blank graph is presented before
    /// returning.
    pub fn initialize_layout(
        mut surface: S,
        config: RenderConfig,
        devices: &[DeviceName],
    ) -> Result<Self, SurfaceError> {
        let RenderConfig {
            layout,
            max_mb_per_sec,
            labels,
        } = config;

        let mut statics = Vec::new();

        // separators between device blocks, then between metric rows.
        let height = layout::pixel(layout.height());
        for x in layout.block_separators() {
            statics.push(surface.create_line(Line {
                coords: Coords::vertical(x, 0, height),
                paint: Paint::Separator,
            })?);
        }
        let width = layout::pixel(layout.width());
        for y in layout.row_separators() {
            statics.push(surface.create_line(Line {
                coords: Coords::horizontal(y, 0, width),
                paint: Paint::Separator,
            })?);
        }

        if labels {
            for (i, device) in devices.iter().take(layout.devices as usize).enumerate() {
                let (x, y) = layout.label_anchor(i);
                statics.push(surface.create_text(Text {
                    x,
                    y,
                    text: device.to_string(),
                    paint: Paint::Label,
                })?);
            }
        }

        // every column starts out flat on its row's baseline.
        let mut columns = Vec::with_capacity(Self::column_count(&layout));
        for metric in Metric::ALL {
            let baseline = layout.baseline(metric);
            for device in 0..layout.devices as usize {
                for column in 0..layout.columns as usize {
                    let x = layout.column_x(device, column);
                    columns.push(surface.create_line(Line {
                        coords: Coords::vertical(x, baseline, baseline),
                        paint: Self::paint(metric),
                    })?);
                }
            }
        }
        debug!(
            "created {} columns and {} static drawables",
            columns.len(),
            statics.len()
        );

        surface.present()?;

        Ok(Self {
            surface,
            layout,
            fixed: Scale::fixed(max_mb_per_sec, layout.row_height),
            heights: vec![0; columns.len()],
            columns,
            statics,
        })
    }

    /// moves every column to the height of its current value, then presents the surface.
    ///
    /// devices are drawn in the store's order. samples beyond the layout are not drawn.
    pub fn render(&mut self, store: &SeriesStore) -> Result<(), SurfaceError> {
        let Self {
            surface,
            layout,
            fixed,
            columns,
            heights,
            statics: _,
        } = self;

        let devices = layout.devices as usize;
        let width = layout.columns as usize;

        for metric in Metric::ALL {
            let scale = match metric {
                Metric::Read | Metric::Write => *fixed,
                Metric::Latency | Metric::Queue => Scale::adaptive(store.max(metric)),
            };
            let row_height = layout.row_height(metric);
            let baseline = layout.baseline(metric);

            for (device, (_, window)) in store.row(metric).take(devices).enumerate() {
                for (column, value) in window.iter().take(width).enumerate() {
                    let index = (metric.index() * devices + device) * width + column;
                    let height = scale.height(value, row_height);
                    if heights[index] == height {
                        continue;
                    }

                    let x = layout.column_x(device, column);
                    let top = baseline.saturating_sub(layout::pixel(height));
                    surface.reposition(columns[index], Coords::vertical(x, baseline, top))?;
                    heights[index] = height;
                }
            }
        }

        surface.present()
    }

    /// the number of drawables this renderer has created.
    pub fn handle_count(&self) -> usize {
        self.columns.len() + self.statics.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn column_count(layout: &Layout) -> usize {
        Metric::ALL.len() * layout.devices as usize * layout.columns as usize
    }

    fn paint(metric: Metric) -> Paint {
        match metric {
            Metric::Read => Paint::Read,
            Metric::Write => Paint::Write,
            Metric::Latency => Paint::Latency,
            Metric::Queue => Paint::Queue,
        }
    }
}
