//! a compact disk i/o monitor.
//!
//! a [`Sampler`] reads cumulative per-device counters once per interval, turning them into
//! samples held in fixed-length windows. a [`Renderer`] draws those windows as bar graphs,
//! moving one persistent drawable per column rather than redrawing from scratch.

use {
    self::{render::SurfaceError, source::ProcDiskstats},
    std::io,
};

pub use self::{
    config::Config,
    logging::HeldLog,
    render::Renderer,
    sampler::Sampler,
    series::SeriesStore,
    window::{CellSize, TerminalSurface},
};

pub mod config;
/// block device statistics.
///
/// this provides tools to interact with `/proc/diskstats`.
pub mod diskstats;
pub mod logging;
mod meter;
pub mod render;
pub mod sampler;
pub mod series;
pub mod source;
mod window;

pub struct App {
    config: Config,
    sampler: Sampler,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// === impl App ===

impl App {
    /// initializes a new application.
    ///
    /// this reads the initial device statistics, reporting any configured device that is not
    /// present.
    pub fn new(config: Config) -> Self {
        let source = ProcDiskstats::new(&config.diskstats);
        let sampler = Sampler::new(source, config.devices.clone(), config.columns.into());

        Self { config, sampler }
    }
}
