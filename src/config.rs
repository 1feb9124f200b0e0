use {
    crate::{
        diskstats::DeviceName,
        render::{Layout, RenderConfig},
        source::ProcDiskstats,
        window::CellSize,
    },
    clap::Parser,
    std::{path::PathBuf, time::Duration},
};

/// a compact disk i/o monitor.
///
/// each device gets a block of scrolling columns: bytes read and bytes written on a fixed scale,
/// then i/o time and busy time scaled to the busiest device.
#[derive(Clone, Debug, Parser)]
#[command(name = "iotach", version, about)]
pub struct Config {
    /// block devices to monitor, in display order.
    #[arg(short, long, value_delimiter = ',', default_values_t = Config::default_devices())]
    pub devices: Vec<DeviceName>,

    /// samples shown per device.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub columns: u16,

    /// pixel width of one sample column.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub column_width: u16,

    /// pixel height of the read and write rows.
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u16).range(1..))]
    pub row_height: u16,

    /// pixel height of the latency and queue rows.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub small_row_height: u16,

    /// pixel height of the label margin below the rows.
    #[arg(long, default_value_t = 20)]
    pub margin: u16,

    /// milliseconds between samples.
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// throughput, in MiB per second, that fills the read and write rows.
    #[arg(long, default_value_t = 200.0, value_parser = positive)]
    pub max_mb_per_sec: f64,

    /// draw device names below their columns.
    #[arg(long)]
    pub labels: bool,

    /// how strongly the graph shows against the background, from 0 to 1.
    #[arg(long, default_value_t = 0.5, value_parser = unit_interval)]
    pub opacity: f64,

    /// pixels covered by one terminal column.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub cell_width: u16,

    /// pixels covered by one terminal row, at most.
    ///
    /// rows whose height is not a multiple of this are drawn with shorter cells.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..))]
    pub cell_height: u16,

    /// where to read device statistics from.
    #[arg(long, default_value = ProcDiskstats::DISKSTATS)]
    pub diskstats: PathBuf,

    /// write logs to this file as they happen, instead of to stderr once the ui has exited.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    const DEVICES: [&str; 7] = ["sda", "sdb", "sdc", "sde", "sdd", "md0", "md1"];

    fn default_devices() -> Vec<DeviceName> {
        Self::DEVICES
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// the layout and scale of the graph, for the given number of devices.
    pub fn render_config(&self, devices: usize) -> RenderConfig {
        RenderConfig {
            layout: Layout {
                columns: self.columns.into(),
                column_width: self.column_width.into(),
                row_height: self.row_height.into(),
                small_row_height: self.small_row_height.into(),
                margin: self.margin.into(),
                devices: devices.try_into().unwrap_or(u32::MAX),
            },
            max_mb_per_sec: self.max_mb_per_sec,
            labels: self.labels,
        }
    }

    pub fn cell_size(&self) -> CellSize {
        CellSize {
            width: self.cell_width.into(),
            height: self.cell_height.into(),
        }
    }
}

fn positive(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        Ok(v) => Err(format!("{v} is not a positive number")),
        Err(e) => Err(e.to_string()),
    }
}

fn unit_interval(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        Ok(v) => Err(format!("{v} is not between 0 and 1")),
        Err(e) => Err(e.to_string()),
    }
}
