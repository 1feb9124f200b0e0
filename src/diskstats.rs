use {
    crate::source::StatsSource,
    std::{
        collections::BTreeMap,
        io::{self, BufRead, BufReader},
        num::ParseIntError,
        str::FromStr,
    },
};

pub use self::{
    counters::{Counters, Sample, Timings},
    device::{DeviceName, InvalidDeviceName},
};

mod counters;
mod device;


/// a snapshot of every block device's cumulative counters at a moment in time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    devices: BTreeMap<DeviceName, Counters>,
}

/// an entry in the `/proc/diskstats` table.
///
/// see `Documentation/admin-guide/iostats.rst` in the linux source tree for more information.
#[derive(Debug, Eq, PartialEq)]
pub struct Entry {
    pub device: DeviceName,
    pub counters: Counters,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum EntryParseError {
    #[error("diskstats entry is missing its device name")]
    MissingName,
    #[error("invalid device name: {0}")]
    DeviceName(#[from] InvalidDeviceName),
    #[error("invalid counter value: {0}")]
    Counter(#[from] ParseIntError),
    #[error("unexpected number of counters for {device}: {count}")]
    FieldCount { device: String, count: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum StatReadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Entry(#[from] EntryParseError),
}

// === impl Snapshot ===

impl Snapshot {
    /// uses the given source to parse a snapshot of the device statistics.
    pub fn read(stats: &impl StatsSource) -> Result<Snapshot, StatReadError> {
        let reader = stats.open()?;

        let mut devices = BTreeMap::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Entry { device, counters } = line.parse::<Entry>()?;
            devices.insert(device, counters);
        }

        Ok(Snapshot { devices })
    }

    /// returns the counters for a device, or `None` if the device is not present.
    pub fn get(&self, device: &DeviceName) -> Option<&Counters> {
        self.devices.get(device)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl FromIterator<(DeviceName, Counters)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (DeviceName, Counters)>>(iter: I) -> Self {
        Self {
            devices: iter.into_iter().collect(),
        }
    }
}

// === impl Entry ===

impl Entry {
    /// the size of a sector, in bytes.
    ///
    /// the kernel always reports sectors in 512-byte units, regardless of the device's actual
    /// sector size.
    const SECTOR_SIZE: u64 = 512;

    fn sectors_to_bytes(sectors: u64) -> u64 {
        sectors.saturating_mul(Self::SECTOR_SIZE)
    }
}

impl FromStr for Entry {
    type Err = EntryParseError;
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let tokens = entry.split_whitespace().collect::<Vec<_>>();
        let [_major, _minor, name, fields @ ..] = tokens.as_slice() else {
            return Err(EntryParseError::MissingName);
        };

        let device = name.parse::<DeviceName>()?;
        let fields = fields
            .iter()
            .map(|f| f.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()?;

        let counters = match *fields.as_slice() {
            // kernels before 2.6.25 reported partitions with only four counters.
            [_reads, sectors_read, _writes, sectors_written] => Counters {
                read_bytes: Self::sectors_to_bytes(sectors_read),
                write_bytes: Self::sectors_to_bytes(sectors_written),
                timings: None,
            },
            // the eleven classic counters, optionally followed by discard and flush counters.
            [
                _reads,
                _reads_merged,
                sectors_read,
                read_time_ms,
                _writes,
                _writes_merged,
                sectors_written,
                write_time_ms,
                _in_flight,
                busy_time_ms,
                _weighted_time_ms,
                ..,
            ] => Counters {
                read_bytes: Self::sectors_to_bytes(sectors_read),
                write_bytes: Self::sectors_to_bytes(sectors_written),
                timings: Some(Timings {
                    read_time_ms,
                    write_time_ms,
                    busy_time_ms,
                }),
            },
            _ => {
                return Err(EntryParseError::FieldCount {
                    device: device.to_string(),
                    count: fields.len(),
                });
            }
        };

        Ok(Self { device, counters })
    }
}
