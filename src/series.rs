//! sliding windows of recent samples.

use {
    crate::diskstats::{DeviceName, Sample},
    std::collections::VecDeque,
};


/// one of the four graphed quantities.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Metric {
    /// bytes read per interval.
    Read,
    /// bytes written per interval.
    Write,
    /// time spent on i/o per interval.
    Latency,
    /// busy time per interval, standing in for queue depth.
    Queue,
}

/// a fixed-length window of the most recent values of one metric.
///
/// the window starts out full of zeroes. every push evicts the oldest value, so its length never
/// changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Window {
    values: VecDeque<u64>,
    capacity: usize,
}

/// the windows of every tracked device.
#[derive(Clone, Debug)]
pub struct SeriesStore {
    /// one entry per device, in display order.
    series: Vec<Series>,
    capacity: usize,
}

#[derive(Clone, Debug)]
struct Series {
    device: DeviceName,
    windows: [Window; 4],
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("device {0} is not tracked")]
pub struct UnknownDevice(pub DeviceName);

// === impl Metric ===

impl Metric {
    pub const ALL: [Metric; 4] = [Self::Read, Self::Write, Self::Latency, Self::Queue];

    pub const fn index(self) -> usize {
        match self {
            Self::Read => 0,
            Self::Write => 1,
            Self::Latency => 2,
            Self::Queue => 3,
        }
    }

    /// selects this metric's value out of a sample.
    pub fn of(self, sample: &Sample) -> u64 {
        match self {
            Self::Read => sample.read,
            Self::Write => sample.write,
            Self::Latency => sample.latency,
            Self::Queue => sample.queue,
        }
    }
}

// === impl Window ===

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: std::iter::repeat_n(0, capacity).collect(),
            capacity,
        }
    }

    /// appends a value on the right, discarding the oldest value on the left.
    pub fn push(&mut self, value: u64) {
        let Self { values, capacity } = self;

        values.push_back(value);
        if values.len() > *capacity {
            values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// returns the values, oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
        self.values.iter().copied()
    }

    pub fn max(&self) -> u64 {
        self.iter().max().unwrap_or(0)
    }
}

// === impl SeriesStore ===

impl SeriesStore {
    /// creates zeroed windows of the given length for each device.
    ///
    /// duplicate device names are tracked once, at their first position.
    pub fn new<'a>(devices: impl IntoIterator<Item = &'a DeviceName>, capacity: usize) -> Self {
        let mut series: Vec<Series> = Vec::new();
        for device in devices {
            if series.iter().any(|s| &s.device == device) {
                continue;
            }
            series.push(Series {
                device: device.clone(),
                windows: std::array::from_fn(|_| Window::new(capacity)),
            });
        }

        Self { series, capacity }
    }

    /// appends a sample to each of the device's four windows.
    pub fn push(&mut self, device: &DeviceName, sample: &Sample) -> Result<(), UnknownDevice> {
        let Series { windows, .. } = self
            .series
            .iter_mut()
            .find(|s| &s.device == device)
            .ok_or_else(|| UnknownDevice(device.clone()))?;

        for metric in Metric::ALL {
            windows[metric.index()].push(metric.of(sample));
        }

        Ok(())
    }

    /// returns the current contents of one of a device's windows.
    pub fn snapshot(&self, device: &DeviceName, metric: Metric) -> Option<&Window> {
        self.series
            .iter()
            .find(|s| &s.device == device)
            .map(|s| &s.windows[metric.index()])
    }

    /// returns each device alongside its window for the given metric, in display order.
    pub fn row(&self, metric: Metric) -> impl Iterator<Item = (&DeviceName, &Window)> + '_ {
        self.series
            .iter()
            .map(move |s| (&s.device, &s.windows[metric.index()]))
    }

    /// returns the largest value of a metric across every device's window.
    pub fn max(&self, metric: Metric) -> u64 {
        self.row(metric).map(|(_, w)| w.max()).max().unwrap_or(0)
    }

    pub fn devices(&self) -> impl ExactSizeIterator<Item = &DeviceName> + '_ {
        self.series.iter().map(|s| &s.device)
    }

    /// the length of every window in the store.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
