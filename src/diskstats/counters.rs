/// the cumulative i/o counters of one block device.
///
/// these values only grow while the device stays attached. a device that is removed and
/// re-attached, or a counter that wraps, will appear to go backwards.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counters {
    /// bytes read since boot.
    pub read_bytes: u64,
    /// bytes written since boot.
    pub write_bytes: u64,
    /// time accumulators, when the kernel reports them.
    ///
    /// legacy partition entries carry no timings; they count as zero.
    pub timings: Option<Timings>,
}

/// time accumulators of one block device, in milliseconds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Timings {
    /// time spent reading.
    pub read_time_ms: u64,
    /// time spent writing.
    pub write_time_ms: u64,
    /// time the device had i/o in flight.
    pub busy_time_ms: u64,
}

/// the difference between two [`Counters`] over one sampling interval.
///
/// every field is floored at zero. a counter that went backwards yields a zero sample rather than
/// a negative one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Sample {
    /// bytes read in the interval.
    pub read: u64,
    /// bytes written in the interval.
    pub write: u64,
    /// milliseconds spent reading and writing in the interval.
    pub latency: u64,
    /// milliseconds the device was busy in the interval.
    ///
    /// this stands in for queue depth. it measures utilization, not how many requests were
    /// waiting, so it is only an approximation of queue pressure.
    pub queue: u64,
}

// === impl Counters ===

impl Counters {
    /// total time spent on reads and writes.
    pub fn io_time_ms(&self) -> u64 {
        self.timings
            .map(|t| t.read_time_ms.saturating_add(t.write_time_ms))
            .unwrap_or(0)
    }

    pub fn busy_time_ms(&self) -> u64 {
        self.timings.map(|t| t.busy_time_ms).unwrap_or(0)
    }
}

// === impl Sample ===

impl Sample {
    /// computes the sample between a previous and a current reading.
    pub fn between(prev: &Counters, curr: &Counters) -> Self {
        Self {
            read: curr.read_bytes.saturating_sub(prev.read_bytes),
            write: curr.write_bytes.saturating_sub(prev.write_bytes),
            latency: curr.io_time_ms().saturating_sub(prev.io_time_ms()),
            queue: curr.busy_time_ms().saturating_sub(prev.busy_time_ms()),
        }
    }
}
