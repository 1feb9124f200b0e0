use {
    crate::{
        diskstats::{Counters, DeviceName, Sample, Snapshot, StatReadError},
        series::SeriesStore,
        source::{ProcDiskstats, StatsSource},
    },
    crossbeam_channel::{Sender, TrySendError},
    log::{debug, info, trace, warn},
    std::{collections::BTreeMap, time::Duration},
};

#[cfg(test)]
mod tests;

/// polls a counter source and records per-interval samples for each configured device.
pub struct Sampler<S = ProcDiskstats> {
    /// the underlying source of device statistics.
    source: S,
    /// the devices to track, in display order.
    devices: Vec<DeviceName>,
    inner: Inner,
    /// the windows of recent samples.
    store: SeriesStore,
}

enum Inner {
    /// no snapshot has been read yet.
    Pending,
    Running {
        /// the last observed counters of each configured device.
        ///
        /// `None` marks a device that was not found when sampling began. such devices are never
        /// sampled.
        last: BTreeMap<DeviceName, Option<Counters>>,
    },
}

/// the state of the store after one sampling pass.
#[derive(Clone, Debug)]
pub struct Tick {
    /// counts successful passes, starting at 1.
    pub seq: u64,
    pub store: SeriesStore,
}

// === impl Sampler ===

impl<S: StatsSource> Sampler<S> {
    /// creates a new [`Sampler`], reading the initial counters of each device.
    ///
    /// a device missing from the source is reported once, here, and is never sampled. if the
    /// source cannot be read at all, the first successful [`Sampler::observe()`] call reads the
    /// initial counters instead.
    pub fn new(source: S, devices: Vec<DeviceName>, columns: usize) -> Self {
        let store = SeriesStore::new(&devices, columns);
        let devices = store.devices().cloned().collect();
        let mut sampler = Self {
            source,
            devices,
            inner: Inner::Pending,
            store,
        };

        if let Err(error) = sampler.observe() {
            warn!("could not read initial device statistics: {error}");
        }

        sampler
    }

    /// records a sample for each device that can be compared to its previous reading.
    ///
    /// returns the number of devices that were sampled, or `Ok(None)` if this call only
    /// established the initial readings.
    pub fn observe(&mut self) -> Result<Option<usize>, StatReadError> {
        let Self {
            source,
            devices,
            inner,
            store,
        } = self;

        let snapshot = Snapshot::read(&*source)?;

        let last = match inner {
            Inner::Pending => {
                *inner = Inner::Running {
                    last: Self::baseline(devices, &snapshot),
                };
                return Ok(None);
            }
            Inner::Running { last } => last,
        };

        let mut sampled = 0;
        for (device, prev) in last.iter_mut() {
            let Some(prev) = prev else {
                continue;
            };
            let Some(curr) = snapshot.get(device) else {
                debug!("device {device} is missing; skipping");
                continue;
            };

            let sample = Sample::between(prev, curr);
            trace!("device {device}: {sample:?}");
            if let Err(error) = store.push(device, &sample) {
                warn!("{error}");
                continue;
            }

            *prev = *curr;
            sampled += 1;
        }

        Ok(Some(sampled))
    }

    /// returns the windows of recent samples.
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// samples the source once every `interval`, forever.
    ///
    /// after each pass a copy of the store is offered to `ticks`. this returns once the receiving
    /// end has been dropped.
    pub fn run(mut self, interval: Duration, ticks: Sender<Tick>) {
        let timer = crossbeam_channel::tick(interval);
        let mut seq = 0;

        for _ in timer.iter() {
            match self.observe() {
                Ok(Some(sampled)) => trace!("sampled {sampled} devices"),
                Ok(None) => continue,
                Err(error) => {
                    warn!("could not read device statistics: {error}");
                    continue;
                }
            }

            seq += 1;
            let tick = Tick {
                seq,
                store: self.store.clone(),
            };
            match ticks.try_send(tick) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => debug!("renderer is behind; dropping tick {seq}"),
                Err(TrySendError::Disconnected(_)) => {
                    info!("renderer has gone away; stopping sampler");
                    return;
                }
            }
        }
    }

    /// pairs each configured device with its initial counters, reporting devices not found.
    fn baseline(
        devices: &[DeviceName],
        snapshot: &Snapshot,
    ) -> BTreeMap<DeviceName, Option<Counters>> {
        devices
            .iter()
            .map(|device| {
                let counters = snapshot.get(device).copied();
                if counters.is_none() {
                    warn!("device {device} not found");
                }
                (device.clone(), counters)
            })
            .collect()
    }
}
