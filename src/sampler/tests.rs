use {
    super::*,
    crate::{series::Metric, source::MockStatFile},
    std::io::{self, Cursor, Read},
};

fn device(name: &str) -> DeviceName {
    name.parse().unwrap()
}

fn devices(names: &[&str]) -> Vec<DeviceName> {
    names.iter().copied().map(device).collect()
}

/// renders one `/proc/diskstats` line with the given sector and time counters.
fn line(name: &str, sectors_read: u64, sectors_written: u64, io_ms: u64, busy_ms: u64) -> String {
    format!(
        "   8       0 {name} 1 0 {sectors_read} {io_ms} 1 0 {sectors_written} 0 0 {busy_ms} 0\n"
    )
}

fn values(sampler: &Sampler<MockStatFile>, name: &str, metric: Metric) -> Vec<u64> {
    sampler
        .store()
        .snapshot(&device(name), metric)
        .unwrap()
        .iter()
        .collect()
}

#[test]
fn first_tick_pushes_deltas() {
    let source = MockStatFile::new([
        line("sda", 1953, 0, 10, 100),
        line("sda", 1953 + 4096, 2, 25, 130),
    ]);
    let mut sampler = Sampler::new(source, devices(&["sda"]), 4);
    assert_eq!(sampler.observe().unwrap(), Some(1));

    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 0, 0, 2_097_152]);
    assert_eq!(values(&sampler, "sda", Metric::Write), vec![0, 0, 0, 1024]);
    assert_eq!(values(&sampler, "sda", Metric::Latency), vec![0, 0, 0, 15]);
    assert_eq!(values(&sampler, "sda", Metric::Queue), vec![0, 0, 0, 30]);
}

#[test]
fn regression_is_clamped() {
    let source = MockStatFile::new([
        line("sdb", 5_000, 5_000, 500, 500),
        line("sdb", 4_000, 4_000, 400, 400),
        line("sdb", 4_010, 4_000, 400, 400),
    ]);
    let mut sampler = Sampler::new(source, devices(&["sdb"]), 3);
    sampler.observe().unwrap();
    sampler.observe().unwrap();

    // the regressed reading becomes the new baseline.
    assert_eq!(values(&sampler, "sdb", Metric::Read), vec![0, 0, 10 * 512]);
    for metric in [Metric::Write, Metric::Latency, Metric::Queue] {
        assert!(values(&sampler, "sdb", metric).iter().all(|v| *v == 0));
    }
}

#[test]
fn absent_device_is_never_sampled() {
    let source = MockStatFile::new([
        line("sda", 0, 0, 0, 0),
        line("sda", 8, 8, 8, 8) + &line("sdx", 100, 100, 100, 100),
        line("sda", 16, 16, 16, 16) + &line("sdx", 900, 900, 900, 900),
    ]);
    let mut sampler = Sampler::new(source, devices(&["sda", "sdx"]), 3);
    assert_eq!(sampler.observe().unwrap(), Some(1));
    assert_eq!(sampler.observe().unwrap(), Some(1));

    for metric in Metric::ALL {
        assert_eq!(values(&sampler, "sdx", metric), vec![0, 0, 0]);
    }
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 8 * 512, 8 * 512]);
}

#[test]
fn missing_device_keeps_its_baseline() {
    let source = MockStatFile::new([
        line("sda", 0, 0, 0, 0) + &line("sdb", 0, 0, 0, 0),
        line("sda", 1, 0, 0, 0),
        line("sda", 2, 0, 0, 0) + &line("sdb", 3, 0, 0, 0),
    ]);
    let mut sampler = Sampler::new(source, devices(&["sda", "sdb"]), 2);
    assert_eq!(sampler.observe().unwrap(), Some(1));
    assert_eq!(values(&sampler, "sdb", Metric::Read), vec![0, 0]);

    assert_eq!(sampler.observe().unwrap(), Some(2));
    assert_eq!(values(&sampler, "sdb", Metric::Read), vec![0, 3 * 512]);
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![512, 512]);
}

#[test]
fn failed_read_skips_the_tick() {
    let source = MockStatFile::new([line("sda", 0, 0, 0, 0)]);
    source.push_failure();
    source.push(line("sda", 2, 0, 0, 0));
    let mut sampler = Sampler::new(source, devices(&["sda"]), 2);

    assert!(matches!(sampler.observe(), Err(StatReadError::Io(_))));
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 0]);

    assert_eq!(sampler.observe().unwrap(), Some(1));
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 2 * 512]);
}

#[test]
fn unavailable_at_startup_waits_for_a_baseline() {
    let source = MockStatFile::default();
    source.push_failure();
    source.push(line("sda", 10, 0, 0, 0));
    source.push(line("sda", 12, 0, 0, 0));
    let mut sampler = Sampler::new(source, devices(&["sda"]), 2);

    assert_eq!(sampler.observe().unwrap(), None);
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 0]);

    assert_eq!(sampler.observe().unwrap(), Some(1));
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 2 * 512]);
}

#[test]
fn duplicate_devices_are_tracked_once() {
    let source = MockStatFile::new([line("sda", 0, 0, 0, 0), line("sda", 1, 0, 0, 0)]);
    let mut sampler = Sampler::new(source, devices(&["sda", "sda"]), 2);
    assert_eq!(sampler.store().devices().len(), 1);
    assert_eq!(sampler.observe().unwrap(), Some(1));
    assert_eq!(values(&sampler, "sda", Metric::Read), vec![0, 512]);
}

/// a source that yields the same reading forever.
struct Steady(String);

impl StatsSource for Steady {
    fn open(&self) -> io::Result<impl Read> {
        let Self(reading) = self;
        Ok(Cursor::new(reading.clone()))
    }
}

#[test]
fn run_signals_once_per_tick_and_stops_when_disconnected() {
    let source = Steady(line("sda", 0, 0, 0, 0) + &line("sdb", 0, 0, 0, 0));
    let sampler = Sampler::new(source, devices(&["sda", "sdb"]), 5);
    let (tx, rx) = crossbeam_channel::bounded(16);

    let handle = std::thread::spawn(move || sampler.run(Duration::from_millis(1), tx));

    for expected in 1..=3 {
        let Tick { seq, store } = rx.recv().unwrap();
        assert_eq!(seq, expected);
        assert_eq!(store.devices().len(), 2);
        assert_eq!(store.capacity(), 5);
    }

    drop(rx);
    handle.join().unwrap();
}

/// a source whose counters grow faster on every read.
///
/// on the `n`th read after the first, `sda` has read `n` more sectors and `sdb` has written `2n`
/// more, so each pass leaves a distinct delta behind.
#[derive(Default)]
struct Growing {
    reads: std::cell::Cell<u64>,
}

impl StatsSource for Growing {
    fn open(&self) -> io::Result<impl Read> {
        let n = self.reads.get();
        self.reads.set(n + 1);

        let total = n * (n + 1) / 2;
        let reading = line("sda", total, 0, 0, 0) + &line("sdb", 0, 2 * total, 0, 0);
        Ok(Cursor::new(reading))
    }
}

#[test]
fn each_tick_carries_its_whole_pass() {
    let sampler = Sampler::new(Growing::default(), devices(&["sda", "sdb"]), 4);
    let (tx, rx) = crossbeam_channel::bounded(16);

    let handle = std::thread::spawn(move || sampler.run(Duration::from_millis(1), tx));

    // pass `k` pushed `k` to sda and `2k` to sdb, after every earlier pass.
    let window = |seq: u64, scale: u64| -> Vec<u64> {
        (0..4)
            .map(|back| seq.checked_sub(3 - back).filter(|pass| *pass > 0))
            .map(|pass| pass.map_or(0, |pass| pass * scale * 512))
            .collect()
    };

    for _ in 0..5 {
        let Tick { seq, store } = rx.recv().unwrap();
        let read = store.snapshot(&device("sda"), Metric::Read).unwrap();
        let written = store.snapshot(&device("sdb"), Metric::Write).unwrap();
        assert_eq!(read.iter().collect::<Vec<_>>(), window(seq, 1), "tick {seq}");
        assert_eq!(written.iter().collect::<Vec<_>>(), window(seq, 2), "tick {seq}");
    }

    drop(rx);
    handle.join().unwrap();
}
