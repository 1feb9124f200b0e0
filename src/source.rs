use std::{
    cell::RefCell,
    collections::VecDeque,
    fs::File,
    io::{self, BufReader, Cursor, Read},
    path::{Path, PathBuf},
};

/// a source of per-device i/o counters.
///
/// implementors hand out a reader over text in the `/proc/diskstats` format. the whole table is
/// read at once, so each call yields one batch covering every device the kernel knows about.
pub trait StatsSource {
    /// returns a reader.
    fn open(&self) -> io::Result<impl Read>;
}

/// stats backed by `/proc/diskstats`, or a file with the same layout.
#[derive(Clone, Debug)]
pub struct ProcDiskstats {
    path: PathBuf,
}

/// a mock stat source.
///
/// each call to [`StatsSource::open()`] pops the next scripted reading.
#[derive(Debug, Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockStatFile {
    stats: RefCell<VecDeque<io::Result<String>>>,
}

// === impl ProcDiskstats ===

impl ProcDiskstats {
    pub const DISKSTATS: &str = "/proc/diskstats";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcDiskstats {
    fn default() -> Self {
        Self::new(Self::DISKSTATS)
    }
}

impl StatsSource for ProcDiskstats {
    fn open(&self) -> io::Result<impl Read> {
        File::open(&self.path).map(BufReader::new)
    }
}

// === impl MockStatFile ===

#[allow(dead_code, reason = "this is a testing utility.")]
impl MockStatFile {
    pub fn new<I, T>(readings: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let stats = readings.into_iter().map(Into::into).map(Ok).collect();
        Self {
            stats: RefCell::new(stats),
        }
    }

    /// queues a successful reading.
    pub fn push(&self, reading: impl Into<String>) {
        self.stats.borrow_mut().push_back(Ok(reading.into()));
    }

    /// queues a reading that fails, as if the file could not be opened.
    pub fn push_failure(&self) {
        let error = io::Error::new(io::ErrorKind::NotFound, "mock stats are unavailable");
        self.stats.borrow_mut().push_back(Err(error));
    }
}

impl StatsSource for MockStatFile {
    fn open(&self) -> io::Result<impl Read> {
        let Self { stats } = self;

        stats
            .borrow_mut()
            .pop_front()
            .expect("mock stats should not be empty")
            .map(Cursor::new)
    }
}
