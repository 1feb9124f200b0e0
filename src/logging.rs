use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// a log target that holds records in memory.
///
/// while the ui owns the terminal nothing else may write to it, so records are kept here and
/// written out by [`HeldLog::release()`] once the terminal has been restored.
#[derive(Clone, Debug, Default)]
pub struct HeldLog {
    records: Arc<Mutex<Vec<u8>>>,
}

// === impl HeldLog ===

impl HeldLog {
    /// writes every held record to `out`, emptying the buffer.
    pub fn release(&self, out: &mut impl Write) -> io::Result<()> {
        let records = std::mem::take(&mut *self.lock());
        out.write_all(&records)?;
        out.flush()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // a panic mid-write leaves at worst a truncated record.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for HeldLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
