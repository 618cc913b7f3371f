use dumbfs::{MemStore, ReadWriteAt, Result};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An in-memory store that counts how often it is accessed.
#[derive(Debug, Default)]
pub struct MockStore {
    inner: MemStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    flushes: AtomicUsize,
    /// Reject every write with a medium failure while set.
    fail_writes: AtomicBool,
}

impl MockStore {
    pub fn inner(&self) -> &MemStore {
        &self.inner
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ReadWriteAt for MockStore {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_at(buf, offset)
    }

    fn write_at(&self, data: &[u8], offset: u64) -> Result<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "broken medium").into());
        }
        self.inner.write_at(data, offset)
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        self.inner.flush()
    }
}
