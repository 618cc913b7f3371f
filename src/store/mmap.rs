use crate::{Error, ReadWriteAt, Result};
use memmap::MmapMut;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// A fixed capacity store over a memory map. Unlike the other stores it never grows, writes that
/// do not fit fail with [`Error::OutOfSpace`].
#[derive(Debug)]
pub struct MmapStore {
    map: RwLock<MmapMut>,
    capacity: u64,
}

impl MmapStore {
    /// Create (or truncate) the file at the given path, size it to `capacity` bytes and map it.
    pub fn create<P: AsRef<Path>>(path: P, capacity: u64) -> Result<Self> {
        let path = path.as_ref();
        debug!("creating mmap store at {:?} with {} bytes", path, capacity);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(capacity)?;

        // SAFETY: the mapping is only ever accessed through the lock below, modifications of the
        // file by other processes are outside of what this store supports.
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self::from_map(map))
    }

    /// Map an existing file, the capacity is the current length of the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening mmap store at {:?}", path);

        let file = OpenOptions::new().read(true).write(true).open(path)?;

        // SAFETY: see `create`.
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self::from_map(map))
    }

    /// Create a store over an anonymous mapping that is not backed by any file.
    pub fn anonymous(capacity: usize) -> Result<Self> {
        Ok(Self::from_map(MmapMut::map_anon(capacity)?))
    }

    fn from_map(map: MmapMut) -> Self {
        let capacity = map.len() as u64;
        Self {
            map: RwLock::new(map),
            capacity,
        }
    }

    /// The fixed capacity of this store in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl ReadWriteAt for MmapStore {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if offset >= self.capacity {
            return Err(Error::EndOfData(0));
        }

        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        let start = offset as usize;
        let n = buf.len().min(map.len() - start);
        buf[..n].copy_from_slice(&map[start..start + n]);

        if n < buf.len() {
            Err(Error::EndOfData(n))
        } else {
            Ok(n)
        }
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize> {
        let fits = offset
            .checked_add(buf.len() as u64)
            .map_or(false, |end| end <= self.capacity);

        if !fits {
            return Err(Error::OutOfSpace {
                offset,
                len: buf.len(),
                capacity: self.capacity,
            });
        }

        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        let start = offset as usize;
        map[start..start + buf.len()].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()?;
        Ok(())
    }
}
