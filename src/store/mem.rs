use crate::{Error, ReadWriteAt, Result};
use std::sync::{PoisonError, RwLock};

/// A store that keeps everything in the heap and grows on every write past its end.
#[derive(Debug, Default)]
pub struct MemStore {
    data: RwLock<Vec<u8>>,
}

impl MemStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length of the store in bytes.
    pub fn len(&self) -> u64 {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the whole store.
    pub fn snapshot(&self) -> Vec<u8> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consume the store and return the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Vec<u8>> for MemStore {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

impl ReadWriteAt for MemStore {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);

        let start = match usize::try_from(offset) {
            Ok(start) if start < data.len() => start,
            _ => return Err(Error::EndOfData(0)),
        };

        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);

        if n < buf.len() {
            Err(Error::EndOfData(n))
        } else {
            Ok(n)
        }
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize> {
        let too_large = || Error::OutOfSpace {
            offset,
            len: buf.len(),
            capacity: usize::MAX as u64,
        };

        let start = usize::try_from(offset).map_err(|_| too_large())?;
        let end = start.checked_add(buf.len()).ok_or_else(too_large)?;

        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        if end > data.len() {
            data.resize(end, 0);
        }

        data[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }
}
