use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Size of a block in bytes. Depending on the context this is the raw extent with the header
/// included, as passed to `allocate`, or the usable payload size of an opened block.
pub type BlockSize = u32;

/// A positioned byte medium: both a reader-at and a writer-at.
///
/// A read that can not fill the entire buffer must return [`Error::EndOfData`] carrying the
/// number of bytes it did copy; a partial copy is a valid outcome, not a failure. A write that the
/// medium can not accept must fail with an error other than [`Error::EndOfData`].
///
/// [`Error::EndOfData`]: crate::Error::EndOfData
pub trait ReadWriteAt: Send + Sync {
    /// Read `buf.len()` bytes starting at the given offset.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Write the entire `data` starting at the given offset.
    fn write_at(&self, data: &[u8], offset: u64) -> Result<usize>;

    /// Make the previous writes durable. Mediums without a notion of durability do nothing.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: ReadWriteAt + ?Sized> ReadWriteAt for &T {
    #[inline]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    #[inline]
    fn write_at(&self, data: &[u8], offset: u64) -> Result<usize> {
        (**self).write_at(data, offset)
    }

    #[inline]
    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: ReadWriteAt + ?Sized> ReadWriteAt for Arc<T> {
    #[inline]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    #[inline]
    fn write_at(&self, data: &[u8], offset: u64) -> Result<usize> {
        (**self).write_at(data, offset)
    }

    #[inline]
    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: ReadWriteAt + ?Sized> ReadWriteAt for Box<T> {
    #[inline]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    #[inline]
    fn write_at(&self, data: &[u8], offset: u64) -> Result<usize> {
        (**self).write_at(data, offset)
    }

    #[inline]
    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

/// Identifies a block: the raw offset in the store where the block's header starts.
///
/// The block layer does not keep track of the ids it handed out, callers have to persist them.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl BlockId {
    /// The raw offset of the block.
    #[inline]
    pub fn offset(self) -> u64 {
        self.0
    }
}

impl From<u64> for BlockId {
    fn from(offset: u64) -> Self {
        BlockId(offset)
    }
}

impl From<BlockId> for u64 {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The block layer of the file system.
pub trait BlockLayer {
    type Block: ReadWriteAt;

    /// Open the block with the given id.
    fn get(&self, id: BlockId) -> Result<Self::Block>;

    /// Allocate a new block that takes `size` bytes of space, header included.
    fn allocate(&self, size: BlockSize) -> Result<(BlockId, Self::Block)>;
}
