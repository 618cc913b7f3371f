use crate::codec::{BlockHeader, HEADER_SIZE};
use dumbfs::{BlockSize, Error, ReadWriteAt, Result};
use tracing::trace;

/// A bounded view over a region of a store, tagged on disk with a header that records the raw size
/// of the region.
///
/// The block does not own the store, `S` is a shared handle such as `&T`, `Arc<T>` or another
/// block. Reads and writes never cross the end of the block: requests that extend past it are
/// clamped and, after the in-bounds part was transferred, reported as [`Error::EndOfData`].
#[derive(Debug, Clone)]
pub struct Block<S> {
    store: S,
    /// Position of the payload in the store, right after the header.
    offset: u64,
    /// Usable size of the payload.
    size: BlockSize,
}

impl<S: ReadWriteAt> Block<S> {
    /// Open the block whose header starts at the given raw offset.
    pub fn open(store: S, raw_offset: u64) -> Result<Self> {
        let header = BlockHeader::read(&store, raw_offset)?;
        trace!(raw_offset, raw_size = header.raw_size, "opened block");

        Ok(Self {
            store,
            offset: raw_offset + HEADER_SIZE as u64,
            size: header.payload_size(),
        })
    }

    /// Format a new block of `raw_size` bytes at the given raw offset. The raw size includes the
    /// header, so the usable size of the block is `raw_size - HEADER_SIZE`.
    pub fn format(store: S, raw_offset: u64, raw_size: BlockSize) -> Result<Self> {
        if raw_size < HEADER_SIZE {
            return Err(Error::InvalidSize(raw_size));
        }

        BlockHeader { raw_size }.write(&store, raw_offset)?;
        trace!(raw_offset, raw_size, "formatted block");

        Ok(Self {
            store,
            offset: raw_offset + HEADER_SIZE as u64,
            size: raw_size - HEADER_SIZE,
        })
    }

    /// Create a view over `[offset, offset + size)` of the store without reading or writing any
    /// header. `offset` must leave room for a header in front of it and `size` must fit a raw
    /// size, like for every block that [`Block::open`] and [`Block::format`] return.
    #[cfg(test)]
    pub(crate) fn from_parts(store: S, offset: u64, size: BlockSize) -> Self {
        debug_assert!(offset >= HEADER_SIZE as u64);
        debug_assert!(size <= BlockSize::MAX - HEADER_SIZE);

        Self {
            store,
            offset,
            size,
        }
    }

    /// Read into `buf` starting at `off` bytes into the payload.
    pub fn read_at(&self, buf: &mut [u8], off: u64) -> Result<usize> {
        let (len, clamped) = self.clamp(buf.len(), off)?;
        let n = self.store.read_at(&mut buf[..len], self.offset + off)?;

        // the caller wanted to read beyond the end of the block.
        if clamped {
            return Err(Error::EndOfData(n));
        }

        Ok(n)
    }

    /// Write `data` starting at `off` bytes into the payload.
    pub fn write_at(&self, data: &[u8], off: u64) -> Result<usize> {
        let (len, clamped) = self.clamp(data.len(), off)?;

        // failures here only come from the medium, like running out of space.
        let n = self.store.write_at(&data[..len], self.offset + off)?;

        if clamped {
            return Err(Error::EndOfData(n));
        }

        Ok(n)
    }

    /// Returns how many of the `len` requested bytes at `off` fit in the block and whether the
    /// request had to be cut short.
    fn clamp(&self, len: usize, off: u64) -> Result<(usize, bool)> {
        let size = self.size as u64;
        if off >= size {
            return Err(Error::EndOfData(0));
        }

        let max = size - off;
        if (len as u64) > max {
            Ok((max as usize, true))
        } else {
            Ok((len, false))
        }
    }
}

impl<S> Block<S> {
    /// Position of the payload in the store.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Usable size of the block.
    pub fn size(&self) -> BlockSize {
        self.size
    }

    /// Position of the header in the store, which is also the block's id.
    pub fn raw_offset(&self) -> u64 {
        self.offset - HEADER_SIZE as u64
    }

    /// Size of the block including its header.
    pub fn raw_size(&self) -> BlockSize {
        self.size + HEADER_SIZE
    }

    /// The store this block lives on.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ReadWriteAt> ReadWriteAt for Block<S> {
    #[inline]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        Block::read_at(self, buf, offset)
    }

    #[inline]
    fn write_at(&self, data: &[u8], offset: u64) -> Result<usize> {
        Block::write_at(self, data, offset)
    }

    fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStore;
    use dumbfs::{MemStore, MmapStore};

    fn block(store: &MockStore) -> Block<&MockStore> {
        Block::from_parts(store, HEADER_SIZE as u64, 1 << 10)
    }

    #[test]
    fn set_then_get() {
        let store = MockStore::default();
        let blk = block(&store);
        assert_eq!(blk.write_at(b"test", 0).unwrap(), 4);

        let mut buf = [0; 4];
        assert_eq!(blk.read_at(&mut buf, 0).unwrap(), 4);
        assert_eq!(&buf, b"test");
    }

    #[test]
    fn set_long_then_get_short() {
        let store = MockStore::default();
        let blk = block(&store);
        assert_eq!(blk.write_at(b"testtest", 0).unwrap(), 8);

        let mut buf = [0; 4];
        assert_eq!(blk.read_at(&mut buf, 0).unwrap(), 4);
        assert_eq!(&buf, b"test");
    }

    #[test]
    fn write_over_block_end() {
        let store = MockStore::default();
        let blk = block(&store);

        let err = blk.write_at(b"test", (1 << 10) - 2).unwrap_err();
        assert!(matches!(err, Error::EndOfData(2)));

        let mut buf = [0; 4];
        let err = blk.read_at(&mut buf, (1 << 10) - 2).unwrap_err();
        assert!(matches!(err, Error::EndOfData(2)));
        assert_eq!(&buf[..2], b"te");

        // only the in-bounds prefix reached the store.
        assert_eq!(store.inner().len(), (1 << 10) + HEADER_SIZE as u64);
    }

    #[test]
    fn write_after_block_end() {
        let store = MockStore::default();
        let blk = block(&store);

        let err = blk.write_at(b"test", (1 << 10) + 2).unwrap_err();
        assert!(matches!(err, Error::EndOfData(0)));
        let err = blk.write_at(b"test", 1 << 10).unwrap_err();
        assert!(matches!(err, Error::EndOfData(0)));

        assert_eq!(store.writes(), 0);
        assert!(store.inner().is_empty());
    }

    #[test]
    fn read_over_inner_end() {
        let store = MockStore::default();
        let blk = block(&store);
        blk.write_at(b"test", 0).unwrap();

        // the block is larger, the store itself runs out of data.
        let mut buf = [0; 4];
        let err = blk.read_at(&mut buf, 2).unwrap_err();
        assert!(matches!(err, Error::EndOfData(2)));
        assert_eq!(&buf[..2], b"st");
    }

    #[test]
    fn read_over_block_end() {
        let store = MockStore::default();
        let blk = block(&store);
        assert_eq!(blk.write_at(&b"test".repeat(1 << 8), 0).unwrap(), 1 << 10);

        let mut buf = [0; 4];
        let err = blk.read_at(&mut buf, (1 << 10) - 2).unwrap_err();
        assert!(matches!(err, Error::EndOfData(2)));
        assert_eq!(&buf[..2], b"st");
    }

    #[test]
    fn read_after_block_end() {
        let store = MockStore::default();
        let blk = block(&store);
        blk.write_at(&b"test".repeat(1 << 8), 0).unwrap();
        let reads = store.reads();

        let mut buf = [0; 4];
        let err = blk.read_at(&mut buf, (1 << 10) + 2).unwrap_err();
        assert!(matches!(err, Error::EndOfData(0)));
        let err = blk.read_at(&mut buf, 1 << 10).unwrap_err();
        assert!(matches!(err, Error::EndOfData(0)));

        assert_eq!(store.reads(), reads);
    }

    #[test]
    fn format_then_open() {
        let store = MemStore::new();
        let blk = Block::format(&store, 100, 1 << 10).unwrap();
        assert_eq!(blk.offset(), 104);
        assert_eq!(blk.size(), (1 << 10) - HEADER_SIZE);
        assert_eq!(blk.raw_offset(), 100);
        assert_eq!(blk.raw_size(), 1 << 10);
        assert_eq!(blk.write_at(b"test", 0).unwrap(), 4);

        let blk2 = Block::open(&store, 100).unwrap();
        assert_eq!(blk2.offset(), blk.offset());
        assert_eq!(blk2.size(), blk.size());

        let mut buf = [0; 4];
        assert_eq!(blk2.read_at(&mut buf, 0).unwrap(), 4);
        assert_eq!(&buf, b"test");
    }

    #[test]
    fn raw_extent_at_the_edges() {
        let store = MemStore::new();
        let blk = Block::format(&store, 0, BlockSize::MAX).unwrap();
        assert_eq!(blk.raw_offset(), 0);
        assert_eq!(blk.raw_size(), BlockSize::MAX);
        assert_eq!(blk.size(), BlockSize::MAX - HEADER_SIZE);

        let blk = Block::open(&store, 0).unwrap();
        assert_eq!(blk.raw_offset(), 0);
        assert_eq!(blk.raw_size(), BlockSize::MAX);

        let blk = Block::format(&store, 0, HEADER_SIZE).unwrap();
        assert_eq!(blk.raw_offset(), 0);
        assert_eq!(blk.raw_size(), HEADER_SIZE);
    }

    #[test]
    fn open_unformatted() {
        let store = MemStore::new();
        assert!(matches!(Block::open(&store, 0), Err(Error::EndOfData(0))));

        let store = MemStore::from(vec![0; 2]);
        assert!(matches!(Block::open(&store, 0), Err(Error::EndOfData(2))));
    }

    #[test]
    fn open_tiny_header() {
        let store = MemStore::from(vec![2, 0, 0, 0, 0xaa]);
        let blk = Block::open(&store, 0).unwrap();
        assert_eq!(blk.size(), 0);

        let mut buf = [0; 1];
        assert!(matches!(blk.read_at(&mut buf, 0), Err(Error::EndOfData(0))));
    }

    #[test]
    fn format_invalid_size() {
        let store = MockStore::default();
        let err = Block::format(&store, 0, HEADER_SIZE - 1).unwrap_err();
        assert!(matches!(err, Error::InvalidSize(3)));
        assert_eq!(store.writes(), 0);

        // a header-only block is valid but has no room for data.
        let blk = Block::format(&store, 0, HEADER_SIZE).unwrap();
        assert!(matches!(blk.write_at(b"x", 0), Err(Error::EndOfData(0))));
    }

    #[test]
    fn format_on_full_medium() {
        let store = MmapStore::anonymous(2).unwrap();
        let err = Block::format(&store, 0, 16).unwrap_err();
        assert!(matches!(err, Error::OutOfSpace { .. }));
    }

    #[test]
    fn medium_failure_wins_over_clamping() {
        // usable size 16 at payload offset 4, but the medium ends at 16.
        let store = MmapStore::anonymous(16).unwrap();
        let blk = Block::format(&store, 0, 20).unwrap();

        let err = blk.write_at(&[1; 20], 0).unwrap_err();
        assert!(matches!(err, Error::OutOfSpace { .. }));

        // the store's own short read is returned as is.
        let mut buf = [0; 20];
        let err = blk.read_at(&mut buf, 0).unwrap_err();
        assert!(matches!(err, Error::EndOfData(12)));
    }

    #[test]
    fn nested_blocks() {
        let store = MemStore::new();
        let outer = Block::format(&store, 0, 64).unwrap();
        let inner = Block::format(outer.clone(), 8, 16).unwrap();
        assert_eq!(inner.offset(), 12);
        assert_eq!(inner.write_at(b"nested", 0).unwrap(), 6);

        // inner payload starts at outer payload offset 12, i.e. store offset 16.
        let mut buf = [0; 6];
        store.read_at(&mut buf, 16).unwrap();
        assert_eq!(&buf, b"nested");

        // the inner block can not escape the outer one.
        let edge = Block::from_parts(outer.clone(), 56, 16);
        let err = edge.write_at(&[0; 10], 0).unwrap_err();
        assert!(matches!(err, Error::EndOfData(4)));
    }
}
