//! The on-disk formats of the block layer.
//!
//! Every block starts with a [`BlockHeader`]: its raw size, payload plus header, as a little-endian
//! `u32`. The block at raw offset 0 belongs to the allocator, its payload is a [`BlocksMeta`]: the
//! allocation cursor as a little-endian `u64`, overwritten in place on every allocation.

use crate::utils::{read_struct, write_struct};
use dumbfs::{BlockSize, ReadWriteAt, Result};
use serde::{Deserialize, Serialize};

/// Size of the header of each block in bytes.
pub const HEADER_SIZE: BlockSize = 4;

/// Size of the allocator's metadata, the payload of the block at raw offset 0.
pub const META_SIZE: BlockSize = 8;

/// Raw size of the allocator's metadata block.
pub const META_BLOCK_SIZE: BlockSize = META_SIZE + HEADER_SIZE;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// The raw size of the block, this header included.
    pub raw_size: BlockSize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksMeta {
    /// Raw offset of the next block to be allocated.
    pub next: u64,
}

impl BlockHeader {
    /// Read the header stored at the given raw offset.
    pub fn read<S: ReadWriteAt + ?Sized>(store: &S, raw_offset: u64) -> Result<Self> {
        read_struct(store, raw_offset)
    }

    /// Write this header at the given raw offset.
    pub fn write<S: ReadWriteAt + ?Sized>(&self, store: &S, raw_offset: u64) -> Result<()> {
        write_struct(store, raw_offset, self)
    }

    /// The usable size of a block with this header. Headers smaller than themselves describe an
    /// empty block.
    pub fn payload_size(&self) -> BlockSize {
        self.raw_size.saturating_sub(HEADER_SIZE)
    }
}

impl BlocksMeta {
    /// Read the metadata from the start of the given store, usually the metadata block.
    pub fn read<S: ReadWriteAt + ?Sized>(store: &S) -> Result<Self> {
        read_struct(store, 0)
    }

    /// Overwrite the metadata at the start of the given store.
    pub fn write<S: ReadWriteAt + ?Sized>(&self, store: &S) -> Result<()> {
        write_struct(store, 0, self)
    }
}
