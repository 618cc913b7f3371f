use crate::block::Block;
use crate::codec::{BlocksMeta, HEADER_SIZE, META_BLOCK_SIZE};
use crate::config::Options;
use dumbfs::{BlockId, BlockLayer, BlockSize, Error, ReadWriteAt, Result};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace, warn};

/// A sequential block allocator over a store.
///
/// The allocator hands out blocks one after another and never reuses space. Its only state is the
/// allocation cursor, which lives in the metadata block at raw offset 0 of the store so that the
/// layout survives reopening. It does not remember which ids it handed out: [`Blocks::get`]
/// trusts whatever header it finds at the given offset.
#[derive(Debug)]
pub struct Blocks<S> {
    store: S,
    /// The metadata block at raw offset 0.
    meta: Block<S>,
    /// Raw offset of the next allocation, guarded for the whole allocation.
    next: Mutex<u64>,
    options: Options,
}

impl<S: ReadWriteAt + Clone> Blocks<S> {
    /// Format a new allocator on the store with the default options.
    pub fn new(store: S) -> Result<Self> {
        Self::new_with_options(store, Options::default())
    }

    /// Format a new allocator on the store. This overwrites the start of the store with the
    /// metadata block and reserves that block's space.
    pub fn new_with_options(store: S, options: Options) -> Result<Self> {
        debug!("formatting block allocator");

        let meta = Block::format(store.clone(), 0, META_BLOCK_SIZE)?;
        let blocks = Self {
            store,
            meta,
            next: Mutex::new(0),
            options,
        };

        {
            let mut next = blocks.lock();
            blocks.allocate_locked(&mut next, META_BLOCK_SIZE)?;
        }

        Ok(blocks)
    }

    /// Open an existing allocator on the store with the default options.
    pub fn open(store: S) -> Result<Self> {
        Self::open_with_options(store, Options::default())
    }

    /// Open an existing allocator on the store. Fails with [`Error::EndOfData`] if the store was
    /// never formatted.
    pub fn open_with_options(store: S, options: Options) -> Result<Self> {
        let meta = Block::open(store.clone(), 0)?;
        let BlocksMeta { next } = BlocksMeta::read(&meta)?;
        debug!(next, "opened block allocator");

        Ok(Self {
            store,
            meta,
            next: Mutex::new(next),
            options,
        })
    }

    /// Allocate a new block that takes `size` bytes of space. Note that due to the block header
    /// the usable size will be `size - HEADER_SIZE`.
    ///
    /// If the cursor was persisted but writing the new block's header fails, the space stays
    /// reserved and its id is not reported.
    pub fn allocate(&self, size: BlockSize) -> Result<(BlockId, Block<S>)> {
        let mut next = self.lock();
        self.allocate_locked(&mut next, size)
    }

    /// Open the block with the given id. The id is not checked against previous allocations.
    pub fn get(&self, id: BlockId) -> Result<Block<S>> {
        Block::open(self.store.clone(), id.offset())
    }

    /// Raw offset of the next allocation.
    pub fn next(&self) -> u64 {
        *self.lock()
    }

    /// The store the allocator lives on.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        // the cursor only changes after the metadata was persisted, so a poisoned value is
        // still a consistent one.
        self.next.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the cursor, persist it and format the new block. The metadata is written before the
    /// block header: a crash in between leaves the space reserved but the block unreadable, it
    /// never leads to handing out the same offset twice.
    fn allocate_locked(&self, next: &mut u64, size: BlockSize) -> Result<(BlockId, Block<S>)> {
        if size < HEADER_SIZE {
            return Err(Error::InvalidSize(size));
        }

        let offset = *next;
        let advanced = offset
            .checked_add(size as u64)
            .ok_or(Error::OutOfSpace {
                offset,
                len: size as usize,
                capacity: u64::MAX,
            })?;

        self.write_meta(advanced).map_err(|err| {
            warn!(offset, size, "failed to persist the allocation cursor: {}", err);
            err
        })?;
        *next = advanced;

        let blk = Block::format(self.store.clone(), offset, size)?;
        trace!(offset, size, next = advanced, "allocated block");

        Ok((BlockId(offset), blk))
    }

    fn write_meta(&self, next: u64) -> Result<()> {
        BlocksMeta { next }.write(&self.meta)?;

        if self.options.sync_metadata {
            self.store.flush()?;
        }

        Ok(())
    }
}

impl<S: ReadWriteAt + Clone> BlockLayer for Blocks<S> {
    type Block = Block<S>;

    fn get(&self, id: BlockId) -> Result<Block<S>> {
        Blocks::get(self, id)
    }

    fn allocate(&self, size: BlockSize) -> Result<(BlockId, Block<S>)> {
        Blocks::allocate(self, size)
    }
}
