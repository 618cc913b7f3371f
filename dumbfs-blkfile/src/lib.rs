//! The block layer of dumbfs.
//!
//! A [`Block`] is a header tagged region of a store with bounded read and write access, and
//! [`Blocks`] hands out new blocks one after another while persisting its allocation cursor in a
//! metadata block at the start of the store.
//!
//! ```
//! use dumbfs::MemStore;
//! use dumbfs_blkfile::Blocks;
//!
//! let store = MemStore::new();
//! let blocks = Blocks::new(&store)?;
//! let (id, blk) = blocks.allocate(1024)?;
//! blk.write_at(b"test", 0)?;
//!
//! let blocks = Blocks::open(&store)?;
//! let mut buf = [0; 4];
//! blocks.get(id)?.read_at(&mut buf, 0)?;
//! # Ok::<(), dumbfs::Error>(())
//! ```

mod block;
mod blocks;
pub mod codec;
mod config;
mod utils;

#[cfg(test)]
mod mock;

pub use block::Block;
pub use blocks::Blocks;
pub use codec::{HEADER_SIZE, META_SIZE};
pub use config::Options;
pub use utils::{StoreReader, StoreWriter};
