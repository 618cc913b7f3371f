//! The dumb file system.
//!
//! This crate holds the interfaces shared by the layers of the file system together with a few
//! [`ReadWriteAt`] stores to put them on. The block layer itself lives in `dumbfs-blkfile`.

mod error;
mod interface;
pub mod store;

pub use error::{Error, Result};
pub use interface::*;
pub use store::{FileStore, MemStore, MmapStore};
