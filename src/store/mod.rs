//! Stores the block layer can live on: a heap buffer, a regular file and a memory map.

mod file;
mod mem;
mod mmap;

pub use file::FileStore;
pub use mem::MemStore;
pub use mmap::MmapStore;
