use std::io;
use thiserror::Error;

/// A possible error value when dealing with a store or a block on top of it.
#[derive(Debug, Error)]
pub enum Error {
    /// The end of a block or of the store was reached. The value is the number of bytes that were
    /// transferred before hitting the boundary.
    #[error("end of data after {0} bytes")]
    EndOfData(usize),
    /// A fixed capacity medium can not take the write.
    #[error("out of space: writing {len} bytes at {offset} exceeds capacity of {capacity} bytes")]
    OutOfSpace { offset: u64, len: usize, capacity: u64 },
    /// Any other failure reported by the medium.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The requested raw block size can't even hold the block header.
    #[error("invalid block size {0}")]
    InvalidSize(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Returns true if this is an end-of-data signal rather than a medium failure.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::EndOfData(_))
    }

    /// Returns the number of bytes moved before the error was raised.
    pub fn transferred(&self) -> usize {
        match self {
            Error::EndOfData(n) => *n,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_data() {
        let err = Error::EndOfData(2);
        assert!(err.is_end_of_data());
        assert_eq!(err.transferred(), 2);
        assert_eq!(err.to_string(), "end of data after 2 bytes");
    }

    #[test]
    fn medium_failure() {
        let err = Error::from(io::Error::new(io::ErrorKind::Other, "broken disk"));
        assert!(!err.is_end_of_data());
        assert_eq!(err.transferred(), 0);
        assert_eq!(err.to_string(), "broken disk");

        let err = Error::OutOfSpace {
            offset: 8,
            len: 4,
            capacity: 10,
        };
        assert!(!err.is_end_of_data());
    }
}
