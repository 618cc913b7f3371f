use dumbfs::{Error, ReadWriteAt, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// A reader over a store. Keeps an offset and reads off the store consecutively.
pub struct StoreReader<'s, S: ?Sized> {
    store: &'s S,
    start: u64,
    offset: u64,
    /// The last medium failure, kept so it can be handed back to the caller untranslated.
    error: Option<Error>,
}

impl<'s, S: ReadWriteAt + ?Sized> StoreReader<'s, S> {
    /// Create a new reader that reads from the given offset forward.
    pub fn new(store: &'s S, offset: u64) -> Self {
        Self {
            store,
            start: offset,
            offset,
            error: None,
        }
    }

    /// Number of bytes read so far.
    pub fn consumed(&self) -> usize {
        (self.offset - self.start) as usize
    }

    /// Take the medium failure that interrupted the last read, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

impl<S: ReadWriteAt + ?Sized> io::Read for StoreReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.store.read_at(buf, self.offset) {
            // a short read is reported the std way: by the returned count alone.
            Ok(n) | Err(Error::EndOfData(n)) => {
                self.offset += n as u64;
                Ok(n)
            }
            Err(err) => {
                let io_err = io::Error::new(io::ErrorKind::Other, err.to_string());
                self.error = Some(err);
                Err(io_err)
            }
        }
    }
}

/// A writer to a store. Keeps an offset and writes to the store consecutively.
pub struct StoreWriter<'s, S: ?Sized> {
    store: &'s S,
    start: u64,
    offset: u64,
    error: Option<Error>,
}

impl<'s, S: ReadWriteAt + ?Sized> StoreWriter<'s, S> {
    /// Create a new writer that writes from the given offset forward.
    pub fn new(store: &'s S, offset: u64) -> Self {
        Self {
            store,
            start: offset,
            offset,
            error: None,
        }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        (self.offset - self.start) as usize
    }

    /// Take the medium failure that interrupted the last write, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

impl<S: ReadWriteAt + ?Sized> io::Write for StoreWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.store.write_at(buf, self.offset) {
            Ok(n) | Err(Error::EndOfData(n)) => {
                self.offset += n as u64;
                Ok(n)
            }
            Err(err) => {
                let io_err = io::Error::new(io::ErrorKind::Other, err.to_string());
                self.error = Some(err);
                Err(io_err)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        // Noop, durability is up to the store.
        Ok(())
    }
}

/// Map a codec failure to the error taxonomy of the block layer. Running out of bytes in either
/// direction is an end-of-data condition after `transferred` bytes.
fn map_codec_error(err: bincode::Error, transferred: usize) -> Error {
    match *err {
        bincode::ErrorKind::Io(e)
            if matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero
            ) =>
        {
            Error::EndOfData(transferred)
        }
        bincode::ErrorKind::Io(e) => Error::Io(e),
        other => Error::Io(io::Error::new(io::ErrorKind::InvalidData, other)),
    }
}

/// Reads and decodes a struct from the store at the given offset.
pub fn read_struct<S, T>(store: &S, offset: u64) -> Result<T>
where
    S: ReadWriteAt + ?Sized,
    T: DeserializeOwned,
{
    let mut reader = StoreReader::new(store, offset);
    match bincode::deserialize_from(&mut reader) {
        Ok(t) => Ok(t),
        Err(err) => Err(reader
            .take_error()
            .unwrap_or_else(|| map_codec_error(err, reader.consumed()))),
    }
}

/// Encodes and writes a struct to the store at the given offset.
pub fn write_struct<S, T>(store: &S, offset: u64, t: &T) -> Result<()>
where
    S: ReadWriteAt + ?Sized,
    T: Serialize,
{
    let mut writer = StoreWriter::new(store, offset);
    match bincode::serialize_into(&mut writer, t) {
        Ok(()) => Ok(()),
        Err(err) => Err(writer
            .take_error()
            .unwrap_or_else(|| map_codec_error(err, writer.written()))),
    }
}
