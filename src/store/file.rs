use crate::{Error, ReadWriteAt, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::debug;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::os::unix::fs::FileExt;

        fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
            file.read_at(buf, offset)
        }

        fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
            file.write_at(buf, offset)
        }
    } else if #[cfg(windows)] {
        use std::os::windows::fs::FileExt;

        fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
            file.seek_read(buf, offset)
        }

        fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
            file.seek_write(buf, offset)
        }
    }
}

/// A store backed by a regular file. The file grows as blocks are written past its end, and is
/// bounded only by the file system it lives on.
#[derive(Debug)]
pub struct FileStore {
    file: File,
}

impl FileStore {
    /// Open an existing file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening file store at {:?}", path);
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Create a file for reading and writing, truncating it if it already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("creating file store at {:?}", path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Current length of the file in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl From<File> for FileStore {
    fn from(file: File) -> Self {
        Self { file }
    }
}

impl ReadWriteAt for FileStore {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut n = 0;

        while n < buf.len() {
            match pread(&self.file, &mut buf[n..], offset + n as u64) {
                Ok(0) => return Err(Error::EndOfData(n)),
                Ok(read) => n += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(n)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize> {
        let mut n = 0;

        while n < buf.len() {
            match pwrite(&self.file, &buf[n..], offset + n as u64) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )
                    .into())
                }
                Ok(written) => n += written,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(n)
    }

    fn flush(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
