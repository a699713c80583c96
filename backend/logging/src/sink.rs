//! The log file handle shared between the file sink and [`crate::Logger::close`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use crate::error::{LoggerError, Result};

type Handle = Option<BufWriter<File>>;

/// Append-only log file.
///
/// Every write takes the inner lock, so records from concurrent log calls
/// never interleave. The buffer only joins the pieces of one record; each
/// write is flushed to the OS before the lock is released. Once closed,
/// writes are accepted and discarded.
#[derive(Debug, Clone)]
pub(crate) struct LogFile {
    inner: Arc<Mutex<Handle>>,
}

impl LogFile {
    /// Create missing parent directories, then open `path` for appending.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| LoggerError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o660);
        }
        let file = options.open(path).map_err(|source| LoggerError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
        })
    }

    pub(crate) fn is_open(&self) -> bool {
        self.handle().is_some()
    }

    /// Push buffered records to the OS and the OS copy to stable storage.
    pub(crate) fn sync(&self) -> io::Result<()> {
        match self.handle().as_mut() {
            Some(writer) => {
                writer.flush()?;
                writer.get_ref().sync_all()
            }
            None => Ok(()),
        }
    }

    /// Release the file. Fails if it was already released or if the
    /// remaining buffer can not be written out.
    pub(crate) fn close(&self) -> Result<()> {
        let writer = self.handle().take().ok_or(LoggerError::AlreadyClosed)?;
        let file = writer
            .into_inner()
            .map_err(|err| LoggerError::Close(err.into_error()))?;
        drop(file);
        Ok(())
    }

    fn handle(&self) -> MutexGuard<'_, Handle> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.handle().as_mut() {
            Some(writer) => {
                let written = writer.write(buf)?;
                writer.flush()?;
                Ok(written)
            }
            None => Ok(buf.len()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self.handle().as_mut() {
            Some(writer) => {
                writer.write_all(buf)?;
                writer.flush()
            }
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.handle().as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.log");
        let file = LogFile::open(&path).unwrap();
        assert!(file.is_open());
        assert!(path.exists());
    }

    #[test]
    fn appends_to_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        fs::write(&path, "first\n").unwrap();

        let mut file = LogFile::open(&path).unwrap();
        file.write_all(b"second\n").unwrap();
        file.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn records_reach_the_file_before_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut file = LogFile::open(&path).unwrap();

        file.write_all(b"record\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "record\n");

        file.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "record\n");
    }

    #[test]
    fn writes_after_close_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut file = LogFile::open(&path).unwrap();
        file.close().unwrap();

        file.write_all(b"late\n").unwrap();
        assert!(!file.is_open());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn second_close_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = LogFile::open(&dir.path().join("out.log")).unwrap();
        file.close().unwrap();
        assert!(matches!(file.close(), Err(LoggerError::AlreadyClosed)));
    }

    #[test]
    fn reports_directory_creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = LogFile::open(&blocker.join("sub").join("out.log")).unwrap_err();
        assert!(matches!(err, LoggerError::CreateDir { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = LogFile::open(dir.path()).unwrap_err();
        assert!(matches!(err, LoggerError::Open { .. }));
    }
}
