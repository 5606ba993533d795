//! Size-based rotating log file
//!
//! Once writing a record would push the active file past `max_bytes`, the
//! file is renamed to `<name>.1`, older backups shift up by one and the
//! oldest beyond `backups` is discarded. With `backups == 0` the active file
//! is truncated instead.

use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug)]
struct RotatingState {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups > 0 {
            for index in (1..self.backups).rev() {
                let from = backup_path(&self.path, index);
                if from.exists() {
                    fs::rename(&from, backup_path(&self.path, index + 1))?;
                }
            }
            fs::rename(&self.path, backup_path(&self.path, 1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;

        Ok(())
    }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Shared handle to the active log file; clones write to the same file.
#[derive(Debug, Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<RotatingState>>,
}

impl RotatingFileWriter {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            state: Arc::new(Mutex::new(RotatingState {
                path,
                file,
                written,
                max_bytes,
                backups,
            })),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }
}

/// Holds the file lock for the duration of one formatted record.
pub struct RotatingWriterGuard<'a> {
    state: MutexGuard<'a, RotatingState>,
}

impl Write for RotatingWriterGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let state = &mut *self.state;
        if state.written > 0 && state.written + buf.len() as u64 > state.max_bytes {
            state.rotate()?;
        }

        let written = state.file.write(buf)?;
        state.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            state: self.state.lock(),
        }
    }
}
