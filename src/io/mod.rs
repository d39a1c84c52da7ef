//! Byte-addressable data sources backing raw views.
//!
//! Every view ultimately reads from a `DataSource`. Two implementations are
//! provided: `ByteSource` over a reference-counted `Bytes` buffer and
//! `MappedFile`, a read-only memory map that refuses files above the
//! configured size limit.

pub mod error;

use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024, // 512MB
        }
    }
}

/// Read interface over a contiguous blob of bytes.
pub trait DataSource: Send + Sync {
    /// The full contents.
    fn as_slice(&self) -> &[u8];

    /// Human-readable origin used in logs.
    fn description(&self) -> String;

    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Copy bytes at `offset` into `buf`, returning the number copied.
    /// Reads past the end are truncated; a read starting past the end copies nothing.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        let data = self.as_slice();
        let Ok(start) = usize::try_from(offset) else {
            return 0;
        };
        if start >= data.len() {
            return 0;
        }
        let end = std::cmp::min(data.len(), start.saturating_add(buf.len()));
        let n = end - start;
        buf[..n].copy_from_slice(&data[start..end]);
        trace!(offset, len = n, "Performed read");
        n
    }
}

/// In-memory data source.
#[derive(Clone)]
pub struct ByteSource {
    data: Bytes,
    label: String,
}

impl ByteSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            label: "<memory>".to_string(),
        }
    }

    pub fn with_label(data: impl Into<Bytes>, label: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            label: label.into(),
        }
    }

    /// A cheap clone of the underlying buffer.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSource")
            .field("label", &self.label)
            .field("len", &self.data.len())
            .finish()
    }
}

impl DataSource for ByteSource {
    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

/// A read-only memory-mapped file.
pub struct MappedFile {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl MappedFile {
    /// Opens and maps a file, failing if it exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening file for mapping"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; callers must not truncate it while mapped.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.file_size
    }
}

impl fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("size", &self.file_size)
            .finish()
    }
}

impl DataSource for MappedFile {
    fn as_slice(&self) -> &[u8] {
        match &self.mmap {
            Some(m) => &m[..],
            None => &[],
        }
    }

    fn description(&self) -> String {
        self.path.display().to_string()
    }
}
