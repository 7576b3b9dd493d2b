//! Deterministic tar.gz archive writer.
//!
//! Output is byte-identical for identical contents and timestamp:
//! - entries are written in byte-wise lexicographic path order
//! - every header has mode 0644, regular type, uid/gid 0, no user/group
//!   names, and mtime/atime/ctime pinned to the supplied timestamp
//! - gzip runs at a fixed level with a zeroed header mtime and no file name

use crate::layout::{archive_file_name, entry_name};
use crate::{BundleError, Result};
use chrono::{DateTime, Utc};
use flate2::{Compression, GzBuilder};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header, HeaderMode};
use tracing::{debug, info};

/// Fixed gzip compression level.
pub const COMPRESSION_LEVEL: u32 = 9;

/// Permission bits for every archived file.
pub const ENTRY_MODE: u32 = 0o644;

/// gzip "unknown" operating system byte, independent of the build host.
const GZIP_OS_UNKNOWN: u8 = 255;

/// Buffers named payloads and serializes them into one compressed archive.
#[derive(Debug)]
pub struct ArchiveWriter {
    root_dir: String,
    timestamp: DateTime<Utc>,
    // Keyed by path: iteration is already byte-wise sorted.
    files: BTreeMap<String, Vec<u8>>,
}

impl ArchiveWriter {
    /// Create a writer whose entries live under `root_dir`.
    pub fn new(root_dir: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            root_dir: root_dir.into(),
            timestamp,
            files: BTreeMap::new(),
        }
    }

    /// Buffer a file. `path` is relative to the root directory; adding the
    /// same path again replaces the earlier content.
    pub fn add_file(&mut self, path: impl Into<String>, content: Vec<u8>) {
        let path = path.into();
        debug!(path = %path, bytes = content.len(), "Buffered archive entry");
        self.files.insert(path, content);
    }

    /// Root directory name inside the archive.
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Buffered paths in the order they will be written.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of buffered files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total uncompressed size of buffered contents.
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|data| data.len() as u64).sum()
    }

    fn header_for(&self, size: u64) -> Header {
        // Pre-epoch timestamps cannot be represented in a tar header.
        let secs = u64::try_from(self.timestamp.timestamp()).unwrap_or(0);

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(size);
        header.set_mode(ENTRY_MODE);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(secs);
        if let Some(gnu) = header.as_gnu_mut() {
            gnu.set_atime(secs);
            gnu.set_ctime(secs);
        }
        header
    }

    /// Serialize all buffered files into `writer` and return it.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<W> {
        let encoder = GzBuilder::new()
            .mtime(0)
            .operating_system(GZIP_OS_UNKNOWN)
            .write(writer, Compression::new(COMPRESSION_LEVEL));

        let mut tar = Builder::new(encoder);
        tar.mode(HeaderMode::Deterministic);

        for (path, data) in &self.files {
            let name = entry_name(&self.root_dir, path);
            let mut header = self.header_for(data.len() as u64);
            tar.append_data(&mut header, &name, data.as_slice())
                .map_err(|e| BundleError::archive(&name, e))?;
        }

        let encoder = tar
            .into_inner()
            .map_err(|e| BundleError::archive(&self.root_dir, e))?;
        encoder
            .finish()
            .map_err(|e| BundleError::archive(&self.root_dir, e))
    }

    /// Serialize into memory.
    pub fn write_to_vec(&self) -> Result<Vec<u8>> {
        self.write_to(Vec::new())
    }

    /// Write `<output_dir>/<root_dir>.tar.gz`.
    ///
    /// The archive is staged in a temporary file in `output_dir` and renamed
    /// into place only once complete, so a failure never leaves a partial
    /// archive at the final path. Returns the absolute archive path and the
    /// total uncompressed content size.
    pub fn write_to_disk(&self, output_dir: &Path) -> Result<(PathBuf, u64)> {
        std::fs::create_dir_all(output_dir).map_err(|e| BundleError::archive(output_dir, e))?;

        let target = output_dir.join(archive_file_name(&self.root_dir));
        let archive_path =
            std::path::absolute(&target).map_err(|e| BundleError::archive(&target, e))?;

        let staged = tempfile::Builder::new()
            .prefix(".fdb-")
            .suffix(".partial")
            .tempfile_in(output_dir)
            .map_err(|e| BundleError::archive(output_dir, e))?;

        let staged = self
            .write_to(BufWriter::new(staged))?
            .into_inner()
            .map_err(|e| BundleError::archive(&archive_path, e.into_error()))?;

        staged
            .as_file()
            .sync_all()
            .map_err(|e| BundleError::archive(&archive_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(ENTRY_MODE))
                .map_err(|e| BundleError::archive(&archive_path, e))?;
        }

        staged
            .persist(&archive_path)
            .map_err(|e| BundleError::archive(&archive_path, e.error))?;

        let total = self.total_bytes();
        info!(
            path = %archive_path.display(),
            files = self.files.len(),
            bytes = total,
            "Archive written"
        );

        Ok((archive_path, total))
    }
}
