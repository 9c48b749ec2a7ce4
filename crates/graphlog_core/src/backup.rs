//! Backup support: full store copies and incremental replay.
//!
//! A full copy streams every store file, chunk by chunk, to a
//! [`StoreWriter`] and records each file's size and CRC32 in a
//! [`CopyManifest`]. An incremental copy replays the part of a log
//! committed after a known transaction into a store set that already holds
//! the state up to it.
//!
//! ## Usage
//!
//! ```ignore
//! use graphlog_core::backup::{discover_store_files, BackupManager, DirectoryStoreWriter};
//!
//! let files = discover_store_files(source_dir)?;
//! let mut target = DirectoryStoreWriter::new(backup_dir);
//! let manifest = BackupManager::with_defaults().full_copy(&files, &mut target, false)?;
//! ```

use crate::error::{CoreError, CoreResult};
use crate::log::LogManager;
use crate::recovery::{recover, RecoveryStats};
use crate::store::StoreSet;
use crate::types::TransactionId;
use graphlog_storage::{FileBuffer, LogBuffer};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration for backup operations.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Bytes read from a source file per write to the target.
    pub chunk_size: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
        }
    }
}

/// Whether a file holds store records or a transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFileKind {
    /// A record store file.
    Store,
    /// A transaction log file; copied only for forensics.
    Log,
}

/// One named source file of a full copy.
pub struct StoreFile {
    name: String,
    kind: StoreFileKind,
    buffer: Box<dyn LogBuffer>,
}

impl StoreFile {
    /// A record store file.
    pub fn store(name: impl Into<String>, buffer: Box<dyn LogBuffer>) -> Self {
        Self {
            name: name.into(),
            kind: StoreFileKind::Store,
            buffer,
        }
    }

    /// A transaction log file.
    pub fn log(name: impl Into<String>, buffer: Box<dyn LogBuffer>) -> Self {
        Self {
            name: name.into(),
            kind: StoreFileKind::Log,
            buffer,
        }
    }

    /// Name relative to the store directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of file.
    pub fn kind(&self) -> StoreFileKind {
        self.kind
    }
}

impl std::fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFile")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Whether `name` is a transaction log file name.
///
/// Matches `*.log` and rotated logs such as `graph.log.3`.
#[must_use]
pub fn is_log_file_name(name: &str) -> bool {
    name.ends_with(".log") || name.contains(".log.")
}

/// Lists the regular files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory or one of its files cannot be opened.
pub fn discover_store_files(dir: &Path) -> CoreResult<Vec<StoreFile>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let buffer: Box<dyn LogBuffer> = Box::new(FileBuffer::open(&dir.join(&name))?);
            Ok(if is_log_file_name(&name) {
                StoreFile::log(name, buffer)
            } else {
                StoreFile::store(name, buffer)
            })
        })
        .collect()
}

/// Receives the files of a full copy.
///
/// `write` is called one or more times per file, in order; the first call
/// for a name starts that file afresh.
pub trait StoreWriter {
    /// Appends `chunk` to the file `name`.
    fn write(&mut self, name: &str, chunk: &[u8]) -> CoreResult<()>;

    /// Makes every written file durable.
    fn done(&mut self) -> CoreResult<()>;
}

/// Writes copied files into a directory.
#[derive(Debug)]
pub struct DirectoryStoreWriter {
    root: PathBuf,
    files: HashMap<String, FileBuffer>,
}

impl DirectoryStoreWriter {
    /// Writes into `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    /// Target directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StoreWriter for DirectoryStoreWriter {
    fn write(&mut self, name: &str, chunk: &[u8]) -> CoreResult<()> {
        if !self.files.contains_key(name) {
            let mut file = FileBuffer::open_with_create_dirs(&self.root.join(name))?;
            file.truncate(0)?;
            self.files.insert(name.to_owned(), file);
        }
        if let Some(file) = self.files.get_mut(name) {
            file.append(chunk)?;
        }
        Ok(())
    }

    fn done(&mut self) -> CoreResult<()> {
        for (_, mut file) in self.files.drain() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Keeps copied files in memory.
#[derive(Debug, Default)]
pub struct MemoryStoreWriter {
    files: BTreeMap<String, Vec<u8>>,
    started: Vec<String>,
}

impl MemoryStoreWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copied files by name.
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// Contents of one copied file.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }
}

impl StoreWriter for MemoryStoreWriter {
    fn write(&mut self, name: &str, chunk: &[u8]) -> CoreResult<()> {
        if !self.started.iter().any(|started| started == name) {
            self.started.push(name.to_owned());
            self.files.insert(name.to_owned(), Vec::new());
        }
        self.files
            .entry(name.to_owned())
            .or_default()
            .extend_from_slice(chunk);
        Ok(())
    }

    fn done(&mut self) -> CoreResult<()> {
        self.started.clear();
        Ok(())
    }
}

/// A file included in a full copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    /// Name relative to the store directory.
    pub name: String,
    /// Bytes copied.
    pub size: u64,
    /// CRC32 of the copied bytes.
    pub crc32: u32,
    /// Kind of file.
    pub kind: StoreFileKind,
}

/// What a full copy wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyManifest {
    /// Copied files, in copy order.
    pub files: Vec<CopiedFile>,
}

impl CopyManifest {
    /// Total bytes copied.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }

    /// Looks up a copied file by name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&CopiedFile> {
        self.files.iter().find(|file| file.name == name)
    }

    /// Checks `data` against the recorded checksum of `name`.
    ///
    /// # Errors
    ///
    /// [`CoreError::ChecksumMismatch`] if the contents differ, or
    /// [`CoreError::InvalidOperation`] if `name` was not copied.
    pub fn verify(&self, name: &str, data: &[u8]) -> CoreResult<()> {
        let file = self
            .file(name)
            .ok_or_else(|| CoreError::invalid_operation(format!("{name} is not in the manifest")))?;
        let actual = crc32fast::hash(data);
        if actual != file.crc32 || data.len() as u64 != file.size {
            return Err(CoreError::ChecksumMismatch {
                file: name.to_owned(),
                expected: file.crc32,
                actual,
            });
        }
        Ok(())
    }
}

/// Runs full and incremental copies.
#[derive(Debug, Clone, Default)]
pub struct BackupManager {
    config: BackupConfig,
}

impl BackupManager {
    /// Creates a backup manager with the given configuration.
    #[must_use]
    pub fn new(config: BackupConfig) -> Self {
        Self { config }
    }

    /// Creates a backup manager with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BackupConfig::default())
    }

    /// Copies every store file to `writer`.
    ///
    /// Log files are included only when `forensics` is set.
    ///
    /// # Errors
    ///
    /// Returns the first read or write error; files already written stay
    /// with the writer.
    pub fn full_copy(
        &self,
        files: &[StoreFile],
        writer: &mut dyn StoreWriter,
        forensics: bool,
    ) -> CoreResult<CopyManifest> {
        let chunk_size = self.config.chunk_size.max(1) as u64;
        let mut manifest = CopyManifest::default();

        for file in files {
            if file.kind == StoreFileKind::Log && !forensics {
                debug!(name = %file.name, "skipping log file");
                continue;
            }

            let size = file.buffer.size()?;
            let mut hasher = crc32fast::Hasher::new();
            let mut offset = 0;
            writer.write(&file.name, &[])?;
            while offset < size {
                let len = chunk_size.min(size - offset) as usize;
                let chunk = file.buffer.read_at(offset, len)?;
                hasher.update(&chunk);
                writer.write(&file.name, &chunk)?;
                offset += len as u64;
            }

            debug!(name = %file.name, size, "copied file");
            manifest.files.push(CopiedFile {
                name: file.name.clone(),
                size,
                crc32: hasher.finalize(),
                kind: file.kind,
            });
        }
        writer.done()?;

        info!(
            files = manifest.files.len(),
            bytes = manifest.total_bytes(),
            forensics,
            "full copy complete"
        );
        Ok(manifest)
    }

    /// Replays transactions committed after `since_tx` from `log` into
    /// `stores`.
    ///
    /// `stores` must already hold the state as of `since_tx`. Each command
    /// of the replayed suffix is applied exactly once.
    pub fn incremental(
        &self,
        log: &LogManager,
        stores: &mut StoreSet,
        since_tx: TransactionId,
    ) -> CoreResult<RecoveryStats> {
        let stats = recover(log, stores, since_tx)?;
        info!(%since_tx, applied = stats.transactions_applied, "incremental copy complete");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlog_storage::MemoryBuffer;
    use tempfile::tempdir;

    fn sources() -> Vec<StoreFile> {
        vec![
            StoreFile::store("nodes.db", Box::new(MemoryBuffer::with_data(vec![1; 100]))),
            StoreFile::store("empty.db", Box::new(MemoryBuffer::new())),
            StoreFile::log("graph.log", Box::new(MemoryBuffer::with_data(vec![9; 10]))),
        ]
    }

    #[test]
    fn full_copy_skips_logs_without_forensics() {
        let manager = BackupManager::new(BackupConfig { chunk_size: 7 });
        let mut target = MemoryStoreWriter::new();
        let manifest = manager.full_copy(&sources(), &mut target, false).unwrap();

        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.total_bytes(), 100);
        assert_eq!(target.get("nodes.db"), Some(&[1u8; 100][..]));
        assert_eq!(target.get("empty.db"), Some(&[][..]));
        assert!(target.get("graph.log").is_none());
        manifest.verify("nodes.db", &[1; 100]).unwrap();
    }

    #[test]
    fn forensics_includes_logs() {
        let mut target = MemoryStoreWriter::new();
        let manifest = BackupManager::with_defaults()
            .full_copy(&sources(), &mut target, true)
            .unwrap();
        assert_eq!(manifest.file("graph.log").unwrap().kind, StoreFileKind::Log);
        assert_eq!(target.files().len(), 3);
    }

    #[test]
    fn verify_detects_changed_contents() {
        let mut target = MemoryStoreWriter::new();
        let manifest = BackupManager::with_defaults()
            .full_copy(&sources(), &mut target, false)
            .unwrap();
        let err = manifest.verify("nodes.db", &[2; 100]).unwrap_err();
        assert!(matches!(err, CoreError::ChecksumMismatch { .. }));
        assert!(manifest.verify("missing.db", &[]).is_err());
    }

    #[test]
    fn recopy_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("nodes.db"), b"fresh").unwrap();
        std::fs::write(source.join("graph.log.1"), b"old log").unwrap();

        let target_dir = dir.path().join("backup");
        std::fs::create_dir_all(&target_dir).unwrap();
        std::fs::write(target_dir.join("nodes.db"), b"stale and longer").unwrap();

        let files = discover_store_files(&source).unwrap();
        assert_eq!(files[0].kind(), StoreFileKind::Log);
        let mut target = DirectoryStoreWriter::new(&target_dir);
        let manifest = BackupManager::with_defaults()
            .full_copy(&files, &mut target, false)
            .unwrap();

        let copied = std::fs::read(target_dir.join("nodes.db")).unwrap();
        assert_eq!(copied, b"fresh");
        manifest.verify("nodes.db", &copied).unwrap();
        assert!(!target_dir.join("graph.log.1").exists());
    }
}
