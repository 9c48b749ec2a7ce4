//! Backup command implementation.
//!
//! Copies the files of a store directory with a full copy and writes a JSON
//! manifest of sizes and CRC32 checksums next to them.

use crate::error::CliResult;
use graphlog_core::backup::{
    discover_store_files, BackupManager, CopyManifest, DirectoryStoreWriter, StoreFileKind,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// File name of the manifest written into the backup directory.
pub const MANIFEST_FILE_NAME: &str = "backup-manifest.json";

/// Manifest entry for one copied file.
#[derive(Debug, Serialize)]
pub struct ManifestFile {
    /// Name relative to the store directory.
    pub name: String,
    /// Bytes copied.
    pub size: u64,
    /// CRC32 of the copied bytes, hex-encoded.
    pub crc32: String,
    /// `store` or `log`.
    pub kind: &'static str,
}

/// The manifest written next to the copied files.
#[derive(Debug, Serialize)]
pub struct ManifestDocument {
    /// Version of the tool that wrote the backup.
    pub version: &'static str,
    /// Whether logs were included.
    pub forensics: bool,
    /// Total bytes copied.
    pub total_bytes: u64,
    /// Copied files.
    pub files: Vec<ManifestFile>,
}

impl ManifestDocument {
    fn new(manifest: &CopyManifest, forensics: bool) -> Self {
        Self {
            version: graphlog_core::VERSION,
            forensics,
            total_bytes: manifest.total_bytes(),
            files: manifest
                .files
                .iter()
                .map(|file| ManifestFile {
                    name: file.name.clone(),
                    size: file.size,
                    crc32: format!("{:08x}", file.crc32),
                    kind: match file.kind {
                        StoreFileKind::Store => "store",
                        StoreFileKind::Log => "log",
                    },
                })
                .collect(),
        }
    }
}

/// Runs the backup command.
pub fn run(source: &Path, destination: &Path, forensics: bool) -> CliResult<()> {
    info!("Backing up {:?} to {:?}", source, destination);

    let document = copy_directory(source, destination, forensics)?;

    println!("✓ Backup created successfully");
    println!("  Path: {}", destination.display());
    println!("  Files: {}", document.files.len());
    println!("  Size: {} bytes", document.total_bytes);
    if !forensics {
        println!("  Logs: skipped (use --forensics to include them)");
    }
    Ok(())
}

/// Copies `source` into `destination` and writes the manifest.
pub fn copy_directory(
    source: &Path,
    destination: &Path,
    forensics: bool,
) -> CliResult<ManifestDocument> {
    let files = discover_store_files(source)?;
    let mut target = DirectoryStoreWriter::new(destination);
    let manifest = BackupManager::with_defaults().full_copy(&files, &mut target, forensics)?;

    let document = ManifestDocument::new(&manifest, forensics);
    fs::create_dir_all(destination)?;
    fs::write(
        destination.join(MANIFEST_FILE_NAME),
        serde_json::to_vec_pretty(&document)?,
    )?;
    Ok(document)
}
