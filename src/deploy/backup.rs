//! Pre-update backups.
//!
//! Before an update replaces the deployed webapp, [`BackupManager`] archives
//! the whole `ROOT` directory into `<home>/backup/aggregate-<timestamp>.zip`
//! and copies the current configuration files into a sibling directory with
//! the same stem. The timestamp has one-second resolution: two backups taken
//! within the same second overwrite each other.

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::config::EnvironmentConfiguration;
use crate::constants::BACKUP_TIMESTAMP_FORMAT;
use crate::utils::ensure_dir;

/// What a backup produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// The zip archive of the deployed directory.
    pub archive: PathBuf,
    /// Number of files and directories stored in the archive.
    pub entries: usize,
    /// Copies of the configuration files.
    pub config_copies: Vec<PathBuf>,
}

pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn for_configuration(config: &EnvironmentConfiguration) -> Self {
        Self::new(config.backup_path())
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn stem(at: NaiveDateTime) -> String {
        format!("aggregate-{}", at.format(BACKUP_TIMESTAMP_FORMAT))
    }

    pub fn archive_path(&self, at: NaiveDateTime) -> PathBuf {
        self.backup_dir.join(format!("{}.zip", Self::stem(at)))
    }

    /// Archives `source_dir` and copies `config_files` into the backup directory.
    ///
    /// # Errors
    ///
    /// Fails when `source_dir` or any of `config_files` doesn't exist, or on
    /// any I/O error. A failed backup leaves the deployment untouched.
    pub async fn backup(
        &self,
        source_dir: &Path,
        config_files: &[PathBuf],
        at: NaiveDateTime,
    ) -> Result<BackupRecord> {
        if !source_dir.is_dir() {
            bail!("Nothing to back up: {} is not a directory", source_dir.display());
        }

        ensure_dir(&self.backup_dir)?;

        let archive = self.archive_path(at);
        info!("Archiving {} into {}", source_dir.display(), archive.display());
        let entries = {
            let source_dir = source_dir.to_path_buf();
            let archive = archive.clone();
            tokio::task::spawn_blocking(move || write_archive(&source_dir, &archive))
                .await
                .context("Backup task panicked")??
        };

        let config_dir = self.backup_dir.join(Self::stem(at));
        ensure_dir(&config_dir)?;
        let mut config_copies = Vec::with_capacity(config_files.len());
        for file in config_files {
            let file_name = file
                .file_name()
                .with_context(|| format!("Invalid configuration file path: {}", file.display()))?;
            let destination = config_dir.join(file_name);
            tokio::fs::copy(file, &destination).await.with_context(|| {
                format!("Failed to copy {} to {}", file.display(), destination.display())
            })?;
            debug!("Copied {} to {}", file.display(), destination.display());
            config_copies.push(destination);
        }

        Ok(BackupRecord {
            archive,
            entries,
            config_copies,
        })
    }
}

/// Zips `source_dir` into `archive`, storing entries under the directory's
/// own name (`ROOT/...`).
fn write_archive(source_dir: &Path, archive: &Path) -> Result<usize> {
    let base = source_dir.parent().unwrap_or(source_dir);
    let file =
        File::create(archive).with_context(|| format!("Failed to create {}", archive.display()))?;
    let mut writer = zip::ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0;
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", source_dir.display()))?;
        let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .with_context(|| format!("Failed to add {name} to the backup"))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name.as_str(), options)
                .with_context(|| format!("Failed to add {name} to the backup"))?;
            let mut source = File::open(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            io::copy(&mut source, &mut writer)
                .with_context(|| format!("Failed to write {name} to the backup"))?;
        } else {
            debug!("Skipping {} (not a regular file)", entry.path().display());
            continue;
        }
        entries += 1;
    }

    writer.finish().context("Failed to finalize the backup archive")?;
    Ok(entries)
}
