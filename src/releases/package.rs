//! WAR package download and extraction.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::constants::USER_AGENT;
use crate::core::AggregateError;

/// File name the package is saved under inside the download directory.
const PACKAGE_FILE_NAME: &str = "aggregate.war";

/// A downloaded package living in its own temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct DownloadedPackage {
    dir: tempfile::TempDir,
    path: PathBuf,
    size: u64,
}

impl DownloadedPackage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Removes the temporary directory. Failures are logged and ignored.
    pub fn cleanup(self) {
        let dir = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!("Failed to remove temporary directory {}: {}", dir.display(), e);
        }
    }
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    let Some(total) = total.filter(|_| std::io::stdout().is_terminal()) else {
        return ProgressBar::hidden();
    };

    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        bar.set_style(style.progress_chars("━╸━"));
    }
    bar.set_prefix("  Downloading");
    bar
}

/// Downloads `url` into a fresh temporary directory.
///
/// No timeout is applied. Any transport failure or non-success status is an
/// [`AggregateError::NetworkError`].
pub async fn download_package(url: &str) -> Result<DownloadedPackage> {
    let network_error = |reason: String| AggregateError::NetworkError {
        operation: format!("Downloading {url}"),
        reason,
    };

    let dir = tempfile::Builder::new()
        .prefix("aggregate-cli")
        .tempdir()
        .context("Failed to create a temporary directory for the download")?;
    let path = dir.path().join(PACKAGE_FILE_NAME);

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| network_error(e.to_string()))?;

    tracing::info!("Downloading {} to {}", url, path.display());
    let mut response = client.get(url).send().await.map_err(|e| network_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(network_error(format!("HTTP {status}")).into());
    }

    let bar = progress_bar(response.content_length());
    let mut file = tokio::fs::File::create(&path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut size = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(|e| network_error(e.to_string()))? {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        size += chunk.len() as u64;
        bar.set_position(size);
    }
    file.flush().await.with_context(|| format!("Failed to flush {}", path.display()))?;
    bar.finish_and_clear();

    tracing::debug!("Downloaded {} bytes", size);
    Ok(DownloadedPackage {
        dir,
        path,
        size,
    })
}

/// Extracts the zip archive at `archive` into `target`, creating it if needed.
///
/// Returns the number of archive entries.
pub async fn extract_package(archive: &Path, target: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    let target = target.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<usize> {
        let file = std::fs::File::open(&archive)
            .with_context(|| format!("Failed to open {}", archive.display()))?;
        let mut zip = zip::ZipArchive::new(file)
            .with_context(|| format!("{} is not a valid WAR package", archive.display()))?;

        crate::utils::ensure_dir(&target)?;
        zip.extract(&target)
            .with_context(|| format!("Failed to extract into {}", target.display()))?;

        tracing::debug!("Extracted {} entries into {}", zip.len(), target.display());
        Ok(zip.len())
    })
    .await
    .context("Extraction task panicked")?
}
