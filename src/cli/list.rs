//! `list`: show the releases this tool can install.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::releases::{Release, ReleaseCatalog, ReleaseSource};

#[derive(Args, Debug, Clone, Default)]
pub struct ListCommand {
    /// Include pre-release versions.
    #[arg(short = 'p', long)]
    pub include_pre_releases: bool,
}

impl ListCommand {
    pub async fn execute(self) -> Result<()> {
        let catalog = ReleaseCatalog::new()?;
        self.execute_with(&catalog).await
    }

    pub async fn execute_with<S: ReleaseSource>(self, source: &S) -> Result<()> {
        let releases = source.fetch(self.include_pre_releases).await?;

        println!("List of available releases:");
        println!();
        if releases.is_empty() {
            println!(
                "No releases are available at this moment. Run with --include-pre-releases to include pre-release versions"
            );
            return Ok(());
        }

        print!("{}", render_table(&releases));
        Ok(())
    }
}

/// Two-column table of version and publish date, in the given order.
pub fn render_table(releases: &[Release]) -> String {
    let rows: Vec<(String, String)> = releases
        .iter()
        .map(|release| {
            (
                release.tag().to_string(),
                release.published_at().format("%Y-%m-%d %H:%M UTC").to_string(),
            )
        })
        .collect();

    let width = rows
        .iter()
        .map(|(version, _)| version.len())
        .chain(std::iter::once("Version".len()))
        .max()
        .unwrap_or_default();

    let mut table = format!("{}  {}\n", format!("{:<width$}", "Version").bold(), "Publish date".bold());
    for (version, published) in rows {
        table.push_str(&format!("{version:<width$}  {published}\n"));
    }
    table
}
