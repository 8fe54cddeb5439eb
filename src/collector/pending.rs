use crate::collector::session::EntryDraft;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Entries that could not be submitted, kept as JSON lines until the API
/// accepts them.
#[derive(Debug, Clone)]
pub struct PendingEntries {
    path: PathBuf,
}

impl PendingEntries {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, draft: &EntryDraft) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create pending directory: {}", parent.display())
            })?;
        }

        let line = serde_json::to_string(draft).context("Failed to serialize pending entry")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open pending file: {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("Failed to append pending entry: {}", self.path.display()))
    }

    /// Unparseable lines are logged and dropped.
    pub fn load(&self) -> Result<Vec<EntryDraft>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read pending file: {}", self.path.display()))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match serde_json::from_str::<EntryDraft>(line) {
                Ok(draft) => Some(draft),
                Err(error) => {
                    warn!(error = %error, line, "dropping malformed pending entry");
                    None
                }
            })
            .collect())
    }

    /// Rewrites the file with `drafts`, removing it when nothing is left.
    pub fn replace(&self, drafts: &[EntryDraft]) -> Result<()> {
        if drafts.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove pending file: {}", self.path.display())
                })?;
            }
            return Ok(());
        }

        let mut content = String::new();
        for draft in drafts {
            content.push_str(
                &serde_json::to_string(draft).context("Failed to serialize pending entry")?,
            );
            content.push('\n');
        }

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write pending file: {}", self.path.display()))
    }
}
