// 📂 Table Sources - where the raw CSV text comes from
// The repository doesn't care whether a table lives on disk, in memory or
// behind a network call; it asks a TableSource for text and parses it.

use crate::config::TableFiles;
use crate::tables::TableKind;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

// ============================================================================
// TRAIT
// ============================================================================

/// TableSource - fetches the raw text of one reference table
///
/// Implementations may do I/O. A fetch error is the only failure the engine
/// propagates to callers.
pub trait TableSource: Send + Sync {
    /// Fetch the full CSV text of a table
    ///
    /// # Returns
    /// * `Ok(String)` - The table, header row included
    /// * `Err(anyhow::Error)` - Storage unreachable or table missing
    fn fetch(&self, kind: TableKind) -> impl Future<Output = Result<String>> + Send;

    /// Where the tables come from, for logs
    fn describe(&self) -> String;
}

// ============================================================================
// DIRECTORY SOURCE
// ============================================================================

/// Reads tables from CSV files inside one directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    files: TableFiles,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource {
            dir: dir.into(),
            files: TableFiles::default(),
        }
    }

    /// Builder: non-default file names
    pub fn with_files(mut self, files: TableFiles) -> Self {
        self.files = files;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: TableKind) -> PathBuf {
        self.dir.join(self.files.file_for(kind))
    }
}

impl TableSource for DirectorySource {
    async fn fetch(&self, kind: TableKind) -> Result<String> {
        let path = self.path_for(kind);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {} table from {}", kind.name(), path.display()))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

// ============================================================================
// MEMORY SOURCE
// ============================================================================

/// Tables held in memory (embedded data, tests)
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<TableKind, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Builder: add a table
    pub fn with_table(mut self, kind: TableKind, text: impl Into<String>) -> Self {
        self.tables.insert(kind, text.into());
        self
    }
}

impl TableSource for MemorySource {
    async fn fetch(&self, kind: TableKind) -> Result<String> {
        self.tables
            .get(&kind)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{} table is not available in memory", kind.name()))
    }

    fn describe(&self) -> String {
        format!("memory ({} tables)", self.tables.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_memory_source_fetch() {
        let source = MemorySource::new().with_table(TableKind::CardActivities, "Card,Activation\n");

        let text = source.fetch(TableKind::CardActivities).await.unwrap();
        assert_eq!(text, "Card,Activation\n");
        assert!(source.fetch(TableKind::CardProfiles).await.is_err());
    }

    #[tokio::test]
    async fn test_directory_source_reads_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("acts.csv")).unwrap();
        writeln!(file, "Card,Activation").unwrap();
        writeln!(file, "K♠,Lead.").unwrap();

        let files = TableFiles {
            card_activities: "acts.csv".to_string(),
            ..TableFiles::default()
        };
        let source = DirectorySource::new(dir.path()).with_files(files);

        let text = source.fetch(TableKind::CardActivities).await.unwrap();
        assert!(text.contains("K♠,Lead."));
    }

    #[tokio::test]
    async fn test_directory_source_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());

        let err = source.fetch(TableKind::BirthdateCards).await.unwrap_err();
        assert!(err.to_string().contains("BirthdateToCard"));
    }
}
