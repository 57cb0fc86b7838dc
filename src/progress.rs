use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only log of listing identifiers already emitted in any run.
///
/// One identifier per line, plain text. Membership checks belong to the
/// caller; the store never deduplicates.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every identifier recorded so far; empty set when no log exists.
    pub fn load(&self) -> io::Result<HashSet<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(err) => return Err(err),
        };
        let mut ids = HashSet::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                ids.insert(trimmed.to_string());
            }
        }
        Ok(ids)
    }

    /// Appends one identifier and syncs it to disk before returning, so the
    /// entry survives a crash before the next listing is touched.
    pub fn record(&self, id: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{id}")?;
        file.sync_data()
    }
}
