//! JSONL storage for items
//!
//! Items live in `.taskbridge/items.jsonl`, one JSON object per line, in
//! creation order. Every access goes through a sibling `items.lock` file:
//! readers take a shared lock, [`ItemStore::update`] holds an exclusive lock
//! across the whole read-modify-write and replaces the data file atomically.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::Item;

/// Store for item data in JSONL format
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a workspace
    pub fn for_workspace(workspace_root: &Path) -> Self {
        Self::new(workspace_root.join(".taskbridge").join("items.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.tmp")
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let lock_path = self.lock_path();
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))
    }

    /// Reads all items in creation order
    pub fn read_all(&self) -> Result<Vec<Item>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lock = self.open_lock()?;
        lock.lock_shared()
            .context("Failed to acquire read lock on item store")?;

        // Lock is released when `lock` is dropped
        self.load()
    }

    /// Runs `apply` on the current items under an exclusive lock
    ///
    /// The items are written back only when `apply` returns `Ok`; a domain
    /// rejection leaves the file untouched. The outer `Result` carries I/O
    /// failures, the inner one whatever `apply` returned.
    pub fn update<T, E>(
        &self,
        apply: impl FnOnce(&mut Vec<Item>) -> std::result::Result<T, E>,
    ) -> Result<std::result::Result<T, E>> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .context("Failed to acquire write lock on item store")?;

        let mut items = self.load()?;
        let outcome = apply(&mut items);
        if outcome.is_ok() {
            self.replace(&items)?;
        }
        Ok(outcome)
    }

    fn load(&self) -> Result<Vec<Item>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to open item store: {}", self.path.display()))
            }
        };

        let mut items = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let item: Item = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse item at line {}", line_num + 1))?;
            items.push(item);
        }
        Ok(items)
    }

    /// Rewrites the data file through a temp file and rename
    fn replace(&self, items: &[Item]) -> Result<()> {
        let temp_path = self.temp_path();

        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
            let mut writer = BufWriter::new(file);

            for item in items {
                let line = serde_json::to_string(item).context("Failed to serialize item")?;
                writeln!(writer, "{}", line).context("Failed to write item")?;
            }
            writer.flush().context("Failed to flush item store")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })
    }
}
