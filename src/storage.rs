use crate::models::Database;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SESSIONS_FILE: &str = "sessions.json";

pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Resolves the data directory, creating it when missing.
    pub fn base_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
        let path = match data_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
                .join(".timetracker"),
        };
        if !path.exists() {
            fs::create_dir_all(&path)
                .with_context(|| format!("Could not create data directory {}", path.display()))?;
        }
        Ok(path)
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::from_path(dir.join(SESSIONS_FILE))
    }

    pub fn from_path(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        Self { path }
    }

    pub fn load(&self) -> Result<Database> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no session store yet");
            return Ok(Database::default());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        let db: Database = serde_json::from_str(&data)
            .with_context(|| format!("Could not parse {}", self.path.display()))?;
        debug!(path = %self.path.display(), sessions = db.sessions.len(), "loaded sessions");
        Ok(db)
    }

    /// Rewrites the whole store through a temporary file and a rename.
    pub fn save(&self, db: &Database) -> Result<()> {
        let data = serde_json::to_string_pretty(db)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)
            .with_context(|| format!("Could not write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Could not replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), sessions = db.sessions.len(), "saved sessions");
        Ok(())
    }
}
