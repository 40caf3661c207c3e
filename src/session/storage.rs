//! File-backed key/value store standing in for browser local storage

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::NotifyResult;

/// Key of the session token blob
pub const TOKEN_KEY: &str = "token";

/// Key of the profile JSON blob
pub const PROFILE_KEY: &str = "profile";

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Read a value; a missing key is `None`, other IO failures are errors
    pub fn get(&self, key: &str) -> NotifyResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> NotifyResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    /// Remove a key; removing a missing key is fine
    pub fn remove(&self, key: &str) -> NotifyResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
