//! The hosts file backing the [`OverrideTable`][super::OverrideTable].
//!
//! The file is the source of truth across restarts: the table is parsed from it at startup and
//! every admin update rewrites it before the new table is installed.
use crate::error::Error;
use crate::overrides::OverrideTable;
use std::io::ErrorKind;
use tokio::fs;

#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct HostsFile {
    path: String,
}

impl HostsFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Parse the hosts file into an [`OverrideTable`]. A missing file is created empty and
    /// yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file exists but can't be read, or is missing and can't be
    /// created.
    pub async fn load(&self) -> Result<OverrideTable, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(OverrideTable::parse(&text)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    "failed to read {}: {err}; starting with empty override table",
                    self.path
                );
                fs::write(&self.path, b"").await?;
                Ok(OverrideTable::default())
            }
            Err(err) => Err(Error::IO(err)),
        }
    }

    /// Overwrite the hosts file with `text` and return the table parsed from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be written.
    pub async fn save(&self, text: &str) -> Result<OverrideTable, Error> {
        fs::write(&self.path, text.as_bytes()).await?;
        Ok(OverrideTable::parse(text))
    }
}
