//! JSON file helpers

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

use certvec_core::{Error, Result};

pub async fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))
}

/// Write compact JSON
pub async fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    fs::write(path, json).await?;
    Ok(())
}

/// Write JSON indented by two spaces
pub async fn write_json_pretty<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    Ok(())
}
