//! Environment configuration helpers
//!
//! Settings come from an env file (`local.env` by default) whose keys are
//! lowercase, e.g. `openai_api_key`. Each key may also be given as an
//! uppercase process environment variable.

use std::env;
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

/// Default env file name
pub const DEFAULT_ENV_FILE: &str = "local.env";

/// Load an env file into the process environment. A missing file is not an
/// error: the variables may already be set.
pub fn load_env_file(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => debug!(path = %path.display(), "loaded env file"),
        Err(e) => debug!(path = %path.display(), error = %e, "env file not loaded"),
    }
}

/// Look up a key as written, then in uppercase
pub fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .or_else(|_| env::var(key.to_uppercase()))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// A required setting
pub fn env_required(key: &str) -> Result<String> {
    env_value(key).ok_or_else(|| {
        Error::Configuration(format!(
            "{} (or {}) environment variable not found",
            key,
            key.to_uppercase()
        ))
    })
}

/// An optional setting with a default
pub fn env_or_default(key: &str, default: &str) -> String {
    env_value(key).unwrap_or_else(|| default.to_string())
}

/// Strip a trailing `/` so paths can be appended with `format!`
pub fn trim_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}
