//! Unified path management for OpenConverse configuration files.
//!
//! Settings live under the platform config directory so the desktop shell
//! and headless tools resolve the same file.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for OpenConverse.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/openconv/          # Config directory (XDG on Linux/macOS)
/// └── settings.json            # Provider and memory settings
/// ```
pub struct ConvPaths;

impl ConvPaths {
    /// Returns the OpenConverse configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/openconv/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("openconv"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the settings file.
    ///
    /// The file holds the configured provider, including its credential,
    /// so it is written with 600 permissions on Unix.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to settings.json
    /// - `Err(PathError)`: Could not determine path
    pub fn settings_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("settings.json"))
    }
}
