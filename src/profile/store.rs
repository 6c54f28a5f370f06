//! Read-only access to the profiles directory

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::errors::{Result, TranslationError};
use crate::profile::Profile;

/// Path of `<dir>/<name>.json`, rejecting names that could escape `dir`
pub fn profile_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(TranslationError::ProfileError {
            name: name.to_string(),
            message: "Profile names cannot contain path separators or parent directory references"
                .to_string(),
        });
    }

    Ok(dir.join(format!("{}.json", name)))
}

/// Whether a profile file exists
pub fn profile_exists(dir: &Path, name: &str) -> bool {
    profile_path(dir, name).map(|path| path.is_file()).unwrap_or(false)
}

/// Load and parse a profile by name
pub fn load_profile(dir: &Path, name: &str) -> Result<Profile> {
    let path = profile_path(dir, name)?;
    if !path.is_file() {
        return Err(TranslationError::ProfileError {
            name: name.to_string(),
            message: format!("Profile does not exist ({})", path.display()),
        });
    }

    let content = std::fs::read_to_string(&path).map_err(|e| TranslationError::FileError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let profile: Profile = serde_json::from_str(&content).map_err(|e| TranslationError::ProfileError {
        name: name.to_string(),
        message: format!("Invalid profile file: {}", e),
    })?;

    debug!("Loaded profile {} ({})", profile.name(), profile.provider());
    Ok(profile)
}

/// Names of all profiles in `dir`, sorted. A missing directory has none.
pub fn list_profiles(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            names.push(stem.to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}
