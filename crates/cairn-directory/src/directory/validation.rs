//! Path validation helper functions for the directory layer.

use super::DirectoryError;
use crate::constants::MAX_DIRECTORY_DEPTH;
use crate::constants::MAX_PATH_COMPONENT_LENGTH_BYTES;

/// Validate a directory path.
pub(super) fn validate_path(path: &[&str]) -> Result<(), DirectoryError> {
    // Path cannot be empty
    if path.is_empty() {
        return Err(DirectoryError::InvalidPath {
            component: String::new(),
            reason: "path cannot be empty".to_string(),
        });
    }

    validate_path_components(path)
}

/// Validate a directory path, allowing empty for root-level operations.
pub(super) fn validate_path_allow_empty(path: &[&str]) -> Result<(), DirectoryError> {
    if path.is_empty() {
        return Ok(());
    }
    validate_path_components(path)
}

/// Validate path components.
fn validate_path_components(path: &[&str]) -> Result<(), DirectoryError> {
    // Check depth
    if path.len() > MAX_DIRECTORY_DEPTH as usize {
        return Err(DirectoryError::PathTooDeep {
            depth: u32::try_from(path.len()).unwrap_or(u32::MAX),
            max: MAX_DIRECTORY_DEPTH,
        });
    }

    for component in path {
        if component.is_empty() {
            return Err(DirectoryError::InvalidPath {
                component: component.to_string(),
                reason: "path component cannot be empty".to_string(),
            });
        }

        if component.len() > MAX_PATH_COMPONENT_LENGTH_BYTES as usize {
            return Err(DirectoryError::InvalidPath {
                component: component.to_string(),
                reason: format!(
                    "component length {} exceeds maximum {}",
                    component.len(),
                    MAX_PATH_COMPONENT_LENGTH_BYTES
                ),
            });
        }
    }

    Ok(())
}

/// Owned copy of a borrowed path.
pub(super) fn to_owned_path(path: &[&str]) -> Vec<String> {
    path.iter().map(|c| (*c).to_string()).collect()
}
