use std::fmt;

use super::error::StorageError;

/// A validated blob address: one storage slot per `(owner_id, name)` pair.
///
/// The name must be a flat filename. Path separators, traversal components,
/// control characters, and dot-prefixed names are rejected so a key can never
/// escape its owner's directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobKey {
    owner_id: i32,
    name: String,
}

impl BlobKey {
    /// Validate a file name and build the blob key for it.
    pub fn new(owner_id: i32, name: &str) -> Result<Self, StorageError> {
        let name = validate_name(name)?;
        Ok(Self {
            owner_id,
            name: name.to_string(),
        })
    }

    pub fn owner_id(&self) -> i32 {
        self.owner_id
    }

    /// The validated (trimmed) file name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.name)
    }
}

/// Validates a flat filename (no directory components allowed).
fn validate_name(name: &str) -> Result<&str, StorageError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(StorageError::InvalidKey("name cannot be empty".into()));
    }

    if trimmed.contains('\0') {
        return Err(StorageError::InvalidKey(
            "name must not contain null bytes".into(),
        ));
    }

    // Reject ASCII control characters to prevent HTTP header
    // injection (e.g. CRLF in Content-Disposition).
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(StorageError::InvalidKey(
            "name must not contain control characters".into(),
        ));
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(StorageError::InvalidKey(
            "name must not contain path separators".into(),
        ));
    }

    if trimmed == ".." {
        return Err(StorageError::InvalidKey("name must not be '..'".into()));
    }

    if trimmed.starts_with('.') {
        return Err(StorageError::InvalidKey(
            "name must not start with '.'".into(),
        ));
    }

    Ok(trimmed)
}
