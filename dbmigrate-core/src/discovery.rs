//! Migration file discovery
//!
//! Migrations live in a single directory as `{version}_{name}.up.sql` with an
//! optional `{version}_{name}.down.sql`. The catalog is rebuilt from disk on
//! every call so edits and new files are always visible.

use crate::error::{MigrateError, Result};
use crate::types::{compare_versions, MigrationFile, DOWN_SUFFIX, UP_SUFFIX};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Hex characters kept from the SHA-256 digest
pub const CHECKSUM_LEN: usize = 16;

/// Content checksum of an up-script
pub fn compute_checksum(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = hex::encode(digest);
    hex.truncate(CHECKSUM_LEN);
    hex
}

/// Split `{version}_{name}` at the first underscore.
pub fn parse_full_version(full_version: &str) -> (&str, &str) {
    match full_version.split_once('_') {
        Some((version, name)) => (version, name),
        None => (full_version, ""),
    }
}

/// Scan `dir` for up-scripts, sorted by version.
///
/// A missing directory is an empty catalog. Two scripts with the same version
/// are rejected with [`MigrateError::DuplicateVersion`].
pub fn scan(dir: &Path) -> Result<Vec<MigrationFile>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "migrations directory does not exist");
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/*{UP_SUFFIX}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut catalog = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    for entry in glob::glob(&pattern).map_err(|e| {
        MigrateError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            e.to_string(),
        ))
    })? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "skipping unreadable migration entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping migration with non UTF-8 file name");
            continue;
        };
        let filename = filename.to_string();
        let full_version = filename
            .strip_suffix(UP_SUFFIX)
            .unwrap_or(&filename)
            .to_string();
        let (version, name) = parse_full_version(&full_version);

        if let Some(first) = seen.insert(version.to_string(), filename.clone()) {
            return Err(MigrateError::DuplicateVersion {
                version: version.to_string(),
                first,
                second: filename,
            });
        }

        let content = std::fs::read(&path)?;
        let has_down = path
            .with_file_name(format!("{full_version}{DOWN_SUFFIX}"))
            .is_file();
        catalog.push(MigrationFile {
            version: version.to_string(),
            name: name.to_string(),
            checksum: compute_checksum(&content),
            full_version: full_version.clone(),
            filename,
            path,
            has_down,
        });
    }

    catalog.sort_by(|a, b| compare_versions(&a.version, &b.version));
    debug!(dir = %dir.display(), count = catalog.len(), "scanned migrations");
    Ok(catalog)
}

/// Next version for a new migration: highest integer version plus one, three digits wide.
///
/// Versions are compared as `u128`, the same width [`compare_versions`] orders them by.
pub fn next_version(catalog: &[MigrationFile]) -> Result<String> {
    let Some(last) = catalog
        .iter()
        .filter_map(|m| m.version.parse::<u128>().ok())
        .max()
    else {
        return Ok("001".to_string());
    };
    last.checked_add(1)
        .map(|next| format!("{next:03}"))
        .ok_or_else(|| MigrateError::VersionExhausted(last.to_string()))
}

/// Lowercase the name and turn spaces and hyphens into underscores.
///
/// Names that would escape the migrations directory or end up empty are rejected.
pub fn sanitize_name(name: &str) -> Result<String> {
    let safe = name.to_lowercase().replace([' ', '-'], "_");
    if safe.is_empty() || safe.contains(['/', '\\']) || safe == "." || safe == ".." {
        return Err(MigrateError::InvalidName(name.to_string()));
    }
    Ok(safe)
}
