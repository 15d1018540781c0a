//! Catalog file handling: backup on load, atomic replace on save.

use super::{Catalog, CatalogError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_CATALOG_PATH: &str = "vocal-ranges.json";

/// `vocal-ranges.json` -> `vocal-ranges-bkp.json`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-bkp.{}", stem, ext.to_string_lossy()),
        None => format!("{}-bkp", stem),
    };
    path.with_file_name(name)
}

/// Loads the catalog, first copying the file verbatim to its backup path.
///
/// A missing file is an empty catalog; nothing is backed up in that case.
pub fn load_with_backup(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("{} not found, starting an empty catalog", path.display());
            return Ok(Catalog::new());
        }
        Err(source) => {
            return Err(CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let backup = backup_path(path);
    fs::write(&backup, &raw).map_err(|source| CatalogError::Io {
        path: backup.clone(),
        source,
    })?;
    tracing::info!("Backed up {} to {}", path.display(), backup.display());

    Catalog::from_json(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the catalog to a temporary file next to `path`, then renames it
/// over `path`.
///
/// An existing catalog keeps its permissions, and a symlinked catalog keeps
/// its link: the file it points to is the one replaced.
pub fn save(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    let json = catalog.to_json().map_err(CatalogError::Serialize)?;

    let io_err = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };

    let (target, existing) = match fs::canonicalize(path) {
        Ok(real) => {
            let meta = fs::metadata(&real).map_err(io_err)?;
            (real, Some(meta))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => (path.to_path_buf(), None),
        Err(source) => return Err(io_err(source)),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    if let Some(meta) = existing {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&target).map_err(|source| CatalogError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Saved {}", path.display());
    Ok(())
}
