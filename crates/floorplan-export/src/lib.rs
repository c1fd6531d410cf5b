//! Export surface for the persisted layout files
//!
//! Only the two files the layout authority writes can be requested, either
//! by their `/download/<filename>` path or by copying them out with
//! [`export_to`]. This sits outside the reconciliation channel entirely.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use floorplan_core::{AREAS_FILE, BOXES_FILE};

/// Prefix of download paths
pub const DOWNLOAD_PREFIX: &str = "/download/";

/// Files that may be downloaded or exported
pub const EXPORTABLE: [&str; 2] = [AREAS_FILE, BOXES_FILE];

/// Map a `/download/<filename>` request onto a file in the storage directory
pub fn resolve_download(storage_dir: &Path, request_path: &str) -> Result<PathBuf> {
    let filename = request_path
        .strip_prefix(DOWNLOAD_PREFIX)
        .ok_or_else(|| anyhow!("Not a download path: {}", request_path))?;

    // Exact match only, so no separators or `..` can sneak through
    if !EXPORTABLE.contains(&filename) {
        bail!("File not available for download: {}", filename);
    }
    Ok(storage_dir.join(filename))
}

/// Serve a `/download/<filename>` request by copying the file into `out`
pub fn download_to<W: Write>(storage_dir: &Path, request_path: &str, out: &mut W) -> Result<u64> {
    let path = resolve_download(storage_dir, request_path)?;
    let mut file =
        fs::File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let copied = io::copy(&mut file, out)
        .with_context(|| format!("Failed to send {}", path.display()))?;
    tracing::debug!(file = %path.display(), bytes = copied, "downloaded");
    Ok(copied)
}

/// Copy both layout files into `out_dir`, returning the written paths
pub fn export_to(storage_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(EXPORTABLE.len());
    for name in EXPORTABLE {
        let source = storage_dir.join(name);
        if !source.exists() {
            bail!("Nothing to export: {} does not exist", source.display());
        }
        let target = out_dir.join(name);
        fs::copy(&source, &target).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), target.display())
        })?;
        tracing::info!(file = %target.display(), "exported");
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{Area, ClientMsg, LayoutDocument};

    #[test]
    fn resolves_known_files() {
        let dir = Path::new("/srv/floorplan");
        assert_eq!(
            resolve_download(dir, "/download/areas.json").unwrap(),
            dir.join("areas.json")
        );
        assert_eq!(
            resolve_download(dir, "/download/boxes.json").unwrap(),
            dir.join("boxes.json")
        );
    }

    #[test]
    fn refuses_everything_else() {
        let dir = Path::new("/srv/floorplan");
        assert!(resolve_download(dir, "/download/../etc/passwd").is_err());
        assert!(resolve_download(dir, "/download/notes.txt").is_err());
        assert!(resolve_download(dir, "/download/").is_err());
        assert!(resolve_download(dir, "/upload/areas.json").is_err());
        assert!(resolve_download(dir, "/download/sub/areas.json").is_err());
    }

    #[test]
    fn download_streams_the_persisted_file() {
        let storage = tempfile::tempdir().unwrap();
        let mut doc = LayoutDocument::new();
        doc.apply(&ClientMsg::CreateArea(Area::with_default_size("Kitchen")));
        doc.save_to(storage.path()).unwrap();

        let mut body = Vec::new();
        let copied = download_to(storage.path(), "/download/areas.json", &mut body).unwrap();
        assert_eq!(copied as usize, body.len());
        assert!(String::from_utf8(body).unwrap().contains("Kitchen"));

        let mut ignored = Vec::new();
        assert!(download_to(storage.path(), "/download/../areas.json", &mut ignored).is_err());
        assert!(ignored.is_empty());
    }

    #[test]
    fn exports_both_files() {
        let storage = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let mut doc = LayoutDocument::new();
        doc.apply(&ClientMsg::CreateArea(Area::with_default_size("Kitchen")));
        doc.save_to(storage.path()).unwrap();

        let written = export_to(storage.path(), &out.path().join("backup")).unwrap();
        assert_eq!(written.len(), 2);
        let areas = fs::read_to_string(&written[0]).unwrap();
        assert!(areas.contains("Kitchen"));
    }

    #[test]
    fn export_without_saved_layout_fails() {
        let storage = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        assert!(export_to(storage.path(), out.path()).is_err());
    }
}
