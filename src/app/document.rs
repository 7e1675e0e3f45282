//! Whole-document persistence shared by the queue and cache stores
//!
//! Both stores keep a flat JSON object of part identifier to integer. The
//! document is always read in full and written in full; writes go through a
//! sibling temporary file and a rename so a reader never sees a partial
//! document.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::constants::files;

/// Part identifier to integer mapping
pub type Document = BTreeMap<String, u64>;

/// Load a document, `None` if the file does not exist
///
/// Unparsable content is reported as [`io::ErrorKind::InvalidData`].
pub async fn load(path: &Path) -> io::Result<Option<Document>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    if content.trim().is_empty() {
        return Ok(Some(Document::new()));
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Atomically replace the document at `path`
pub async fn save_atomic(path: &Path, document: &Document) -> io::Result<()> {
    let temp_path = temp_path_for(path);
    let content = serde_json::to_vec_pretty(document)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let write_result = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;
        Ok::<(), io::Error>(())
    }
    .await;

    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        warn!("Failed to move {} into place: {}", temp_path.display(), e);
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    // The new document is already visible; a failed flush must not report the write as failed
    if let Err(e) = sync_parent_dir(path).await {
        warn!("Failed to flush directory of {}: {}", path.display(), e);
    }

    debug!("Wrote {} entries to {}", document.len(), path.display());
    Ok(())
}

/// Flush the directory entry of `path` so the rename survives power loss
///
/// Windows has no directory handle to flush; there this is a no-op.
pub async fn sync_parent_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::File::open(parent).await?.sync_all().await?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Sibling temporary path used while writing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = load(&temp_dir.path().join("absent.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_blank_file_is_empty_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blank.json");
        fs::write(&path, "  \n").await.unwrap();

        let loaded = load(&path).await.unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queue.json");

        let mut document = Document::new();
        document.insert("PN-1".to_string(), 3);
        document.insert("PN-2".to_string(), 40);
        save_atomic(&path, &document).await.unwrap();

        document.remove("PN-1");
        save_atomic(&path, &document).await.unwrap();

        let loaded = load(&path).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("PN-2"), Some(&40));
        assert!(!temp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn test_garbage_is_invalid_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queue.json");
        fs::write(&path, "{\"PN-1\": \"twelve\"}").await.unwrap();

        let err = load(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_parent_dir_sync() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queue.json");
        sync_parent_dir(&path).await.unwrap();

        // Bare file names resolve against the working directory
        sync_parent_dir(Path::new("queue.json")).await.unwrap();

        let unmounted = temp_dir.path().join("unmounted").join("queue.json");
        #[cfg(unix)]
        assert!(sync_parent_dir(&unmounted).await.is_err());
        #[cfg(not(unix))]
        let _ = unmounted;
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/shared/serials/jbk_queue.json");
        assert_eq!(
            temp_path_for(path),
            PathBuf::from("/shared/serials/jbk_queue.json.tmp")
        );
    }
}
